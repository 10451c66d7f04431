use clap::{Parser, Subcommand, ValueEnum};
use comments::domain::session::identity::OAuthProvider;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Provider {
    Github,
    Google,
}

impl From<Provider> for OAuthProvider {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Github => OAuthProvider::Github,
            Provider::Google => OAuthProvider::Google,
        }
    }
}

#[derive(Parser)]
#[command(name = "comments", version, about = "Blog comment threads on a hosted data service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the comment thread of a post.
    List {
        /// Post slug.
        slug: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Add a comment, or a reply with --parent.
    Add {
        slug: String,
        #[arg(long)]
        content: String,
        /// Comment being replied to.
        #[arg(long)]
        parent: Option<Uuid>,
    },
    /// Replace the content of one of your comments.
    Edit {
        slug: String,
        id: Uuid,
        #[arg(long)]
        content: String,
    },
    /// Delete one of your comments.
    Delete { slug: String, id: Uuid },
    /// Like a comment, or take the like back.
    React { slug: String, id: Uuid },
    /// Print the URL that starts an OAuth sign-in.
    SignIn {
        #[arg(long, value_enum, default_value = "github")]
        provider: Provider,
        /// Where the provider sends the browser afterwards.
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// End the current session.
    SignOut,
    /// Show the signed-in user.
    Whoami,
}
