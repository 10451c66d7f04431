mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use comments::{
    application::{
        comments::{
            dto::{AddCommentRequest, CommentSettings},
            use_case::CommentsUseCase,
        },
        session::store::SessionStore,
    },
    config::Config,
    domain::comments::value_objects::PostSlug,
    infrastructure::{
        remote::postgrest_client::PostgrestClient,
        repositories::remote_comment_repository::RemoteCommentRepository,
    },
    presentation::text::render_tree,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays clean for the rendered thread.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,comments=debug"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let client = Arc::new(PostgrestClient::new(&config)?);
    if let Some(access_token) = config.access_token.clone() {
        client
            .set_session(access_token, config.refresh_token.clone())
            .await
            .context("SUPABASE_ACCESS_TOKEN was rejected")?;
    }

    let sessions = SessionStore::new(client.clone());
    let _subscription = sessions.start().await;
    if let Some(error) = sessions.current().error {
        tracing::warn!("Continuing without a session: {}", error);
    }

    let settings = CommentSettings {
        auto_approve: config.comments_auto_approve,
        max_length: config.comment_max_length,
    };
    let open_thread = |slug: String| -> anyhow::Result<CommentsUseCase> {
        Ok(CommentsUseCase::new(
            PostSlug::new(slug)?,
            Box::new(RemoteCommentRepository::new(client.clone(), client.clone())),
            sessions.watch(),
            settings,
        ))
    };

    match cli.command {
        Commands::List { slug, format } => {
            let thread = open_thread(slug)?;
            thread.fetch_comments().await?;
            print_thread(&thread, &sessions, format)?;
        }
        Commands::Add {
            slug,
            content,
            parent,
        } => {
            let thread = open_thread(slug)?;
            let request = match parent {
                Some(parent) => AddCommentRequest::reply(content, parent),
                None => AddCommentRequest::top_level(content),
            };
            run_mutation(&thread, thread.add_comment(request)).await?;
            print_thread(&thread, &sessions, OutputFormat::Text)?;
        }
        Commands::Edit { slug, id, content } => {
            let thread = open_thread(slug)?;
            thread.fetch_comments().await?;
            run_mutation(&thread, thread.update_comment(id, &content)).await?;
            print_thread(&thread, &sessions, OutputFormat::Text)?;
        }
        Commands::Delete { slug, id } => {
            let thread = open_thread(slug)?;
            thread.fetch_comments().await?;
            run_mutation(&thread, thread.delete_comment(id)).await?;
            print_thread(&thread, &sessions, OutputFormat::Text)?;
        }
        Commands::React { slug, id } => {
            let thread = open_thread(slug)?;
            run_mutation(&thread, thread.toggle_reaction(id)).await?;
            let liked = thread.has_reacted(id).await?;
            println!("{}", if liked { "Liked" } else { "Like removed" });
        }
        Commands::SignIn {
            provider,
            redirect_to,
        } => match sessions.sign_in(provider.into(), redirect_to.as_deref()).await {
            Some(url) => println!("{}", url),
            None => bail!(sessions.current().error.unwrap_or_default()),
        },
        Commands::SignOut => {
            if !sessions.sign_out().await {
                bail!(sessions.current().error.unwrap_or_default());
            }
            println!("Signed out");
        }
        Commands::Whoami => match sessions.identity() {
            Some(user) => println!("{} <{}>", user.display_name(), user.id),
            None => println!("Not signed in"),
        },
    }

    Ok(())
}

async fn run_mutation(
    thread: &CommentsUseCase,
    mutation: impl std::future::Future<Output = bool>,
) -> anyhow::Result<()> {
    if !mutation.await {
        bail!(thread.snapshot().error.unwrap_or_default());
    }
    Ok(())
}

fn print_thread(
    thread: &CommentsUseCase,
    sessions: &SessionStore,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let tree = thread.tree();
    match format {
        OutputFormat::Text => {
            let viewer = sessions.identity().map(|user| user.id);
            print!("{}", render_tree(&tree, viewer));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
    }
    Ok(())
}
