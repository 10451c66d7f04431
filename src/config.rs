//! Client configuration loading from environment variables.
//!
//! All configuration is read once at startup. The service URL and public key
//! are mandatory; without them nothing can talk to the hosted data service, so
//! their absence is a fatal error rather than something to recover from.
//!
//! # Environment Variables
//!
//! ## Required Variables
//! - `SUPABASE_URL` (or `VITE_SUPABASE_URL`): base URL of the hosted data service
//! - `SUPABASE_ANON_KEY` (or `VITE_SUPABASE_ANON_KEY`): public API key
//!
//! ## Optional Variables
//! - `RUST_LOG`: Logging level (default: "info,comments=debug")
//! - `SUPABASE_SERVICE_ROLE_KEY`: key used for admin author lookups
//! - `SUPABASE_ACCESS_TOKEN`: access token of an already signed-in user
//! - `SUPABASE_REFRESH_TOKEN`: refresh token paired with the access token
//! - `COMMENTS_AUTO_APPROVE`: insert new comments as approved (default: true)
//! - `COMMENT_MAX_LENGTH`: maximum comment length in characters (default: 5000)
//! - `REMOTE_TIMEOUT_SECONDS`: per-request timeout (default: none)

use crate::domain::comments::value_objects::DEFAULT_MAX_COMMENT_LENGTH;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the hosted service (e.g., `https://xyz.supabase.co`)
    pub supabase_url: String,

    /// Public (anon) API key sent with every request
    pub supabase_anon_key: String,

    /// Service role key. Author lookups are skipped without it.
    pub supabase_service_role_key: Option<String>,

    pub access_token: Option<String>,

    pub refresh_token: Option<String>,

    /// Moderation is off unless this is set to false
    pub comments_auto_approve: bool,

    pub comment_max_length: usize,

    /// No timeout when unset; a stalled backend stalls the operation
    pub remote_timeout_seconds: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the service URL or public key is missing or empty,
    /// or if an optional variable is set but cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            supabase_url: env_required_any(&["SUPABASE_URL", "VITE_SUPABASE_URL"])?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: env_required_any(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"])?,
            supabase_service_role_key: env_optional("SUPABASE_SERVICE_ROLE_KEY"),
            access_token: env_optional("SUPABASE_ACCESS_TOKEN"),
            refresh_token: env_optional("SUPABASE_REFRESH_TOKEN"),
            comments_auto_approve: env_or("COMMENTS_AUTO_APPROVE", true)?,
            comment_max_length: env_or("COMMENT_MAX_LENGTH", DEFAULT_MAX_COMMENT_LENGTH)?,
            remote_timeout_seconds: env_optional("REMOTE_TIMEOUT_SECONDS")
                .map(|raw| {
                    raw.parse::<u64>().map_err(|e| {
                        anyhow::anyhow!("Failed to parse REMOTE_TIMEOUT_SECONDS: {}", e)
                    })
                })
                .transpose()?,
        })
    }
}

/// Load the first non-empty variable among `keys`.
///
/// # Errors
///
/// Returns an error naming every accepted key if none is set.
fn env_required_any(keys: &[&str]) -> anyhow::Result<String> {
    keys.iter()
        .find_map(|key| env_optional(key))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Missing required environment variable: {}",
                keys.join(" or ")
            )
        })
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Load an environment variable with a default value.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        None => Ok(default),
    }
}
