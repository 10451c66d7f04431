use thiserror::Error;

/// Failure talking to the hosted data service.
///
/// `Display` is the service's own message where it sent one, so it can be
/// shown to users as-is.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("Unexpected response from the data service: {0}")]
    Decode(String),
    #[error("Invalid session token: {0}")]
    InvalidToken(String),
    #[error("Not signed in")]
    NoSession,
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}
