use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by comment operations.
///
/// `Display` is the human-readable message shown next to the control that
/// triggered the operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommentError {
    #[error("You must be logged in to {action}")]
    AuthRequired { action: &'static str },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Fetch(String),
    #[error("{0}")]
    Mutation(String),
    #[error("Comment {0} was not found")]
    NotFound(Uuid),
    #[error("You can only change your own comments")]
    NotAuthor,
}

impl CommentError {
    /// The message to show, or `fallback` when the underlying error carried none.
    pub fn message_or(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}
