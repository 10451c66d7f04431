use super::errors::CommentError;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref POST_SLUG_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").unwrap();
}

/// Identifier of the content item a comment thread hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct PostSlug {
    #[validate(length(min = 1, max = 200), regex(path = *POST_SLUG_REGEX))]
    pub value: String,
}

impl PostSlug {
    pub fn new(value: impl Into<String>) -> Result<Self, validator::ValidationErrors> {
        let slug = Self {
            value: value.into(),
        };
        slug.validate()?;
        Ok(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for PostSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

pub const DEFAULT_MAX_COMMENT_LENGTH: usize = 5000;

/// Comment body that is known to contain something besides whitespace.
///
/// The text is kept exactly as submitted; trimming is only used for the
/// emptiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent(String);

impl CommentContent {
    pub fn new(value: impl Into<String>, max_length: usize) -> Result<Self, CommentError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CommentError::Validation("Comment cannot be empty".to_string()));
        }
        if value.chars().count() > max_length {
            return Err(CommentError::Validation(format!(
                "Comment cannot exceed {} characters",
                max_length
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
