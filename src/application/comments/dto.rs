use crate::domain::comments::{comment::EnrichedComment, value_objects::DEFAULT_MAX_COMMENT_LENGTH};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

impl AddCommentRequest {
    pub fn top_level(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            parent_comment_id: None,
        }
    }

    pub fn reply(content: impl Into<String>, parent_comment_id: Uuid) -> Self {
        Self {
            content: content.into(),
            parent_comment_id: Some(parent_comment_id),
        }
    }
}

/// What the comment widget renders: the latest fetched list plus status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentsState {
    pub comments: Vec<EnrichedComment>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSettings {
    pub auto_approve: bool,
    pub max_length: usize,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            auto_approve: true,
            max_length: DEFAULT_MAX_COMMENT_LENGTH,
        }
    }
}
