use super::reaction::ReactionCounts;
use crate::domain::user::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A row of the `comments` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub post_slug: String,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub is_approved: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. Identity, timestamps and `is_deleted` are filled in by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub post_slug: String,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub is_approved: bool,
}

/// A comment together with its author and reaction totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EnrichedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserProfile>,
    pub reactions: ReactionCounts,
}

impl EnrichedComment {
    pub fn id(&self) -> Uuid {
        self.comment.id
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.comment.author_id == user_id
    }
}
