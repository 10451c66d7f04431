use super::{
    comment::{EnrichedComment, NewComment},
    errors::CommentError,
    reaction::ReactionType,
    value_objects::PostSlug,
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Approved, non-deleted comments of one post, newest first, enriched with
    /// author and like count.
    async fn list_visible(
        &self,
        post_slug: &PostSlug,
    ) -> Result<Vec<EnrichedComment>, CommentError>;

    async fn insert(&self, comment: NewComment) -> Result<(), CommentError>;

    /// Replace the content of a comment owned by `author_id`.
    ///
    /// Returns `NotFound` or `NotAuthor` when no row was changed.
    async fn update_content(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<(), CommentError>;

    async fn soft_delete(&self, comment_id: Uuid, author_id: Uuid) -> Result<(), CommentError>;

    /// Flip the user's reaction. Returns `true` when the reaction now exists.
    async fn toggle_reaction(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        reaction: ReactionType,
    ) -> Result<bool, CommentError>;

    async fn has_reacted(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        reaction: ReactionType,
    ) -> Result<bool, CommentError>;
}
