use super::dto::{AddCommentRequest, CommentSettings, CommentsState};
use crate::application::session::store::SessionState;
use crate::domain::{
    comments::{
        comment::{EnrichedComment, NewComment},
        errors::CommentError,
        reaction::ReactionType,
        repository::CommentRepository,
        tree::{CommentNode, build_comment_tree},
        value_objects::{CommentContent, PostSlug},
    },
    user::UserProfile,
};
use tokio::sync::watch;
use tracing::{error, warn};
use uuid::Uuid;

/// Comment thread of one post.
///
/// Every successful mutation is followed by a full re-fetch; the list held in
/// [`CommentsState`] is replaced, never patched. Failures are reduced to one
/// message in `CommentsState::error` plus a `false` return.
pub struct CommentsUseCase {
    post_slug: PostSlug,
    repository: Box<dyn CommentRepository>,
    session: watch::Receiver<SessionState>,
    settings: CommentSettings,
    state: watch::Sender<CommentsState>,
}

impl CommentsUseCase {
    pub fn new(
        post_slug: PostSlug,
        repository: Box<dyn CommentRepository>,
        session: watch::Receiver<SessionState>,
        settings: CommentSettings,
    ) -> Self {
        let (state, _) = watch::channel(CommentsState {
            loading: true,
            ..CommentsState::default()
        });
        Self {
            post_slug,
            repository,
            session,
            settings,
            state,
        }
    }

    pub fn post_slug(&self) -> &PostSlug {
        &self.post_slug
    }

    pub fn watch(&self) -> watch::Receiver<CommentsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CommentsState {
        self.state.borrow().clone()
    }

    /// Nested view of the current list.
    pub fn tree(&self) -> Vec<CommentNode> {
        build_comment_tree(self.state.borrow().comments.clone())
    }

    pub async fn fetch_comments(&self) -> Result<Vec<EnrichedComment>, CommentError> {
        self.state.send_modify(|state| {
            state.error = None;
            state.loading = true;
        });

        let result = self.repository.list_visible(&self.post_slug).await;
        match &result {
            Ok(comments) => {
                let comments = comments.clone();
                self.state.send_modify(|state| {
                    state.comments = comments;
                    state.loading = false;
                });
            }
            Err(e) => {
                error!(post_slug = %self.post_slug, "Failed to fetch comments: {}", e);
                let message = e.message_or("Failed to fetch comments");
                self.state.send_modify(|state| {
                    state.error = Some(message);
                    state.loading = false;
                });
            }
        }
        result
    }

    pub async fn add_comment(&self, request: AddCommentRequest) -> bool {
        self.clear_error();
        let outcome = self.try_add_comment(request).await;
        self.finish(outcome, "Failed to add comment").await
    }

    pub async fn update_comment(&self, comment_id: Uuid, content: &str) -> bool {
        self.clear_error();
        let outcome = self.try_update_comment(comment_id, content).await;
        self.finish(outcome, "Failed to update comment").await
    }

    /// Soft delete: the row stays, flagged `is_deleted`.
    pub async fn delete_comment(&self, comment_id: Uuid) -> bool {
        self.clear_error();
        let outcome = self.try_delete_comment(comment_id).await;
        self.finish(outcome, "Failed to delete comment").await
    }

    pub async fn toggle_reaction(&self, comment_id: Uuid) -> bool {
        self.clear_error();
        let outcome = self.try_toggle_reaction(comment_id).await;
        self.finish(outcome, "Failed to toggle reaction").await
    }

    /// Whether the signed-in user has liked `comment_id`. Always false when
    /// signed out.
    pub async fn has_reacted(&self, comment_id: Uuid) -> Result<bool, CommentError> {
        match self.identity() {
            Some(user) => {
                self.repository
                    .has_reacted(comment_id, user.id, ReactionType::Like)
                    .await
            }
            None => Ok(false),
        }
    }

    async fn try_add_comment(&self, request: AddCommentRequest) -> Result<(), CommentError> {
        let user = self.require_identity("comment")?;
        let content = CommentContent::new(request.content, self.settings.max_length)?;
        self.repository
            .insert(NewComment {
                post_slug: self.post_slug.as_str().to_string(),
                author_id: user.id,
                parent_comment_id: request.parent_comment_id,
                content: content.into_inner(),
                is_approved: self.settings.auto_approve,
            })
            .await
    }

    async fn try_update_comment(&self, comment_id: Uuid, content: &str) -> Result<(), CommentError> {
        let user = self.require_identity("edit comments")?;
        let content = CommentContent::new(content, self.settings.max_length)?;
        self.ensure_not_foreign(comment_id, user.id)?;
        self.repository
            .update_content(comment_id, user.id, content.as_str())
            .await
    }

    async fn try_delete_comment(&self, comment_id: Uuid) -> Result<(), CommentError> {
        let user = self.require_identity("delete comments")?;
        self.ensure_not_foreign(comment_id, user.id)?;
        self.repository.soft_delete(comment_id, user.id).await
    }

    async fn try_toggle_reaction(&self, comment_id: Uuid) -> Result<(), CommentError> {
        let user = self.require_identity("react")?;
        self.repository
            .toggle_reaction(comment_id, user.id, ReactionType::Like)
            .await
            .map(|_| ())
    }

    /// Record the outcome of a mutation and re-fetch after a success.
    async fn finish(&self, outcome: Result<(), CommentError>, fallback: &str) -> bool {
        match outcome {
            Ok(()) => {
                // A failed refresh leaves its own message; the mutation itself succeeded.
                let _ = self.fetch_comments().await;
                true
            }
            Err(e) => {
                warn!(post_slug = %self.post_slug, "{}: {}", fallback, e);
                let message = e.message_or(fallback);
                self.state.send_modify(|state| state.error = Some(message));
                false
            }
        }
    }

    fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    /// Identity as of this call. Later sign-outs do not affect a call already
    /// under way.
    fn identity(&self) -> Option<UserProfile> {
        self.session.borrow().identity.clone()
    }

    fn require_identity(&self, action: &'static str) -> Result<UserProfile, CommentError> {
        self.identity().ok_or(CommentError::AuthRequired { action })
    }

    /// Refuse early when the loaded list already shows someone else as author.
    /// The store applies the same rule; this only saves a round trip.
    fn ensure_not_foreign(&self, comment_id: Uuid, user_id: Uuid) -> Result<(), CommentError> {
        let state = self.state.borrow();
        let foreign = state
            .comments
            .iter()
            .any(|comment| comment.id() == comment_id && !comment.is_authored_by(user_id));
        if foreign {
            Err(CommentError::NotAuthor)
        } else {
            Ok(())
        }
    }
}
