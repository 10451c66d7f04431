use crate::{
    domain::{
        comments::{
            comment::{Comment, EnrichedComment, NewComment},
            errors::CommentError,
            reaction::{CommentReaction, ReactionCounts, ReactionType},
            repository::CommentRepository,
            value_objects::PostSlug,
        },
        user::UserProfile,
    },
    infrastructure::remote::{
        errors::RemoteError,
        query::{Direction, Query},
        traits::{AuthService, TableClient},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const COMMENTS_TABLE: &str = "comments";
pub const REACTIONS_TABLE: &str = "comment_reactions";

type ReactionKey = (Uuid, Uuid, ReactionType);

/// Comment store backed by the hosted table service.
pub struct RemoteCommentRepository {
    tables: Arc<dyn TableClient>,
    auth: Arc<dyn AuthService>,
    /// One async lock per (comment, user, reaction) so toggles from this
    /// process never interleave their lookup and write.
    reaction_locks: Mutex<HashMap<ReactionKey, Arc<tokio::sync::Mutex<()>>>>,
}

#[derive(Debug, Deserialize)]
struct Ownership {
    author_id: Uuid,
    is_deleted: bool,
}

/// Owner-scoped predicate that never matches a soft-deleted row.
fn owned_live_comment(comment_id: Uuid, author_id: Uuid) -> Query {
    Query::table(COMMENTS_TABLE)
        .eq("id", comment_id)
        .eq("author_id", author_id)
        .eq("is_deleted", false)
}

fn fetch_error(err: RemoteError) -> CommentError {
    CommentError::Fetch(err.to_string())
}

fn mutation_error(err: RemoteError) -> CommentError {
    CommentError::Mutation(err.to_string())
}

impl RemoteCommentRepository {
    pub fn new(tables: Arc<dyn TableClient>, auth: Arc<dyn AuthService>) -> Self {
        Self {
            tables,
            auth,
            reaction_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn enrich(&self, comment: Comment) -> EnrichedComment {
        let (author, like) = tokio::join!(
            self.lookup_author(comment.author_id),
            self.count_likes(comment.id)
        );
        EnrichedComment {
            comment,
            author,
            reactions: ReactionCounts { like },
        }
    }

    async fn lookup_author(&self, author_id: Uuid) -> Option<UserProfile> {
        match self.auth.get_user_by_id(author_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(author_id = %author_id, "Author lookup failed: {}", e);
                None
            }
        }
    }

    async fn count_likes(&self, comment_id: Uuid) -> u32 {
        let query = Query::table(REACTIONS_TABLE)
            .eq("comment_id", comment_id)
            .eq("reaction_type", ReactionType::Like.as_str());
        match self.tables.count(&query).await {
            Ok(count) => u32::try_from(count).unwrap_or(u32::MAX),
            Err(e) => {
                warn!(comment_id = %comment_id, "Like count failed: {}", e);
                0
            }
        }
    }

    /// Work out why an owner-scoped update or delete touched nothing.
    async fn explain_untouched(&self, comment_id: Uuid, author_id: Uuid) -> CommentError {
        let query = Query::table(COMMENTS_TABLE)
            .select("author_id,is_deleted")
            .eq("id", comment_id)
            .limit(1);
        let rows = match self.tables.select(&query).await {
            Ok(rows) => rows,
            Err(e) => return mutation_error(e),
        };
        let ownership = match rows.into_iter().next() {
            Some(row) => match serde_json::from_value::<Ownership>(row) {
                Ok(ownership) => Some(ownership),
                Err(e) => return mutation_error(e.into()),
            },
            None => None,
        };
        match ownership {
            None => CommentError::NotFound(comment_id),
            Some(row) if row.is_deleted => CommentError::NotFound(comment_id),
            Some(row) if row.author_id != author_id => CommentError::NotAuthor,
            Some(_) => CommentError::Mutation("The comment could not be changed".to_string()),
        }
    }

    fn reaction_lock(&self, key: ReactionKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .reaction_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(key).or_default().clone()
    }

    fn release_reaction_lock(&self, key: &ReactionKey) {
        let mut locks = self
            .reaction_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    async fn existing_reaction(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        reaction: ReactionType,
    ) -> Result<Option<CommentReaction>, RemoteError> {
        let query = Query::table(REACTIONS_TABLE)
            .select("*")
            .eq("comment_id", comment_id)
            .eq("user_id", user_id)
            .eq("reaction_type", reaction.as_str())
            .limit(1);
        let rows = self.tables.select(&query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn flip_reaction(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        reaction: ReactionType,
    ) -> Result<bool, RemoteError> {
        match self.existing_reaction(comment_id, user_id, reaction).await? {
            Some(existing) => {
                let query = Query::table(REACTIONS_TABLE).eq("id", existing.id);
                self.tables.delete(&query).await?;
                Ok(false)
            }
            None => {
                let record = json!({
                    "comment_id": comment_id,
                    "user_id": user_id,
                    "reaction_type": reaction.as_str(),
                });
                self.tables.insert(REACTIONS_TABLE, record).await?;
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl CommentRepository for RemoteCommentRepository {
    #[instrument(skip(self))]
    async fn list_visible(
        &self,
        post_slug: &PostSlug,
    ) -> Result<Vec<EnrichedComment>, CommentError> {
        let query = Query::table(COMMENTS_TABLE)
            .select("*")
            .eq("post_slug", post_slug.as_str())
            .eq("is_deleted", false)
            .eq("is_approved", true)
            .order("created_at", Direction::Descending);
        let rows = self.tables.select(&query).await.map_err(fetch_error)?;
        let comments = rows
            .into_iter()
            .map(serde_json::from_value::<Comment>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| fetch_error(e.into()))?;

        Ok(join_all(comments.into_iter().map(|comment| self.enrich(comment))).await)
    }

    #[instrument(skip(self, comment), fields(post_slug = %comment.post_slug))]
    async fn insert(&self, comment: NewComment) -> Result<(), CommentError> {
        let record = serde_json::to_value(&comment).map_err(|e| mutation_error(e.into()))?;
        self.tables
            .insert(COMMENTS_TABLE, record)
            .await
            .map_err(mutation_error)?;
        info!(author_id = %comment.author_id, "Comment added");
        Ok(())
    }

    #[instrument(skip(self, content))]
    async fn update_content(
        &self,
        comment_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<(), CommentError> {
        let query = owned_live_comment(comment_id, author_id);
        let patch = json!({ "content": content, "updated_at": Utc::now() });
        let changed = self
            .tables
            .update(&query, patch)
            .await
            .map_err(mutation_error)?;
        if changed == 0 {
            return Err(self.explain_untouched(comment_id, author_id).await);
        }
        info!("Comment updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, comment_id: Uuid, author_id: Uuid) -> Result<(), CommentError> {
        let query = owned_live_comment(comment_id, author_id);
        let changed = self
            .tables
            .update(&query, json!({ "is_deleted": true }))
            .await
            .map_err(mutation_error)?;
        if changed == 0 {
            return Err(self.explain_untouched(comment_id, author_id).await);
        }
        info!("Comment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn toggle_reaction(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        reaction: ReactionType,
    ) -> Result<bool, CommentError> {
        let key = (comment_id, user_id, reaction);
        let lock = self.reaction_lock(key);
        let result = {
            let _guard = lock.lock().await;
            self.flip_reaction(comment_id, user_id, reaction).await
        };
        drop(lock);
        self.release_reaction_lock(&key);

        let reacted = result.map_err(mutation_error)?;
        info!(reacted, "Reaction toggled");
        Ok(reacted)
    }

    async fn has_reacted(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        reaction: ReactionType,
    ) -> Result<bool, CommentError> {
        self.existing_reaction(comment_id, user_id, reaction)
            .await
            .map(|existing| existing.is_some())
            .map_err(fetch_error)
    }
}
