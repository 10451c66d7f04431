use super::{errors::RemoteError, query::Query};
use crate::domain::{
    session::identity::{AuthEvent, OAuthProvider, Session},
    user::UserProfile,
};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Table side of the hosted data service.
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError>;

    /// Exact number of rows matching the query's filters.
    async fn count(&self, query: &Query) -> Result<u64, RemoteError>;

    async fn insert(&self, table: &str, record: Value) -> Result<(), RemoteError>;

    /// Apply `patch` to every matching row and return how many rows changed.
    async fn update(&self, query: &Query, patch: Value) -> Result<u64, RemoteError>;

    /// Remove every matching row and return how many rows went away.
    async fn delete(&self, query: &Query) -> Result<u64, RemoteError>;
}

/// Authentication side of the hosted data service.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// The current session, or `None` when signed out or expired.
    async fn get_session(&self) -> Result<Option<Session>, RemoteError>;

    /// Stream of session changes. Dropping the receiver ends the subscription.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Start a redirect based sign-in and return the URL to send the browser to.
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Result<String, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Admin lookup of any user's public profile.
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, RemoteError>;
}
