use super::{
    errors::RemoteError,
    query::Query,
    session_token::read_claims,
    traits::{AuthService, TableClient},
};
use crate::{
    config::Config,
    domain::{
        session::identity::{AuthEvent, AuthEventKind, OAuthProvider, Session},
        user::UserProfile,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const AUTH_EVENT_CAPACITY: usize = 16;

/// Client for a Supabase-style hosted service: PostgREST tables under
/// `/rest/v1` and GoTrue auth under `/auth/v1`.
pub struct PostgrestClient {
    http: Client,
    base_url: String,
    anon_key: String,
    service_role_key: Option<String>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    user: UserProfile,
}

impl PostgrestClient {
    pub fn new(config: &Config) -> Result<Self, RemoteError> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.remote_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        if config.supabase_service_role_key.is_none() {
            warn!("SUPABASE_SERVICE_ROLE_KEY not set; comment authors will show as anonymous");
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
            session: RwLock::new(None),
            events,
        })
    }

    /// Adopt the tokens returned by an OAuth redirect.
    ///
    /// Confirms the token with the auth service, stores the session and emits
    /// `SignedIn`.
    #[instrument(skip_all)]
    pub async fn set_session(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<Session, RemoteError> {
        let claims = read_claims(&access_token)?;
        let response = self
            .request(Method::GET, self.auth_url("user")?)
            .bearer_auth(&access_token)
            .send()
            .await?;
        let user: UserProfile = check(response).await?.json().await?;

        let session = Session {
            access_token,
            refresh_token,
            expires_at: claims.expires_at(),
            user,
        };
        *self.session.write().await = Some(session.clone());
        info!(user_id = %session.user.id, "Session established");
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    /// Exchange the stored refresh token for a new access token.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self) -> Result<Session, RemoteError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .and_then(|session| session.refresh_token.clone())
            .ok_or(RemoteError::NoSession)?;

        let mut url = self.auth_url("token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");
        let response = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let tokens: TokenResponse = check(response).await?.json().await?;
        let claims = read_claims(&tokens.access_token)?;

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.or(Some(refresh_token)),
            expires_at: claims.expires_at(),
            user: tokens.user,
        };
        *self.session.write().await = Some(session.clone());
        debug!(user_id = %session.user.id, "Session refreshed");
        self.emit(AuthEvent {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session.clone()),
        });
        Ok(session)
    }

    async fn clear_session(&self) {
        let previous = self.session.write().await.take();
        if previous.is_some() {
            self.emit(AuthEvent::signed_out());
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine: nobody is watching the session yet.
        let _ = self.events.send(event);
    }

    fn rest_url(&self, query: &Query) -> Result<Url, RemoteError> {
        let mut url = parse_url(&format!("{}/rest/v1/{}", self.base_url, query.table_name()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_postgrest_params() {
                pairs.append_pair(&key, &value);
            }
        }
        Ok(url)
    }

    fn auth_url(&self, path: &str) -> Result<Url, RemoteError> {
        parse_url(&format!("{}/auth/v1/{}", self.base_url, path))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
    }

    /// Table request carrying the signed-in user's token, or the public key.
    async fn table_request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        self.request(method, url).bearer_auth(bearer)
    }
}

#[async_trait]
impl TableClient for PostgrestClient {
    #[instrument(skip(self), fields(table = query.table_name()))]
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError> {
        let url = self.rest_url(query)?;
        let response = self.table_request(Method::GET, url).await.send().await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        debug!(rows = rows.len(), "Select complete");
        Ok(rows)
    }

    #[instrument(skip(self), fields(table = query.table_name()))]
    async fn count(&self, query: &Query) -> Result<u64, RemoteError> {
        let url = self.rest_url(query)?;
        let response = self
            .table_request(Method::HEAD, url)
            .await
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check(response).await?;
        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RemoteError::Decode("missing Content-Range header".to_string()))?;
        parse_content_range_total(content_range)
    }

    #[instrument(skip(self, record))]
    async fn insert(&self, table: &str, record: Value) -> Result<(), RemoteError> {
        let url = parse_url(&format!("{}/rest/v1/{}", self.base_url, table))?;
        let response = self
            .table_request(Method::POST, url)
            .await
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, patch), fields(table = query.table_name()))]
    async fn update(&self, query: &Query, patch: Value) -> Result<u64, RemoteError> {
        let url = self.rest_url(query)?;
        let response = self
            .table_request(Method::PATCH, url)
            .await
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        Ok(rows.len() as u64)
    }

    #[instrument(skip(self), fields(table = query.table_name()))]
    async fn delete(&self, query: &Query) -> Result<u64, RemoteError> {
        let url = self.rest_url(query)?;
        let response = self
            .table_request(Method::DELETE, url)
            .await
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl AuthService for PostgrestClient {
    async fn get_session(&self) -> Result<Option<Session>, RemoteError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }

        if session.refresh_token.is_some() {
            match self.refresh_session().await {
                Ok(refreshed) => return Ok(Some(refreshed)),
                Err(e) => warn!("Session refresh failed: {}", e),
            }
        }
        info!(user_id = %session.user.id, "Session expired");
        self.clear_session().await;
        Ok(None)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Result<String, RemoteError> {
        let mut url = self.auth_url("authorize")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("provider", provider.as_str());
            if let Some(redirect_to) = redirect_to {
                pairs.append_pair("redirect_to", redirect_to);
            }
        }
        Ok(url.to_string())
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), RemoteError> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone());
        if let Some(token) = token {
            let response = self
                .request(Method::POST, self.auth_url("logout")?)
                .bearer_auth(token)
                .send()
                .await?;
            check(response).await?;
        }
        self.clear_session().await;
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, RemoteError> {
        // Admin lookups need the service role key; without it authors stay unknown.
        let Some(service_key) = &self.service_role_key else {
            return Ok(None);
        };
        let response = self
            .http
            .get(self.auth_url(&format!("admin/users/{}", user_id))?)
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let user: UserProfile = check(response).await?.json().await?;
        Ok(Some(user))
    }
}

fn parse_url(raw: &str) -> Result<Url, RemoteError> {
    Url::parse(raw).map_err(|e| RemoteError::Transport(format!("Invalid URL {}: {}", raw, e)))
}

/// Pass 2xx responses through; turn anything else into `RemoteError::Status`
/// carrying the service's message.
async fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        message: error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string()),
    })
}

fn error_message(body: &str) -> Option<String> {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            let trimmed = body.trim();
            return (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    };
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range_total(header: &str) -> Result<u64, RemoteError> {
    header
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| RemoteError::Decode(format!("unusable Content-Range: {}", header)))
}
