use crate::{
    domain::{
        session::identity::{AuthEvent, OAuthProvider},
        user::UserProfile,
    },
    infrastructure::remote::traits::AuthService,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<UserProfile>,
    /// True until the first session query has answered.
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
            error: None,
        }
    }
}

/// Current identity as reported by the auth service.
///
/// A single current-value cell; every auth event overwrites it, and any number
/// of readers can watch it.
pub struct SessionStore {
    auth: Arc<dyn AuthService>,
    state: Arc<watch::Sender<SessionState>>,
}

/// Keeps the auth event listener alive. Dropping it stops the listener.
pub struct SessionSubscription {
    listener: JoinHandle<()>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {
        self.listener.abort();
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            auth,
            state: Arc::new(state),
        }
    }

    /// Subscribe to auth events, then resolve the initial session.
    ///
    /// The loading flag clears once the initial query answers, whether or not
    /// it succeeded. An auth event received before that answer wins over it.
    pub async fn start(&self) -> SessionSubscription {
        let mut events = self.auth.subscribe();
        let state = Arc::clone(&self.state);
        let event_seen = Arc::new(AtomicBool::new(false));
        let listener_seen = Arc::clone(&event_seen);
        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        listener_seen.store(true, Ordering::SeqCst);
                        apply_event(&state, &event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session listener fell behind auth events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Auth event stream closed");
        });

        let initial = self.auth.get_session().await;
        // An event that landed while the query was pending is newer than its answer.
        if event_seen.load(Ordering::SeqCst) {
            debug!("Initial session answer superseded by an auth event");
            self.state.send_modify(|state| state.loading = false);
            return SessionSubscription { listener };
        }

        match initial {
            Ok(session) => {
                let identity = session.map(|session| session.user);
                self.state.send_modify(|state| {
                    state.identity = identity;
                    state.loading = false;
                });
            }
            Err(e) => {
                error!("Failed to load session: {}", e);
                self.state.send_modify(|state| {
                    state.identity = None;
                    state.loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }

        SessionSubscription { listener }
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<UserProfile> {
        self.state.borrow().identity.clone()
    }

    pub fn apply_event(&self, event: &AuthEvent) {
        apply_event(&self.state, event);
    }

    /// Begin an OAuth sign-in and return the URL to redirect to.
    pub async fn sign_in(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> Option<String> {
        self.set_error(None);
        match self.auth.sign_in_with_oauth(provider, redirect_to).await {
            Ok(url) => Some(url),
            Err(e) => {
                error!(provider = provider.as_str(), "Sign-in failed: {}", e);
                self.set_error(Some(message_or(&e.to_string(), "Failed to sign in")));
                None
            }
        }
    }

    pub async fn sign_out(&self) -> bool {
        self.set_error(None);
        match self.auth.sign_out().await {
            Ok(()) => {
                self.state.send_modify(|state| state.identity = None);
                true
            }
            Err(e) => {
                error!("Sign-out failed: {}", e);
                self.set_error(Some(message_or(&e.to_string(), "Failed to sign out")));
                false
            }
        }
    }

    fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|state| state.error = error);
    }
}

fn apply_event(state: &watch::Sender<SessionState>, event: &AuthEvent) {
    let identity = event.identity().cloned();
    info!(
        kind = ?event.kind,
        user_id = ?identity.as_ref().map(|user| user.id),
        "Auth state changed"
    );
    state.send_modify(|state| {
        state.identity = identity;
        state.loading = false;
    });
}

fn message_or(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}
