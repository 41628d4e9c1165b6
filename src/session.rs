//! Current user and bearer token, persisted under the `token` and `user` keys.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::{
        AuthApi,
        auth::{AuthResponse, LoginRequest, RegisterRequest},
    },
    error::{ClientError, Result},
    models::User,
    storage::{KeyValueStore, TOKEN_KEY, USER_KEY, stored_token},
};

/// A signed-in user together with the token that authenticates them.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub user: User,
    pub token: String,
}

impl From<AuthResponse> for Credentials {
    fn from(response: AuthResponse) -> Self {
        Self {
            user: response.user,
            token: response.token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Initializing,
    Restoring,
    Authenticated(Credentials),
    Anonymous,
}

impl SessionState {
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            SessionState::Authenticated(credentials) => Some(credentials),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials().map(|credentials| &credentials.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials()
            .map(|credentials| credentials.token.as_str())
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Initializing => "initializing",
            SessionState::Restoring => "restoring",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Anonymous => "anonymous",
        }
    }

    /// True once the startup restore has finished either way.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SessionState::Authenticated(_) | SessionState::Anonymous
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(User::has_admin_rights)
    }

    pub fn is_super_admin(&self) -> bool {
        self.user().is_some_and(User::has_super_admin_rights)
    }

    pub fn is_admin_approved(&self) -> bool {
        self.user().is_some_and(User::is_approved_admin)
    }
}

struct SessionInner {
    auth: AuthApi,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
    last_error: Mutex<Option<String>>,
}

/// Process-wide session, shared by cloning the handle.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    pub fn new(auth: AuthApi, store: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Initializing);
        Self {
            inner: Arc::new(SessionInner {
                auth,
                store,
                state,
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Restore a persisted session, validating the token against the profile endpoint.
    ///
    /// The profile response replaces any locally cached user. Any failure purges the
    /// persisted credentials and leaves the session anonymous.
    pub async fn init(&self) -> SessionState {
        let Some(token) = stored_token(self.inner.store.as_ref()) else {
            self.purge();
            self.transition(SessionState::Anonymous);
            return self.state();
        };

        self.transition(SessionState::Restoring);
        match self.inner.auth.profile().await {
            Ok(user) => {
                if let Err(err) = self.persist_user(&user) {
                    warn!(?err, "failed to refresh cached user");
                }
                info!(user = %user.id, "session restored");
                self.transition(SessionState::Authenticated(Credentials { user, token }));
            }
            Err(err) => {
                warn!(%err, "stored session rejected; clearing credentials");
                self.purge();
                self.set_error(Some(err.message()));
                self.transition(SessionState::Anonymous);
            }
        }
        self.state()
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<Credentials> {
        self.set_error(None);
        let response = self
            .inner
            .auth
            .login(credentials)
            .await
            .inspect_err(|err| self.set_error(Some(err.message())))?;
        self.establish(response.into())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Credentials> {
        self.set_error(None);
        let response = self
            .inner
            .auth
            .register(request)
            .await
            .inspect_err(|err| self.set_error(Some(err.message())))?;
        self.establish(response.into())
    }

    /// Forget the session locally. Safe to call repeatedly.
    pub fn logout(&self) {
        self.purge();
        self.set_error(None);
        if self.state().is_authenticated() {
            info!("logged out");
        }
        self.transition(SessionState::Anonymous);
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.state().is_admin()
    }

    pub fn is_super_admin(&self) -> bool {
        self.state().is_super_admin()
    }

    pub fn is_admin_approved(&self) -> bool {
        self.state().is_admin_approved()
    }

    /// Gate for admin-only screens.
    pub fn require_admin(&self) -> Result<User> {
        match self.current_user() {
            Some(user) if user.has_admin_rights() => Ok(user),
            Some(_) => Err(ClientError::Auth(
                "You need admin privileges to access this page.".to_string(),
            )),
            None => Err(ClientError::Auth("Please sign in first.".to_string())),
        }
    }

    /// Message from the last failed login, register or restore.
    pub fn last_error(&self) -> Option<String> {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    fn establish(&self, credentials: Credentials) -> Result<Credentials> {
        if let Err(err) = self.persist(&credentials) {
            self.purge();
            self.set_error(Some(err.message()));
            return Err(err);
        }
        info!(user = %credentials.user.id, role = credentials.user.role.as_str(), "signed in");
        self.transition(SessionState::Authenticated(credentials.clone()));
        Ok(credentials)
    }

    fn persist(&self, credentials: &Credentials) -> Result<()> {
        self.inner.store.set_item(TOKEN_KEY, &credentials.token)?;
        self.persist_user(&credentials.user)
    }

    fn persist_user(&self, user: &User) -> Result<()> {
        let serialized = serde_json::to_string(user)?;
        self.inner.store.set_item(USER_KEY, &serialized)
    }

    // Both keys always go together.
    fn purge(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.inner.store.remove_item(key) {
                warn!(?err, key, "failed to clear persisted session key");
            }
        }
    }

    fn transition(&self, next: SessionState) {
        debug!(state = next.label(), "session transition");
        self.inner.state.send_replace(next);
    }

    fn set_error(&self, message: Option<String>) {
        *self
            .inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = message;
    }
}
