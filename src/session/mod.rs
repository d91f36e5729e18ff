//! Session store: the single source of truth for authentication state. The
//! store mediates between in-memory state, the two persistence backends and the
//! shared `Authorization` header of the API client. It never depends on the
//! router; logout navigation goes through the injected [`Navigator`].
//!
//! Flow Overview: `init` hydrates from the durable backend, then the ephemeral
//! one. `login` posts credentials to `/api/auth/login`, keeps the returned token
//! and user, persists them to the backend chosen by `remember_me` and publishes
//! the bearer header. `logout` clears memory, both backends and the header.

mod errors;
pub mod storage;
mod types;

pub use errors::{LoginError, LOGIN_FALLBACK_MESSAGE};
pub use storage::{Backends, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use types::{Credentials, SessionSnapshot};

use self::{
    storage::{TOKEN_KEY, USER_KEY},
    types::{token_present, LoginRequest, LoginResponse},
};
use crate::{api::ApiClient, paths};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, PoisonError,
};
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, instrument, warn};

/// Receives navigation requests issued by the store.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);
}

#[derive(Default)]
struct SessionState {
    user: Option<Value>,
    token: Option<SecretString>,
    error: Option<String>,
}

pub struct SessionStore {
    api: ApiClient,
    backends: Backends,
    state: RwLock<SessionState>,
    initialized: OnceCell<()>,
    login_lock: Mutex<()>,
    loading: AtomicBool,
    navigator: std::sync::RwLock<Option<Arc<dyn Navigator>>>,
}

impl SessionStore {
    /// Creates an empty, not yet hydrated store.
    #[must_use]
    pub fn new(api: ApiClient, backends: Backends) -> Self {
        Self {
            api,
            backends,
            state: RwLock::new(SessionState::default()),
            initialized: OnceCell::new(),
            login_lock: Mutex::new(()),
            loading: AtomicBool::new(false),
            navigator: std::sync::RwLock::new(None),
        }
    }

    /// Installs the navigator used by `logout`.
    pub fn set_navigator(&self, navigator: Arc<dyn Navigator>) {
        *self
            .navigator
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(navigator);
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Hydrates state from persisted storage, durable backend first. Leaves
    /// state untouched when neither backend holds a usable record.
    #[instrument(skip_all)]
    pub async fn init(&self) {
        let record = self
            .backends
            .read_order()
            .into_iter()
            .find_map(|(name, store)| read_record(name, store.as_ref()));

        let Some((token, user)) = record else {
            debug!("no persisted session");
            return;
        };

        if let Err(err) = self.api.set_bearer(&token) {
            warn!("persisted token not usable as a header: {err}");
        }

        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user = user;
    }

    /// Runs `init` once for the lifetime of the store.
    pub async fn ensure_initialized(&self) {
        self.initialized
            .get_or_init(|| async {
                self.init().await;
            })
            .await;
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Authenticates against the API and replaces the session.
    ///
    /// Logins are serialized: a second call waits for the first to finish, so
    /// the state always reflects the most recently started login.
    ///
    /// # Errors
    /// Returns a `LoginError` carrying the user-facing message when the request
    /// fails. `token` and `user` keep their previous values in that case.
    #[instrument(skip_all, fields(username = %credentials.username, remember_me = credentials.remember_me))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), LoginError> {
        // Hydrate first so a persisted session cannot later replace this one.
        self.ensure_initialized().await;

        let _serial = self.login_lock.lock().await;
        let _loading = LoadingFlag::raise(&self.loading);
        self.state.write().await.error = None;

        let request = LoginRequest::from_credentials(credentials);
        let result = self
            .api
            .post_json::<_, LoginResponse>(paths::API_LOGIN, &request)
            .await;

        match result {
            Ok(response) => {
                let token = SecretString::from(response.access_token);
                let user = non_null(response.user);

                if let Err(err) = self.persist(&token, user.as_ref(), credentials.remember_me) {
                    warn!("failed to persist session: {err}");
                }
                if let Err(err) = self.api.set_bearer(&token) {
                    warn!("login token not usable as a header: {err}");
                }

                let mut state = self.state.write().await;
                state.token = Some(token);
                state.user = user;
                info!("login succeeded");
                Ok(())
            }
            Err(source) => {
                let err = LoginError::from_api(source);
                warn!(status = ?err.source.status(), "login failed: {}", err.source);

                let mut state = self.state.write().await;
                state.error = Some(err.message.clone());
                Err(err)
            }
        }
    }

    /// Clears the session everywhere and navigates to the login page.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        {
            let mut state = self.state.write().await;
            state.token = None;
            state.user = None;
        }

        for (_, store) in self.backends.read_order() {
            store.remove(TOKEN_KEY);
            store.remove(USER_KEY);
        }

        self.api.clear_bearer();
        info!("logged out");

        let navigator = self
            .navigator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(navigator) = navigator {
            navigator.push(paths::LOGIN);
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            user: state.user.clone(),
            token: state.token.clone(),
            loading: self.loading.load(Ordering::SeqCst),
            error: state.error.clone(),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        token_present(self.state.read().await.token.as_ref())
    }

    pub async fn user(&self) -> Option<Value> {
        self.state.read().await.user.clone()
    }

    pub async fn token(&self) -> Option<SecretString> {
        self.state.read().await.token.clone()
    }

    pub async fn loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    fn persist(
        &self,
        token: &SecretString,
        user: Option<&Value>,
        remember_me: bool,
    ) -> Result<(), StorageError> {
        let store = self.backends.for_remember_me(remember_me);
        let user = serde_json::to_string(user.unwrap_or(&Value::Null))?;
        store.set(TOKEN_KEY, token.expose_secret())?;
        store.set(USER_KEY, &user)?;
        Ok(())
    }
}

/// Holds `loading` up for one login attempt, including a cancelled one.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Reads a complete record from one backend: a non-empty token plus a user
/// value that parses as JSON.
fn read_record(name: &str, store: &dyn KeyValueStore) -> Option<(SecretString, Option<Value>)> {
    let token = store.get(TOKEN_KEY).filter(|token| !token.is_empty())?;
    let raw_user = store.get(USER_KEY)?;
    match serde_json::from_str::<Value>(&raw_user) {
        Ok(user) => {
            debug!(backend = name, "hydrating session");
            Some((SecretString::from(token), non_null(user)))
        }
        Err(_) => {
            debug!(backend = name, "ignoring malformed persisted user");
            None
        }
    }
}

fn non_null(value: Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}
