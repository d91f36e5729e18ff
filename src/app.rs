//! Wires the client together: one API client, one session store and one
//! guarded router, created at startup and shared for the process lifetime.

use crate::{
    api::{ApiClient, ApiError},
    config::AppConfig,
    router::{routes::app_routes, NavigationError, NavigationGuard, NavigationOutcome, Router},
    session::{Backends, SessionStore},
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

pub struct App {
    pub config: AppConfig,
    pub store: Arc<SessionStore>,
    pub router: Router,
}

impl App {
    /// Client with the durable backend in the configured state directory.
    ///
    /// # Errors
    /// Returns an `AppError` if the HTTP client or the route table cannot be built.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let backends = Backends::on_disk(&config.state_dir);
        Self::with_backends(config, backends)
    }

    /// # Errors
    /// Same as [`App::new`].
    pub fn with_backends(config: AppConfig, backends: Backends) -> Result<Self, AppError> {
        let api = ApiClient::new(&config)?;
        let store = Arc::new(SessionStore::new(api, backends));
        let guard = NavigationGuard::new(Arc::clone(&store), &config);
        let router = Router::new(app_routes()?, guard);
        store.set_navigator(Arc::new(router.handle()));

        Ok(Self {
            config,
            store,
            router,
        })
    }

    /// Logs out and runs the resulting navigation to the login page.
    pub async fn logout(&mut self) -> Vec<Result<NavigationOutcome, NavigationError>> {
        self.store.logout().await;
        self.router.process_pending().await
    }
}
