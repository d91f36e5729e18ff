//! Guarded client router. Navigations are processed one at a time: each target
//! is resolved against the route table, passed through the
//! [`guard::NavigationGuard`], and committed as the current route once the
//! guard allows it. Guard redirects start a new resolution with the same
//! `from` route.

pub mod guard;
pub mod routes;
pub mod table;

pub use guard::{Decision, NavigationGuard};
pub use table::{Location, ResolvedRoute, RouteMeta, RouteRecord, RouteTable};

use crate::session::Navigator;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Guard redirects allowed for a single navigation.
const MAX_GUARD_REDIRECTS: usize = 10;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("invalid location: {0}")]
    InvalidLocation(String),
    #[error("invalid route pattern: {0}")]
    InvalidRoute(String),
    #[error("no route matches {0}")]
    NotFound(String),
    #[error("too many redirects while navigating to {0}")]
    RedirectLoop(String),
}

/// Page-level state written by the guard.
#[derive(Clone, Debug, Default)]
pub struct Document {
    title: String,
}

impl Document {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationStatus {
    Committed,
    /// The final target was already the current route; nothing changed.
    Duplicated,
}

#[derive(Clone, Debug)]
pub struct NavigationOutcome {
    pub status: NavigationStatus,
    pub route: ResolvedRoute,
    /// Full paths the guard redirected away from, in order.
    pub redirects: Vec<String>,
}

/// Cloneable handle that queues navigations for the router.
#[derive(Clone, Debug)]
pub struct RouterHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl Navigator for RouterHandle {
    fn push(&self, path: &str) {
        if self.tx.send(path.to_string()).is_err() {
            debug!(path, "router dropped, navigation ignored");
        }
    }
}

pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    current: ResolvedRoute,
    started: bool,
    document: Document,
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, guard: NavigationGuard) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            table,
            guard,
            current: ResolvedRoute::start(),
            started: false,
            document: Document::default(),
            tx,
            rx,
        }
    }

    #[must_use]
    pub fn handle(&self) -> RouterHandle {
        RouterHandle {
            tx: self.tx.clone(),
        }
    }

    #[must_use]
    pub fn current(&self) -> &ResolvedRoute {
        &self.current
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Navigates to `target` through the guard. Navigations queued through a
    /// [`RouterHandle`] run first, in arrival order.
    ///
    /// # Errors
    /// Returns a `NavigationError` when the target is invalid, matches no
    /// route, or the guard keeps redirecting.
    #[instrument(skip(self))]
    pub async fn push(&mut self, target: &str) -> Result<NavigationOutcome, NavigationError> {
        for outcome in self.process_pending().await {
            if let Err(err) = outcome {
                warn!("queued navigation failed: {err}");
            }
        }
        self.navigate(target).await
    }

    /// Runs every queued navigation in arrival order.
    pub async fn process_pending(&mut self) -> Vec<Result<NavigationOutcome, NavigationError>> {
        let mut outcomes = Vec::new();
        while let Ok(target) = self.rx.try_recv() {
            outcomes.push(self.navigate(&target).await);
        }
        outcomes
    }

    async fn navigate(&mut self, target: &str) -> Result<NavigationOutcome, NavigationError> {
        let mut location = Location::parse(target)?;
        let mut redirects = Vec::new();

        for _ in 0..=MAX_GUARD_REDIRECTS {
            let to = self.table.resolve(&location)?;

            if self.started && to.full_path == self.current.full_path {
                debug!(path = %to.full_path, "already there");
                return Ok(NavigationOutcome {
                    status: NavigationStatus::Duplicated,
                    route: self.current.clone(),
                    redirects,
                });
            }

            match self
                .guard
                .before_each(&to, &self.current, &mut self.document)
                .await
            {
                Decision::Allow => {
                    info!(path = %to.full_path, "navigated");
                    self.current = to.clone();
                    self.started = true;
                    return Ok(NavigationOutcome {
                        status: NavigationStatus::Committed,
                        route: to,
                        redirects,
                    });
                }
                Decision::Redirect(next) => {
                    redirects.push(to.full_path);
                    location = next;
                }
            }
        }

        Err(NavigationError::RedirectLoop(target.to_string()))
    }
}
