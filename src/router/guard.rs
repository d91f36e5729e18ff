//! Pre-transition guard. It makes sure the session store is hydrated before the
//! first decision, sets the page title and sends visitors to the login page (or
//! away from guest-only pages) based on the matched route flags.
//! UX-only gating; real access control must live on the API.

use super::{
    table::{Location, ResolvedRoute},
    Document,
};
use crate::{config::AppConfig, paths, session::SessionStore};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Location),
}

pub struct NavigationGuard {
    store: Arc<SessionStore>,
    site_name: String,
    landing_path: String,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, config: &AppConfig) -> Self {
        Self {
            store,
            site_name: config.site_name.clone(),
            landing_path: config.landing_path.clone(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// `"<title> | <site>"`, or the site name alone for untitled routes.
    #[must_use]
    pub fn page_title(&self, to: &ResolvedRoute) -> String {
        match to.title() {
            Some(title) => format!("{title} | {}", self.site_name),
            None => self.site_name.clone(),
        }
    }

    pub async fn before_each(
        &self,
        to: &ResolvedRoute,
        from: &ResolvedRoute,
        document: &mut Document,
    ) -> Decision {
        self.store.ensure_initialized().await;

        document.set_title(self.page_title(to));

        let authenticated = self.store.is_authenticated().await;
        let decision = decide(to, from, authenticated, &self.landing_path);
        debug!(to = %to.full_path, from = %from.path, authenticated, ?decision, "guard decision");
        decision
    }
}

/// Auth decision for one transition, in priority order: auth-required routes
/// bounce unauthenticated visitors to login, guest-only routes bounce
/// authenticated visitors back where they came from.
#[must_use]
pub fn decide(
    to: &ResolvedRoute,
    from: &ResolvedRoute,
    authenticated: bool,
    landing_path: &str,
) -> Decision {
    if to.requires_auth() && !authenticated {
        let mut login = Location::new(paths::LOGIN);
        if to.full_path != paths::HOME {
            login = login.with_query(paths::REDIRECT_QUERY, &to.full_path);
        }
        return Decision::Redirect(login);
    }

    if to.guest_only() && authenticated {
        let target = if from.path == paths::HOME {
            landing_path
        } else {
            from.path.as_str()
        };
        return Decision::Redirect(Location::new(target));
    }

    Decision::Allow
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        api::ApiClient,
        router::table::{RouteRecord, RouteTable},
        session::{
            storage::{TOKEN_KEY, USER_KEY},
            Backends, KeyValueStore,
        },
    };

    fn table() -> RouteTable {
        RouteTable::new(vec![
            RouteRecord::new("/", "home", "HomeView"),
            RouteRecord::new("/secure-root", "secure-root", "SecureView").requires_auth(),
            RouteRecord::new("/portfolio", "portfolio", "PortfolioView").title("Portfolio"),
            RouteRecord::new("/blog/new", "blog-new", "BlogEditorView")
                .title("New Post")
                .requires_auth(),
            RouteRecord::new("/login", "login", "LoginView")
                .title("Login")
                .guest_only(),
            RouteRecord::new("/admin", "admin", "AdminView")
                .requires_auth()
                .children(vec![RouteRecord::new("posts", "admin-posts", "PostsView")]),
        ])
        .unwrap()
    }

    fn resolve(path: &str) -> ResolvedRoute {
        table().resolve(&Location::parse(path).unwrap()).unwrap()
    }

    /// A resolved root route flagged as auth-required.
    fn protected_root() -> ResolvedRoute {
        let mut route = resolve("/secure-root");
        route.path = "/".to_string();
        route.full_path = "/".to_string();
        route
    }

    fn guard(store: Arc<SessionStore>) -> NavigationGuard {
        NavigationGuard::new(store, &AppConfig::default())
    }

    fn store() -> Arc<SessionStore> {
        let api = ApiClient::new(&AppConfig::default()).unwrap();
        Arc::new(SessionStore::new(api, Backends::in_memory()))
    }

    #[test]
    fn requires_auth_redirects_with_requested_path() {
        let decision = decide(&resolve("/blog/new"), &ResolvedRoute::start(), false, "/dashboard");
        match decision {
            Decision::Redirect(location) => {
                assert_eq!(location.full_path(), "/login?redirect=/blog/new");
            }
            Decision::Allow => panic!("expected redirect"),
        }
    }

    #[test]
    fn requires_auth_on_root_omits_redirect_query() {
        let decision = decide(&protected_root(), &ResolvedRoute::start(), false, "/dashboard");
        assert_eq!(decision, Decision::Redirect(Location::new("/login")));
    }

    #[test]
    fn guest_only_sends_authenticated_back_to_previous_path() {
        let from = resolve("/portfolio?tab=work");
        let decision = decide(&resolve("/login"), &from, true, "/dashboard");
        assert_eq!(decision, Decision::Redirect(Location::new("/portfolio")));
    }

    #[test]
    fn guest_only_from_root_goes_to_landing_path() {
        let decision = decide(&resolve("/login"), &resolve("/"), true, "/dashboard");
        assert_eq!(decision, Decision::Redirect(Location::new("/dashboard")));
    }

    #[test]
    fn unflagged_and_satisfied_routes_are_allowed() {
        let start = ResolvedRoute::start();
        assert_eq!(decide(&resolve("/portfolio"), &start, false, "/d"), Decision::Allow);
        assert_eq!(decide(&resolve("/blog/new"), &start, true, "/d"), Decision::Allow);
        assert_eq!(decide(&resolve("/login"), &start, false, "/d"), Decision::Allow);
    }

    #[test]
    fn flags_on_any_matched_segment_apply() {
        let decision = decide(&resolve("/admin/posts"), &ResolvedRoute::start(), false, "/d");
        assert_eq!(
            decision,
            Decision::Redirect(Location::new("/login").with_query("redirect", "/admin/posts"))
        );
    }

    #[tokio::test]
    async fn before_each_sets_title_and_allows_plain_route() {
        let guard = guard(store());
        let mut document = Document::default();

        let decision = guard
            .before_each(&resolve("/portfolio"), &ResolvedRoute::start(), &mut document)
            .await;

        assert_eq!(decision, Decision::Allow);
        assert_eq!(document.title(), "Portfolio | Rajorshi Tah");
    }

    #[tokio::test]
    async fn before_each_uses_site_name_for_untitled_route() {
        let guard = guard(store());
        let mut document = Document::default();

        guard
            .before_each(&resolve("/"), &ResolvedRoute::start(), &mut document)
            .await;

        assert_eq!(document.title(), "Rajorshi Tah");
    }

    #[tokio::test]
    async fn before_each_hydrates_store_before_deciding() {
        let store = store();
        store.backends().durable.set(TOKEN_KEY, "tok").unwrap();
        store
            .backends()
            .durable
            .set(USER_KEY, "{}")
            .unwrap();
        let guard = guard(Arc::clone(&store));
        let mut document = Document::default();

        let decision = guard
            .before_each(&resolve("/blog/new"), &ResolvedRoute::start(), &mut document)
            .await;

        assert!(store.is_initialized());
        assert_eq!(decision, Decision::Allow);
        assert_eq!(document.title(), "New Post | Rajorshi Tah");
    }
}
