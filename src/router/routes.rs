use super::{
    table::{RouteRecord, RouteTable},
    NavigationError,
};

/// The client's route table. Views are opaque identifiers of the page
/// components.
///
/// # Errors
/// Returns `NavigationError::InvalidRoute` if a path pattern does not compile.
pub fn app_routes() -> Result<RouteTable, NavigationError> {
    RouteTable::new(vec![
        RouteRecord::new("/", "home", "HomeView").title("Home"),
        RouteRecord::new("/portfolio", "portfolio", "PortfolioView").title("Portfolio"),
        RouteRecord::new("/cv", "cv", "CVView").title("CV"),
        RouteRecord::new("/ai", "ai", "AIView").title("AI Assistant"),
        RouteRecord::new("/blog", "blog", "BlogView").title("Blog"),
        RouteRecord::new("/blog/new", "blog-new", "BlogEditorView")
            .title("New Post")
            .requires_auth(),
        RouteRecord::new("/blog/:id", "blog-post", "BlogPostView").title("Blog Post"),
        RouteRecord::new("/blog/:id/edit", "blog-edit", "BlogEditorView")
            .title("Edit Post")
            .requires_auth(),
        RouteRecord::new("/contact", "contact", "ContactView").title("Contact"),
        RouteRecord::new("/about", "about", "AboutView").title("About"),
        RouteRecord::new(crate::paths::LOGIN, "login", "LoginView")
            .title("Login")
            .guest_only(),
        RouteRecord::new("/profile-management", "profile-management", "ProfileManagementView")
            .title("Profile Management")
            .requires_auth(),
        RouteRecord::new(crate::paths::DASHBOARD, "dashboard", "DashboardView")
            .title("Dashboard")
            .requires_auth(),
        RouteRecord::redirect("/*any", crate::paths::HOME),
    ])
}
