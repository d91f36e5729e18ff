//! Well-known client paths shared by the session store and the route table.

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const DASHBOARD: &str = "/dashboard";

/// Query key carrying the originally requested path on auth redirects.
pub const REDIRECT_QUERY: &str = "redirect";

/// Login endpoint on the API host.
pub const API_LOGIN: &str = "/api/auth/login";
