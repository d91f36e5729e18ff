//! # Folio (portfolio client session core)
//!
//! `folio` is the session and routing core of the portfolio/blog client. It
//! decides whether the visitor is signed in and which pages they may see.
//!
//! ## Session
//!
//! The [`session::SessionStore`] is the single source of truth for auth state.
//! It hydrates from one of two key-value backends (durable for "remember me",
//! ephemeral otherwise), performs the login call against `/api/auth/login` and
//! keeps the shared `Authorization: Bearer` header of the [`api::ApiClient`]
//! in sync with the current token.
//!
//! ## Navigation
//!
//! The [`router::Router`] resolves paths against a static route table and runs
//! the [`router::guard::NavigationGuard`] before committing each transition.
//! The guard hydrates the store on first use, sets the page title and
//! redirects based on the `requires_auth` and `guest_only` route flags.
//!
//! Tokens and passwords are held as `SecretString` and must never be logged.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod paths;
pub mod router;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
