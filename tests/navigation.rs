//! End-to-end session and navigation flows against a mocked login endpoint:
//! guarded redirects before and after login, remembered sessions surviving a
//! restart, and logout returning the visitor to the login page.

#![allow(clippy::unwrap_used)]

use folio::{
    app::App,
    config::AppConfig,
    router::NavigationStatus,
    session::{Backends, Credentials, KeyValueStore},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::{net::TcpListener, path::Path};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn config(api_base_url: &str, state_dir: &Path) -> AppConfig {
    AppConfig {
        api_base_url: api_base_url.to_string(),
        state_dir: state_dir.to_path_buf(),
        ..AppConfig::default()
    }
}

async fn login_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "raj", "password": "correct" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-token",
            "user": { "username": "raj", "email": "raj@example.dev" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "raj", "password": "wrong" })))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;
    server
}

fn credentials(password: &str, remember_me: bool) -> Credentials {
    Credentials::new("raj", SecretString::from(password.to_string()), remember_me)
}

#[tokio::test]
async fn protected_page_requires_login_then_opens() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = login_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut app = App::new(config(&server.uri(), dir.path())).unwrap();

    let outcome = app.router.push("/blog/new").await.unwrap();
    assert_eq!(outcome.route.full_path, "/login?redirect=/blog/new");
    assert_eq!(app.router.document().title(), "Login | Rajorshi Tah");

    let err = app.store.login(&credentials("wrong", false)).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!app.store.is_authenticated().await);

    app.store.login(&credentials("correct", false)).await.unwrap();
    assert!(app.store.error().await.is_none());

    let redirect = outcome.route.query.iter().find(|(k, _)| k == "redirect").unwrap();
    let outcome = app.router.push(&redirect.1).await.unwrap();
    assert_eq!(outcome.status, NavigationStatus::Committed);
    assert_eq!(outcome.route.name(), Some("blog-new"));
    assert_eq!(app.router.document().title(), "New Post | Rajorshi Tah");

    // Signed in: the login page bounces back to where the visitor was.
    let outcome = app.router.push("/login").await.unwrap();
    assert_eq!(outcome.status, NavigationStatus::Duplicated);
    assert_eq!(app.router.current().path, "/blog/new");
}

#[tokio::test]
async fn remembered_session_survives_restart() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = login_server().await;
    let dir = tempfile::tempdir().unwrap();

    {
        let app = App::new(config(&server.uri(), dir.path())).unwrap();
        app.store.login(&credentials("correct", true)).await.unwrap();
    }

    let mut app = App::new(config(&server.uri(), dir.path())).unwrap();
    assert!(!app.store.is_initialized());

    let outcome = app.router.push("/login").await.unwrap();

    assert!(app.store.is_initialized());
    assert_eq!(outcome.route.path, "/dashboard");
    assert_eq!(
        app.store.token().await.unwrap().expose_secret(),
        "jwt-token"
    );
    assert_eq!(
        app.store
            .api()
            .authorization()
            .unwrap()
            .to_str()
            .unwrap(),
        "Bearer jwt-token"
    );
}

#[tokio::test]
async fn session_only_login_is_forgotten_after_restart() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = login_server().await;
    let dir = tempfile::tempdir().unwrap();

    {
        let app = App::new(config(&server.uri(), dir.path())).unwrap();
        app.store.login(&credentials("correct", false)).await.unwrap();
        assert!(app.store.is_authenticated().await);
    }

    let mut app = App::new(config(&server.uri(), dir.path())).unwrap();
    let outcome = app.router.push("/profile-management").await.unwrap();

    assert_eq!(
        outcome.route.full_path,
        "/login?redirect=/profile-management"
    );
}

#[tokio::test]
async fn logout_clears_durable_session_and_shows_login() {
    let dir = tempfile::tempdir().unwrap();
    let backends = Backends::on_disk(dir.path());
    backends.durable.set("token", "jwt-token").unwrap();
    backends
        .durable
        .set("user", r#"{"username":"raj"}"#)
        .unwrap();
    let mut app = App::with_backends(config("http://api.invalid", dir.path()), backends).unwrap();

    app.router.push("/dashboard").await.unwrap();
    assert_eq!(app.router.document().title(), "Dashboard | Rajorshi Tah");

    app.logout().await;

    assert_eq!(app.router.current().path, "/login");
    let reopened = Backends::on_disk(dir.path());
    assert_eq!(reopened.durable.get("token"), None);
    assert_eq!(reopened.durable.get("user"), None);
    assert!(app.store.api().authorization().is_none());
}

#[tokio::test]
async fn unknown_paths_land_on_home() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = App::with_backends(config("", dir.path()), Backends::in_memory()).unwrap();

    let outcome = app.router.push("/no/such/page").await.unwrap();

    assert_eq!(outcome.route.name(), Some("home"));
    assert_eq!(outcome.route.redirected_from.as_deref(), Some("/no/such/page"));
    assert_eq!(app.router.document().title(), "Home | Rajorshi Tah");
}

#[tokio::test]
async fn login_before_first_navigation_outranks_remembered_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = login_server().await;
    let dir = tempfile::tempdir().unwrap();
    let backends = Backends::on_disk(dir.path());
    backends.durable.set("token", "stale-token").unwrap();
    backends
        .durable
        .set("user", r#"{"username":"alice"}"#)
        .unwrap();
    let mut app = App::with_backends(config(&server.uri(), dir.path()), backends).unwrap();

    app.store.login(&credentials("correct", false)).await.unwrap();
    app.router.push("/portfolio").await.unwrap();

    assert_eq!(
        app.store.token().await.unwrap().expose_secret(),
        "jwt-token"
    );
    assert_eq!(app.store.user().await.unwrap()["username"], "raj");
    assert_eq!(
        app.store
            .api()
            .authorization()
            .unwrap()
            .to_str()
            .unwrap(),
        "Bearer jwt-token"
    );
}
