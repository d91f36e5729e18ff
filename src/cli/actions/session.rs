use crate::{app::App, session::Credentials};
use anyhow::Result;
use secrecy::SecretString;
use serde_json::Value;

/// # Errors
/// Returns the server-provided message when the login is rejected.
pub async fn login(
    app: &App,
    username: String,
    password: SecretString,
    remember_me: bool,
) -> Result<()> {
    let credentials = Credentials::new(username, password, remember_me);
    app.store.login(&credentials).await?;

    let name = app
        .store
        .user()
        .await
        .as_ref()
        .and_then(|user| user.get("username"))
        .and_then(Value::as_str)
        .map_or_else(|| credentials.username.clone(), str::to_string);
    println!("Signed in as {name}");
    if !remember_me {
        println!("Session not remembered; it ends with this process.");
    }

    Ok(())
}

/// # Errors
/// Returns an error if the navigation to the login page fails.
pub async fn logout(app: &mut App) -> Result<()> {
    app.store.ensure_initialized().await;
    for outcome in app.logout().await {
        outcome?;
    }
    println!("Signed out");
    Ok(())
}

/// # Errors
/// Returns an error if the user profile cannot be rendered.
pub async fn status(app: &App) -> Result<()> {
    app.store.ensure_initialized().await;
    let snapshot = app.store.snapshot().await;

    if snapshot.is_authenticated() {
        println!("Signed in");
        if let Some(user) = &snapshot.user {
            println!("{}", serde_json::to_string_pretty(user)?);
        }
    } else {
        println!("Signed out");
    }

    Ok(())
}
