//! Login payloads and the read-only view of the session. These carry the
//! password and bearer token, so none of them may be logged.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub remember_me: bool,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString, remember_me: bool) -> Self {
        Self {
            username: username.into(),
            password,
            remember_me,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> LoginRequest<'a> {
    pub(crate) fn from_credentials(credentials: &'a Credentials) -> Self {
        Self {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Value,
}

/// Owned copy of the store state at one point in time.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub user: Option<Value>,
    pub token: Option<SecretString>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        token_present(self.token.as_ref())
    }
}

pub(crate) fn token_present(token: Option<&SecretString>) -> bool {
    token.is_some_and(|token| !token.expose_secret().is_empty())
}
