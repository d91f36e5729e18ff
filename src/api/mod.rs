//! HTTP helpers for the client's JSON APIs. Every request made through an
//! [`ApiClient`] carries the shared default headers, which is where the session
//! store publishes the `Authorization: Bearer` credential. Clones share the same
//! header map, so a token set by the store is seen by every other caller.
//! The helpers never log header values or request bodies.

mod errors;

pub use errors::ApiError;

use crate::{config::AppConfig, APP_USER_AGENT};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, Response,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument};
use url::Url;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    defaults: Arc<RwLock<HeaderMap>>,
}

impl ApiClient {
    /// Builds a client for the configured API host.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the underlying HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            defaults: Arc::new(RwLock::new(HeaderMap::new())),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets the default `Authorization: Bearer <token>` header.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the token is not a valid header value; the
    /// previous header is removed in that case.
    pub fn set_bearer(&self, token: &SecretString) -> Result<(), ApiError> {
        let mut defaults = self.defaults.write().unwrap_or_else(PoisonError::into_inner);
        match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                defaults.insert(AUTHORIZATION, value);
                Ok(())
            }
            Err(_) => {
                defaults.remove(AUTHORIZATION);
                Err(ApiError::Config(
                    "Token contains characters not allowed in a header.".to_string(),
                ))
            }
        }
    }

    /// Removes the default `Authorization` header.
    pub fn clear_bearer(&self) {
        self.defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(AUTHORIZATION);
    }

    /// Current default `Authorization` header, if set.
    #[must_use]
    pub fn authorization(&self) -> Option<HeaderValue> {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(AUTHORIZATION)
            .cloned()
    }

    /// Posts JSON and parses a JSON response.
    ///
    /// # Errors
    /// Returns an `ApiError` when the URL is invalid, the request fails, the
    /// server answers with a non-success status or the body does not decode.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.build_url(path)?;
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::Serialization(format!("Failed to encode request: {err}")))?;

        let response = self
            .client
            .post(url)
            .headers(self.default_headers())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }

    /// Fetches JSON with the default headers attached.
    ///
    /// # Errors
    /// Same conditions as [`ApiClient::post_json`].
    #[instrument(skip_all, fields(path = %path))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.build_url(path)?;
        let response = self
            .client
            .get(url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }

    fn default_headers(&self) -> HeaderMap {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn build_url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = build_url_with_base(&self.base_url, path);
        Url::parse(&raw).map_err(|err| {
            ApiError::Config(format!("API base URL is not configured or invalid: {err}"))
        })
    }
}

/// Joins a base URL and a path with exactly one slash between them.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")));
    }

    let body = response.text().await.unwrap_or_default();
    let server_message = extract_message(&body);
    debug!(status = status.as_u16(), "request failed");

    Err(ApiError::Http {
        status: status.as_u16(),
        message: sanitize_body(&body),
        server_message,
    })
}

/// Reads a non-empty `message` string out of a JSON error body.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

/// Trims and truncates an HTTP error body for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(base_url: &str) -> ApiClient {
        let config = AppConfig {
            api_base_url: base_url.to_string(),
            ..AppConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn build_url_with_base_joins_single_slash() {
        assert_eq!(
            build_url_with_base("http://api.local/", "/api/auth/login"),
            "http://api.local/api/auth/login"
        );
        assert_eq!(
            build_url_with_base(" http://api.local ", "api/auth/login"),
            "http://api.local/api/auth/login"
        );
        assert_eq!(build_url_with_base("", "/api"), "/api");
    }

    #[test]
    fn build_url_rejects_missing_base() {
        let client = client_for("");
        assert!(matches!(
            client.build_url("/api/auth/login"),
            Err(ApiError::Config(_))
        ));
    }

    #[test]
    fn sanitize_body_truncates_and_defaults() {
        assert_eq!(sanitize_body("   "), "Request failed.");
        assert_eq!(sanitize_body(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
    }

    #[test]
    fn extract_message_reads_json_message() {
        assert_eq!(
            extract_message(r#"{"message":"Invalid credentials"}"#),
            Some("Invalid credentials".to_string())
        );
        assert_eq!(extract_message(r#"{"message":"  "}"#), None);
        assert_eq!(extract_message("<html>oops</html>"), None);
    }

    #[test]
    fn bearer_header_is_shared_between_clones() {
        let client = client_for("http://api.local");
        let clone = client.clone();

        client
            .set_bearer(&SecretString::from("abc".to_string()))
            .unwrap();
        let value = clone.authorization().unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
        assert!(value.is_sensitive());

        clone.clear_bearer();
        assert!(client.authorization().is_none());
    }

    #[test]
    fn set_bearer_rejects_invalid_header_value() {
        let client = client_for("http://api.local");
        client
            .set_bearer(&SecretString::from("good".to_string()))
            .unwrap();
        let result = client.set_bearer(&SecretString::from("bad\ntoken".to_string()));
        assert!(matches!(result, Err(ApiError::Config(_))));
        assert!(client.authorization().is_none());
    }

    #[tokio::test]
    async fn get_json_sends_default_authorization() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/blog"))
            .and(header("Authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "posts": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        client
            .set_bearer(&SecretString::from("token-1".to_string()))
            .unwrap();
        let body: Value = client.get_json("/api/blog").await.unwrap();
        assert_eq!(body, json!({ "posts": [] }));
    }

    #[tokio::test]
    async fn post_json_surfaces_server_message() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client
            .post_json::<_, Value>("/api/auth/login", &json!({ "username": "u" }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.server_message(), Some("Invalid credentials"));
    }
}
