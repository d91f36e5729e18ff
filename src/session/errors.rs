use crate::api::ApiError;
use thiserror::Error;

/// Text shown when the server gives no reason for a failed login.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Login failed. Please check your credentials.";

/// A failed login. `message` is the user-facing text also stored as the
/// session error.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct LoginError {
    pub message: String,
    #[source]
    pub source: ApiError,
}

impl LoginError {
    pub(crate) fn from_api(source: ApiError) -> Self {
        let message = source
            .server_message()
            .map_or_else(|| LOGIN_FALLBACK_MESSAGE.to_string(), str::to_string);
        Self { message, source }
    }
}
