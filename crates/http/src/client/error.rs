//! Client error types

use dashboard_core::CoreError;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error, including timeouts
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed on a protected call
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Login or registration was rejected
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The session could not be recovered; the user has to log in again
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input rejected before any request was sent
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Credential storage failed
    #[error("Credential storage error: {0}")]
    Storage(#[from] CoreError),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Create error from a status and the raw response body.
    ///
    /// The backend reports errors as `{"code": 400, "message": "..."}`; the
    /// `message` field is used when present, the raw body otherwise.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        Self::from_status(status, error_message(status, body))
    }

    /// Whether the caller has to re-authenticate
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AuthenticationFailed(_))
    }

    /// Whether the input was rejected (client-side or HTTP 400)
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::BadRequest(_))
    }

    /// Whether this is a network, timeout or 5xx failure
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(err) if err.is_timeout())
    }

    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            Self::ServerError { status, .. } => Some(*status),
            Self::AuthenticationFailed(_) | Self::InvalidCredentials(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Forbidden(_) => Some(403),
            _ => None,
        }
    }

    /// Short message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::InvalidCredentials(message) => message.clone(),
            Self::BadRequest(_) => "Invalid information, please check and try again".to_string(),
            Self::SessionExpired | Self::AuthenticationFailed(_) => {
                "Your session has expired. Please log in again.".to_string()
            }
            Self::Forbidden(_) => "You do not have permission to do that".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::Request(_) | Self::ServerError { .. } => "Server error".to_string(),
            Self::Serialization(_) | Self::Configuration(_) | Self::Storage(_) => self.to_string(),
        }
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        None => body.trim().to_string(),
    }
}
