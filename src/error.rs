// Gateway Error Types
use serde_json::Value;
use thiserror::Error;

use crate::filter::FilterError;
use crate::storage::StorageError;

/// Every failure a data gateway can report, classified so the presentation
/// layer can decide what to do (show a message, send the user to login).
#[derive(Debug, Error)]
pub enum GatewayError {
    // Service answered with an error body
    #[error("{message}")]
    Remote { status: u16, message: String },

    // No signed-in principal for an operation that needs one
    #[error("User is not logged in")]
    Unauthenticated,

    // Legacy REST answered 401; the stored token has already been evicted
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid query: {0}")]
    Query(#[from] FilterError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GatewayError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        GatewayError::Remote { status, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        GatewayError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GatewayError::NotFound(message.into())
    }

    /// Build an error from a non-success response body. GoTrue and PostgREST
    /// disagree on field names, so try each in turn.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                ["msg", "message", "error_description", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("Request failed with status {}", status)
                } else {
                    body.trim().to_string()
                }
            });
        GatewayError::Remote { status, message }
    }

    /// HTTP status, when the failure came from the service
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Remote { status, .. } => Some(*status),
            GatewayError::Unauthorized(_) => Some(401),
            GatewayError::NotFound(_) => Some(404),
            GatewayError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Remote { .. } => "REMOTE_ERROR",
            GatewayError::Unauthenticated => "UNAUTHENTICATED",
            GatewayError::Unauthorized(_) => "UNAUTHORIZED",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::Unsupported(_) => "UNSUPPORTED",
            GatewayError::Transport(_) => "TRANSPORT_ERROR",
            GatewayError::Decode(_) => "DECODE_ERROR",
            GatewayError::Url(_) => "INVALID_URL",
            GatewayError::Query(_) => "INVALID_QUERY",
            GatewayError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// True when the caller should send the user to the login view
    pub fn requires_login(&self) -> bool {
        matches!(self, GatewayError::Unauthenticated | GatewayError::Unauthorized(_))
    }
}
