//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer and its HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing store could not be reached or rejected the command
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store operation exceeded the configured timeout
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Value could not be encoded or decoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Logical key is empty or too long
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Namespace label contains forbidden characters
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Key pattern rejected for introspection
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Key or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// True for failures of the backing store itself (network, timeout).
    pub fn is_store_failure(&self) -> bool {
        matches!(self, CacheError::Unavailable(_) | CacheError::Timeout(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Admin Error ==
/// Failure of an administrative cache endpoint.
///
/// The client only ever sees `message`; the underlying error is logged.
#[derive(Debug)]
pub struct AdminError {
    pub message: &'static str,
    pub source: CacheError,
}

impl AdminError {
    pub fn new(message: &'static str, source: CacheError) -> Self {
        Self { message, source }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match &self.source {
            CacheError::NotFound(key) => {
                let body = Json(json!({ "error": format!("Key not found: {}", key) }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }
            CacheError::InvalidRequest(msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            _ => {}
        }

        tracing::error!(error = %self.source, "{}", self.message);
        let body = Json(json!({ "error": self.message }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
