//! Error types for the console cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Error type surfaced by the public cache API and the HTTP layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Parameter code not found in any tier and not fetchable
    #[error("Parameter not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No default parameter pool has been installed
    #[error("Default parameter cache is not installed")]
    Uninitialized,

    /// The view session task has stopped
    #[error("View session closed")]
    SessionClosed,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Store Error Enum ==
/// Failures of the persistent key-value store.
///
/// These never leave the parameter cache: they are logged and treated as a
/// miss or a no-op.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage quota exceeded: {used} of {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

// == Remote Error Enum ==
/// Failures of the remote parameter service.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned status {status} for '{code}'")]
    Status { code: String, status: u16 },

    #[error("Remote has no parameter '{0}'")]
    Missing(String),

    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Uninitialized | CacheError::SessionClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the console cache.
pub type Result<T> = std::result::Result<T, CacheError>;
