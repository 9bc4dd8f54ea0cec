//! Error types for the cache clients and the HTTP surface
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Config Error Enum ==
/// Errors raised while reading configuration from the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required key absent and no default supplied
    #[error("Configuration item {0} not found")]
    Missing(String),

    /// Key present but its value could not be interpreted
    #[error("Configuration item {key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

// == Cache Error Enum ==
/// Unified error type for cache operations and request handling.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failure reported by the remote key-value store client.
    /// Never produced by the file-backed cache.
    #[error("Remote store error: {0}")]
    Transport(#[from] redis::RedisError),

    /// Payload could not be encoded or decoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be resolved
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Transport(_) => StatusCode::BAD_GATEWAY,
            CacheError::Serialization(_) | CacheError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = CacheError::NotFound("k".to_string()).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = CacheError::InvalidRequest("bad".to_string()).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let transport: CacheError =
            redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into();
        assert_eq!(transport.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::Missing("APP_CACHE_FILE".to_string());
        assert_eq!(err.to_string(), "Configuration item APP_CACHE_FILE not found");
    }
}
