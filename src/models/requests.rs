//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds (never expires if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Request body for the hash field SET operation (PUT /hset)
#[derive(Debug, Clone, Deserialize)]
pub struct SetItemRequest {
    pub key: String,
    pub field: String,
    pub value: String,
}

impl SetItemRequest {
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.field.is_empty() {
            return Some("Field cannot be empty".to_string());
        }
        None
    }
}

/// Request body for creating or updating a session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRequest {
    /// Arbitrary JSON session payload
    pub data: Value,
}
