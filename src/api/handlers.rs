//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::cache::{CacheClient, FileCache, RedisRegistry, RemoteCache};
use crate::config::{CacheBackendConfig, Config};
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetItemResponse, GetItemsResponse, GetResponse, HealthResponse,
    SessionRequest, SessionResponse, SessionWrittenResponse, SetItemRequest, SetRequest,
    SetResponse,
};
use crate::session::{CookieSettings, SessionStorage};

/// Application state shared across all handlers.
///
/// Holds the configured cache backend and the session storage built on it.
#[derive(Clone)]
pub struct AppState {
    /// Selected cache backend
    pub cache: Arc<dyn CacheClient>,
    /// Session storage over the same backend
    pub sessions: SessionStorage,
}

impl AppState {
    /// Creates a new AppState over the given cache backend.
    pub fn new(cache: Arc<dyn CacheClient>, cookie: CookieSettings) -> Self {
        let sessions = SessionStorage::new(cache.clone(), cookie);
        Self { cache, sessions }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the file cache or connects to the remote store, depending on the
    /// configured backend.
    pub async fn from_config(config: &Config, registry: &RedisRegistry) -> Result<Self> {
        let cache: Arc<dyn CacheClient> = match &config.backend {
            CacheBackendConfig::File { path } => {
                info!(path = %path.display(), "Using file cache");
                Arc::new(FileCache::open(path).await)
            }
            CacheBackendConfig::Redis { url } => {
                info!("Using remote cache");
                Arc::new(RemoteCache::connect(registry, url).await?)
            }
        };

        Ok(Self::new(cache, config.cookie.clone()))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(&req.key, &req.value, req.ttl).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.cache.del(&key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for PUT /hset
pub async fn set_item_handler(
    State(state): State<AppState>,
    Json(req): Json<SetItemRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set_item(&req.key, &req.field, &req.value).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /hget/:key/:field
pub async fn get_item_handler(
    State(state): State<AppState>,
    Path((key, field)): Path<(String, String)>,
) -> Result<Json<GetItemResponse>> {
    let value = state
        .cache
        .get_item(&key, &field)
        .await?
        .ok_or_else(|| CacheError::NotFound(format!("{}/{}", key, field)))?;

    Ok(Json(GetItemResponse { key, field, value }))
}

/// Handler for GET /hgetall/:key
pub async fn get_items_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetItemsResponse>> {
    let items = state
        .cache
        .get_items(&key)
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetItemsResponse { key, items }))
}

/// Handler for POST /sessions
///
/// The session expires after the cookie's max age.
pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionWrittenResponse>> {
    let expires = state.sessions.cookie().expires_at(Utc::now());
    let id = state.sessions.create_data(&req.data, Some(expires)).await?;

    Ok(Json(SessionWrittenResponse { id, expires }))
}

/// Handler for GET /sessions/:id
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let data = state
        .sessions
        .read_data(&id)
        .await?
        .ok_or_else(|| CacheError::NotFound(format!("session {}", id)))?;

    Ok(Json(SessionResponse { id, data }))
}

/// Handler for PUT /sessions/:id
///
/// Overwrites the payload and renews the expiry.
pub async fn update_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionWrittenResponse>> {
    let expires = state.sessions.cookie().expires_at(Utc::now());
    state
        .sessions
        .update_data(&id, &req.data, Some(expires))
        .await?;

    Ok(Json(SessionWrittenResponse { id, expires }))
}

/// Handler for DELETE /sessions/:id
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.sessions.delete_data(&id).await?;

    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn test_state(dir: &TempDir) -> AppState {
        let cache = FileCache::open(dir.path().join("cache.json")).await;
        AppState::new(Arc::new(cache), CookieSettings::default())
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;

        let req = SetRequest {
            key: "test_key".to_string(),
            value: "test_value".to_string(),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let result = get_handler(State(state.clone()), Path("test_key".to_string())).await;
        let response = result.unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;

        let req = SetRequest {
            key: "to_delete".to_string(),
            value: "value".to_string(),
            ttl: None,
        };
        let set = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(set.key, "to_delete");

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_err());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_ok(), "deleting an absent key succeeds");
    }

    #[tokio::test]
    async fn test_hash_handlers() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;

        for (field, value) in [("f1", "a"), ("f2", "b")] {
            let req = SetItemRequest {
                key: "h".to_string(),
                field: field.to_string(),
                value: value.to_string(),
            };
            let set = set_item_handler(State(state.clone()), Json(req))
                .await
                .unwrap();
            assert_eq!(set.key, "h");
        }

        let item = get_item_handler(
            State(state.clone()),
            Path(("h".to_string(), "f2".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(item.value, "b");

        let items = get_items_handler(State(state.clone()), Path("h".to_string()))
            .await
            .unwrap();
        assert_eq!(items.items.len(), 2);

        let missing = get_item_handler(
            State(state),
            Path(("h".to_string(), "missing".to_string())),
        )
        .await;
        assert!(matches!(missing, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_session_handlers() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;

        let created = create_session_handler(
            State(state.clone()),
            Json(SessionRequest {
                data: json!({"user": "ada"}),
            }),
        )
        .await
        .unwrap();
        let id = created.id.clone();

        let read = get_session_handler(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(read.data, json!({"user": "ada"}));

        let updated = update_session_handler(
            State(state.clone()),
            Path(id.clone()),
            Json(SessionRequest {
                data: json!({"user": "grace"}),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.id, id);

        let deleted = delete_session_handler(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(deleted.key, id);
        let gone = get_session_handler(State(state), Path(id)).await;
        assert!(matches!(gone, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;

        let req = SetRequest {
            key: "".to_string(),
            value: "value".to_string(),
            ttl: None,
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
