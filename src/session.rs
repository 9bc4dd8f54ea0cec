//! Session Storage
//!
//! Stores session payloads in any [`CacheClient`] under `session:<id>`, with a
//! TTL derived from the session cookie's absolute expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::CacheClient;
use crate::error::Result;

/// Number of random bytes in a session id.
const SESSION_ID_BYTES: usize = 8;

// == Cookie Settings ==
/// SameSite attribute of the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Session cookie configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub http_only: bool,
    /// Lifetime in seconds
    pub max_age: u64,
    pub path: String,
    pub same_site: SameSite,
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: "__session".to_string(),
            http_only: true,
            max_age: 28800,
            path: "/".to_string(),
            same_site: SameSite::Lax,
            secure: true,
        }
    }
}

impl CookieSettings {
    /// Absolute expiry of a cookie issued at `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.max_age.min(i32::MAX as u64) as i64)
    }
}

// == Session Storage ==
/// Session data store on top of a cache backend.
#[derive(Clone)]
pub struct SessionStorage {
    cache: Arc<dyn CacheClient>,
    cookie: CookieSettings,
}

impl SessionStorage {
    pub fn new(cache: Arc<dyn CacheClient>, cookie: CookieSettings) -> Self {
        Self { cache, cookie }
    }

    pub fn cookie(&self) -> &CookieSettings {
        &self.cookie
    }

    /// Stores `data` under a fresh random id and returns the id.
    pub async fn create_data(
        &self,
        data: &Value,
        expires: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let id = generate_session_id();
        self.write(&id, data, expires).await?;
        debug!(session_id = %id, "Session created");
        Ok(id)
    }

    /// Reads the payload for `id`, `None` if absent or unreadable.
    pub async fn read_data(&self, id: &str) -> Result<Option<Value>> {
        let Some(raw) = self.cache.get(&cache_key(id)).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(data) => Ok(Some(data)),
            Err(err) => {
                warn!(session_id = %id, error = %err, "Discarding unreadable session data");
                Ok(None)
            }
        }
    }

    /// Overwrites the payload for `id`.
    pub async fn update_data(
        &self,
        id: &str,
        data: &Value,
        expires: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.write(id, data, expires).await
    }

    pub async fn delete_data(&self, id: &str) -> Result<()> {
        self.cache.del(&cache_key(id)).await
    }

    async fn write(&self, id: &str, data: &Value, expires: Option<DateTime<Utc>>) -> Result<()> {
        let raw = serde_json::to_string(data)?;
        let ttl = expires.map(|at| expiry_seconds(at, Utc::now()));
        self.cache.set(&cache_key(id), &raw, ttl).await
    }
}

fn cache_key(id: &str) -> String {
    format!("session:{}", id)
}

/// Random session id rendered as lowercase hex.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whole seconds from `now` until `expires`, rounded up.
///
/// An expiry at or before `now` yields 1 so the entry lapses almost at once
/// instead of being stored without TTL.
pub fn expiry_seconds(expires: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (expires - now).num_milliseconds();
    if millis <= 0 {
        return 1;
    }
    (millis as u64).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileCache, HashFields};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Cache double that records `set` calls.
    #[derive(Default)]
    struct RecordingCache {
        sets: Mutex<Vec<(String, String, Option<u64>)>>,
        value: Mutex<Option<String>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CacheClient for RecordingCache {
        async fn get(&self, _: &str) -> Result<Option<String>> {
            Ok(self.value.lock().unwrap().clone())
        }
        async fn get_item(&self, _: &str, _: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn get_items(&self, _: &str) -> Result<Option<HashFields>> {
            Ok(None)
        }
        async fn set(&self, key: &str, value: &str, expires: Option<u64>) -> Result<()> {
            self.sets
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string(), expires));
            Ok(())
        }
        async fn set_item(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn del(&self, key: &str) -> Result<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    fn storage_over(cache: Arc<RecordingCache>) -> SessionStorage {
        SessionStorage::new(cache, CookieSettings::default())
    }

    #[test]
    fn test_expiry_seconds_rounds_up() {
        let now = Utc::now();

        assert_eq!(expiry_seconds(now + Duration::seconds(120), now), 120);
        assert_eq!(expiry_seconds(now + Duration::milliseconds(1500), now), 2);
        assert_eq!(expiry_seconds(now + Duration::milliseconds(1), now), 1);
        assert_eq!(expiry_seconds(now - Duration::seconds(5), now), 1);
    }

    #[test]
    fn test_session_id_is_hex() {
        let id = generate_session_id();

        assert_eq!(id.len(), SESSION_ID_BYTES * 2);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_session_id());
    }

    #[test]
    fn test_cookie_defaults() {
        let cookie = CookieSettings::default();
        let now = Utc::now();

        assert_eq!(cookie.name, "__session");
        assert!(cookie.http_only && cookie.secure);
        assert_eq!(cookie.same_site, SameSite::Lax);
        assert_eq!(cookie.expires_at(now) - now, Duration::seconds(28800));
    }

    #[tokio::test]
    async fn test_create_without_expiry() {
        let cache = Arc::new(RecordingCache::default());
        let storage = storage_over(cache.clone());
        let data = json!({"one": 1});

        let id = storage.create_data(&data, None).await.unwrap();

        let sets = cache.sets.lock().unwrap().clone();
        assert_eq!(
            sets,
            vec![(format!("session:{}", id), data.to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_update_with_expiry() {
        let cache = Arc::new(RecordingCache::default());
        let storage = storage_over(cache.clone());
        let data = json!({"key": "new"});
        // Slack keeps the rounded TTL at 120 despite test latency.
        let expires = Utc::now() + Duration::milliseconds(120_000 - 500);

        storage.update_data("654", &data, Some(expires)).await.unwrap();

        let sets = cache.sets.lock().unwrap().clone();
        assert_eq!(
            sets,
            vec![("session:654".to_string(), data.to_string(), Some(120))]
        );
    }

    #[tokio::test]
    async fn test_read_and_delete() {
        let cache = Arc::new(RecordingCache::default());
        let storage = storage_over(cache.clone());

        assert!(storage.read_data("456").await.unwrap().is_none());

        *cache.value.lock().unwrap() = Some(r#"{"key":"value"}"#.to_string());
        assert_eq!(
            storage.read_data("321").await.unwrap(),
            Some(json!({"key": "value"}))
        );

        *cache.value.lock().unwrap() = Some("{corrupt".to_string());
        assert!(storage.read_data("321").await.unwrap().is_none());

        storage.delete_data("123").await.unwrap();
        assert_eq!(
            cache.deleted.lock().unwrap().clone(),
            vec!["session:123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_over_file_cache() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(FileCache::open(dir.path().join("sessions.json")).await);
        let storage = SessionStorage::new(cache, CookieSettings::default());
        let future = Utc::now() + Duration::hours(1);

        let id = storage.create_data(&json!({"a": 1}), None).await.unwrap();
        assert_eq!(storage.read_data(&id).await.unwrap(), Some(json!({"a": 1})));

        storage
            .update_data(&id, &json!({"a": 2}), Some(future))
            .await
            .unwrap();
        assert_eq!(storage.read_data(&id).await.unwrap(), Some(json!({"a": 2})));

        storage.delete_data(&id).await.unwrap();
        assert!(storage.read_data(&id).await.unwrap().is_none());
    }
}
