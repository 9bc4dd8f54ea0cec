//! Cache Module
//!
//! The [`CacheClient`] contract and its two backends: a durable file-backed
//! cache and a remote Redis-backed cache.

mod entry;
mod file;
mod remote;


use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, Clock, ManualClock, SystemClock};
pub use file::FileCache;
pub use remote::{KeyValueStore, RedisRegistry, RemoteCache, SetOptions};

/// Field name to value mapping stored under a single key, in field order.
pub type HashFields = IndexMap<String, String>;

// == Cache Client ==
/// Operations every cache backend supports.
///
/// Read operations on the file backend never fail; parse failures of stored
/// hashes are logged and reported as `None`. The remote backend returns
/// [`CacheError::Transport`](crate::error::CacheError::Transport) for any
/// client failure.
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Raw value at `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Single field of the hash stored at `key`.
    async fn get_item(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// All fields of the hash stored at `key`.
    async fn get_items(&self, key: &str) -> Result<Option<HashFields>>;

    /// Stores `value` at `key`.
    ///
    /// A positive `expires` sets the entry to expire that many seconds from
    /// now. Otherwise the entry never expires and any previous expiry on the
    /// key is cleared.
    async fn set(&self, key: &str, value: &str, expires: Option<u64>) -> Result<()>;

    /// Sets one field of the hash stored at `key`, creating the hash if needed.
    ///
    /// Note: the file backend rewrites the whole hash through [`set`](Self::set)
    /// without a TTL, so any expiry previously set on `key` is dropped.
    async fn set_item(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Removes `key`. Absent keys are a no-op.
    async fn del(&self, key: &str) -> Result<()>;
}
