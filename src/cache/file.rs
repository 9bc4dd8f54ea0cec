//! File Cache Module
//!
//! In-process cache persisted to a single JSON file after every mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::cache::{CacheClient, CacheEntry, Clock, HashFields, SystemClock};
use crate::error::Result;

/// Entries in insertion order. On disk they are a `[key, entry]` pair array.
type Entries = IndexMap<String, CacheEntry>;

// == File Cache ==
/// Durable cache backed by a flat JSON file.
///
/// The whole store is rewritten to `path` after each `set`, `set_item` and
/// successful `del`. Write failures are logged and never returned; the
/// in-memory state stays authoritative until restart.
#[derive(Debug)]
pub struct FileCache {
    /// Target file
    path: PathBuf,
    /// Entries in insertion order
    entries: Mutex<Entries>,
    /// Time source for expiry
    clock: Arc<dyn Clock>,
}

impl FileCache {
    // == Constructor ==
    /// Opens the cache at `path`, loading any previously persisted state.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_clock(path, Arc::new(SystemClock)).await
    }

    /// Opens the cache at `path` using the given time source.
    pub async fn open_with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).await;
        debug!(path = %path.display(), entries = entries.len(), "File cache loaded");

        Self {
            path,
            entries: Mutex::new(entries),
            clock,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries held, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True if no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    // == Locked Operations ==
    // Callers hold the store lock for the whole read-modify-persist sequence.

    async fn get_locked(&self, entries: &mut Entries, key: &str) -> Option<String> {
        let entry = entries.get(key)?;

        if entry.is_expired(self.clock.now_ms()) {
            debug!(key = %key, "Entry expired");
            entries.shift_remove(key);
            persist(&self.path, entries).await;
            return None;
        }

        Some(entry.value.clone())
    }

    async fn set_locked(
        &self,
        entries: &mut Entries,
        key: &str,
        value: &str,
        expires: Option<u64>,
    ) {
        let entry = CacheEntry::new(value.to_string(), expires, self.clock.now_ms());

        // Overwriting keeps the key's original position.
        entries.insert(key.to_string(), entry);

        persist(&self.path, entries).await;
    }

    async fn get_items_locked(&self, entries: &mut Entries, key: &str) -> Option<HashFields> {
        let raw = self.get_locked(entries, key).await?;

        match serde_json::from_str::<HashFields>(&raw) {
            Ok(items) => Some(items),
            Err(err) => {
                error!(key = %key, error = %err, "Failed to load cache items");
                None
            }
        }
    }
}

#[async_trait]
impl CacheClient for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        Ok(self.get_locked(&mut entries, key).await)
    }

    async fn get_item(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        let items = self.get_items_locked(&mut entries, key).await;

        Ok(items.and_then(|mut items| items.shift_remove(field)))
    }

    async fn get_items(&self, key: &str) -> Result<Option<HashFields>> {
        let mut entries = self.entries.lock().await;
        Ok(self.get_items_locked(&mut entries, key).await)
    }

    async fn set(&self, key: &str, value: &str, expires: Option<u64>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        self.set_locked(&mut entries, key, value, expires).await;
        Ok(())
    }

    async fn set_item(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;

        let mut items = self
            .get_items_locked(&mut entries, key)
            .await
            .unwrap_or_default();
        items.insert(field.to_string(), value.to_string());

        let raw = serde_json::to_string(&items)?;
        // Written without TTL: an existing expiry on `key` is dropped.
        self.set_locked(&mut entries, key, &raw, None).await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;

        if entries.shift_remove(key).is_some() {
            persist(&self.path, &entries).await;
        }

        Ok(())
    }
}

// == Persistence ==

/// Reads persisted entries, falling back to an empty store on any failure.
///
/// A key listed more than once takes its last entry, kept at the position of
/// its first occurrence.
async fn load_entries(path: &Path) -> Entries {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            error!(path = %path.display(), "Cache path is not a regular file");
            return Entries::new();
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "No cache file to load");
            return Entries::new();
        }
    }

    let loaded = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())
        .and_then(|data| {
            serde_json::from_str::<Vec<(String, CacheEntry)>>(&data).map_err(|e| e.to_string())
        });

    match loaded {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(err) => {
            error!(path = %path.display(), error = %err, "Failed to load cache data");
            Entries::new()
        }
    }
}

/// Overwrites `path` with the whole store. Failures are logged only.
async fn persist(path: &Path, entries: &Entries) {
    let pairs: Vec<_> = entries.iter().collect();
    let data = match serde_json::to_string_pretty(&pairs) {
        Ok(data) => data,
        Err(err) => {
            error!(path = %path.display(), error = %err, "Failed to serialize cache data");
            return;
        }
    };

    if let Err(err) = tokio::fs::write(path, data).await {
        error!(path = %path.display(), error = %err, "Failed to write cache data");
    }
}
