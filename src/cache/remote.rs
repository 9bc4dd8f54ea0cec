//! Remote Cache Module
//!
//! Pass-through cache over a Redis-compatible store. Every operation is one
//! round trip; nothing is cached locally.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult};
use tracing::{error, info};

use crate::cache::{CacheClient, HashFields};
use crate::error::Result;
use crate::lazy::LazyInit;

// == Set Options ==
/// Options sent with a remote SET.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expire after this many seconds (`EX`)
    pub expire_seconds: Option<u64>,
}

impl SetOptions {
    /// Only positive TTLs produce an expiry option.
    pub fn from_expires(expires: Option<u64>) -> Self {
        Self {
            expire_seconds: expires.filter(|secs| *secs > 0),
        }
    }
}

// == Key Value Store ==
/// Commands the remote cache issues against the store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> RedisResult<Option<String>>;
    async fn hget(&self, key: &str, field: &str) -> RedisResult<Option<String>>;
    async fn hgetall(&self, key: &str) -> RedisResult<HashFields>;
    async fn set(&self, key: &str, value: &str, options: SetOptions) -> RedisResult<()>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> RedisResult<()>;
    async fn del(&self, key: &str) -> RedisResult<()>;
}

#[async_trait]
impl KeyValueStore for ConnectionManager {
    async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.clone();
        AsyncCommands::get(&mut conn, key).await
    }

    async fn hget(&self, key: &str, field: &str) -> RedisResult<Option<String>> {
        let mut conn = self.clone();
        AsyncCommands::hget(&mut conn, key, field).await
    }

    async fn hgetall(&self, key: &str) -> RedisResult<HashFields> {
        let mut conn = self.clone();
        let fields: Vec<(String, String)> = AsyncCommands::hgetall(&mut conn, key).await?;
        Ok(fields.into_iter().collect())
    }

    async fn set(&self, key: &str, value: &str, options: SetOptions) -> RedisResult<()> {
        let mut conn = self.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(secs) = options.expire_seconds {
            cmd.arg("EX").arg(secs);
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> RedisResult<()> {
        let mut conn = self.clone();
        let _: () = AsyncCommands::hset(&mut conn, key, field, value).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> RedisResult<()> {
        let mut conn = self.clone();
        let _: () = AsyncCommands::del(&mut conn, key).await?;
        Ok(())
    }
}

// == Redis Registry ==
/// Shared Redis connections, one per connection URL.
///
/// Pass the registry to whoever builds remote caches; connections are opened
/// on first use and reused afterwards.
#[derive(Default)]
pub struct RedisRegistry {
    connections: LazyInit<ConnectionManager>,
}

impl RedisRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the connection for `url`, opening it if needed.
    ///
    /// Connection failures are logged and returned; they are not memoized.
    pub async fn connect(&self, url: &str) -> Result<ConnectionManager> {
        let manager = self
            .connections
            .get_or_try_init(url, || async {
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                info!("Connected to remote store");
                Ok::<_, RedisError>(manager)
            })
            .await
            .inspect_err(|err| error!(error = %err, "Redis Client Error"))?;

        Ok(manager)
    }

    /// Drops every memoized connection.
    pub async fn reset(&self) {
        self.connections.reset().await;
    }

    /// True once a connection for `url` has been established.
    pub async fn is_connected(&self, url: &str) -> bool {
        self.connections.is_initialized(url).await
    }
}

// == Remote Cache ==
/// Cache backed by a remote key-value store.
///
/// Scalar values live under plain string keys and hash fields under native
/// hashes, so the two addressing modes should not be mixed on one key.
/// Store failures are logged and returned unchanged.
pub struct RemoteCache<S = ConnectionManager> {
    store: S,
}

impl RemoteCache<ConnectionManager> {
    /// Builds a cache over the registry's connection for `url`.
    pub async fn connect(registry: &RedisRegistry, url: &str) -> Result<Self> {
        Ok(Self::new(registry.connect(url).await?))
    }
}

impl<S: KeyValueStore> RemoteCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store client.
    pub fn store(&self) -> &S {
        &self.store
    }
}

fn log_transport<'a>(op: &'static str, key: &'a str) -> impl Fn(&RedisError) + 'a {
    move |err| error!(op, key = %key, error = %err, "Remote store command failed")
}

#[async_trait]
impl<S: KeyValueStore> CacheClient for RemoteCache<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get(key)
            .await
            .inspect_err(log_transport("GET", key))?)
    }

    async fn get_item(&self, key: &str, field: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .hget(key, field)
            .await
            .inspect_err(log_transport("HGET", key))?)
    }

    async fn get_items(&self, key: &str) -> Result<Option<HashFields>> {
        let items = self
            .store
            .hgetall(key)
            .await
            .inspect_err(log_transport("HGETALL", key))?;

        // HGETALL answers an empty hash for missing keys.
        Ok(Some(items).filter(|items| !items.is_empty()))
    }

    async fn set(&self, key: &str, value: &str, expires: Option<u64>) -> Result<()> {
        self.store
            .set(key, value, SetOptions::from_expires(expires))
            .await
            .inspect_err(log_transport("SET", key))?;
        Ok(())
    }

    async fn set_item(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.store
            .hset(key, field, value)
            .await
            .inspect_err(log_transport("HSET", key))?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.store
            .del(key)
            .await
            .inspect_err(log_transport("DEL", key))?;
        Ok(())
    }
}
