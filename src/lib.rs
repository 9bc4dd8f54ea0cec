//! Cathays Cache - cache clients and session storage for web applications
//!
//! Provides a uniform cache contract with a durable file-backed backend and a
//! Redis-backed backend, session storage on top of it, and a small HTTP
//! service exposing both.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod lazy;
pub mod logging;
pub mod models;
pub mod session;

pub use api::AppState;
pub use cache::{CacheClient, FileCache, RedisRegistry, RemoteCache};
pub use config::{Config, EnvConfig};
pub use error::{CacheError, ConfigError, Result};
pub use session::{CookieSettings, SessionStorage};
