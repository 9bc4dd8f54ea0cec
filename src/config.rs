//! Configuration Module
//!
//! Reads configuration from environment variables. [`EnvConfig`] is the raw
//! string-keyed lookup; [`Config`] is the typed view the server starts from.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::session::CookieSettings;

// == Env Config ==
/// Snapshot of string-keyed configuration values.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    vars: HashMap<String, String>,
}

impl EnvConfig {
    /// Captures the current process environment.
    pub fn from_env() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    /// Builds a lookup from explicit key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value at `key`, falling back to `default`.
    ///
    /// Fails with [`ConfigError::Missing`] when the key is absent and no
    /// default is given. A present but empty value is returned as-is.
    pub fn get(&self, key: &str, default: Option<&str>) -> Result<String, ConfigError> {
        match (self.vars.get(key), default) {
            (Some(value), _) => Ok(value.clone()),
            (None, Some(default)) => Ok(default.to_string()),
            (None, None) => Err(ConfigError::Missing(key.to_string())),
        }
    }

    /// True when `key` is present with a non-empty value.
    pub fn has(&self, key: &str) -> bool {
        self.vars.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Comma-separated list at `key`, each item trimmed.
    pub fn list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        self.list_with(key, ',')
    }

    /// List at `key` split on `delimiter`, each item trimmed.
    pub fn list_with(&self, key: &str, delimiter: char) -> Result<Vec<String>, ConfigError> {
        let raw = self.get(key, None)?;
        Ok(raw.split(delimiter).map(|i| i.trim().to_string()).collect())
    }

    /// Parses the value at `key`, using `default` when the key is absent.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.vars.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

// == Backend Selection ==
/// Which cache implementation the server is wired to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackendConfig {
    /// Durable file-backed cache at the given path
    File { path: PathBuf },
    /// Remote Redis-compatible store at the given URL
    Redis { url: String },
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache backend and its connection target
    pub backend: CacheBackendConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Log filter used when RUST_LOG is not set
    pub log_level: String,
    /// CORS origins; empty means any origin
    pub allowed_origins: Vec<String>,
    /// Session cookie settings
    pub cookie: CookieSettings,
}

impl Config {
    /// Loads the typed configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&EnvConfig::from_env())
    }

    /// Resolves the typed configuration from a lookup.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `file` or `redis` (default: file)
    /// - `APP_CACHE_FILE` - cache file path, required for the file backend
    /// - `REDIS_URL` - connection URL, required for the redis backend
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `LOG_LEVEL` - log filter (default: info)
    /// - `ALLOWED_ORIGINS` - comma-separated CORS origins (default: any)
    /// - `SESSION_COOKIE_NAME`, `SESSION_MAX_AGE`, `SESSION_SECURE` - cookie overrides
    pub fn load(env: &EnvConfig) -> Result<Self, ConfigError> {
        let backend = match env.get("CACHE_BACKEND", Some("file"))?.as_str() {
            "file" => CacheBackendConfig::File {
                path: PathBuf::from(env.get("APP_CACHE_FILE", None)?),
            },
            "redis" => CacheBackendConfig::Redis {
                url: env.get("REDIS_URL", None)?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "CACHE_BACKEND".to_string(),
                    reason: format!("unknown backend '{}'", other),
                })
            }
        };

        let allowed_origins = if env.has("ALLOWED_ORIGINS") {
            env.list("ALLOWED_ORIGINS")?
                .into_iter()
                .filter(|o| !o.is_empty())
                .collect()
        } else {
            Vec::new()
        };

        let defaults = CookieSettings::default();
        let cookie = CookieSettings {
            name: env.get("SESSION_COOKIE_NAME", Some(defaults.name.as_str()))?,
            max_age: env.parse_or("SESSION_MAX_AGE", defaults.max_age)?,
            secure: env.parse_or("SESSION_SECURE", defaults.secure)?,
            ..defaults
        };

        Ok(Self {
            backend,
            server_port: env.parse_or("SERVER_PORT", 3000)?,
            log_level: env.get("LOG_LEVEL", Some("info"))?,
            allowed_origins,
            cookie,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CacheBackendConfig::File {
                path: PathBuf::from("cache.json"),
            },
            server_port: 3000,
            log_level: "info".to_string(),
            allowed_origins: Vec::new(),
            cookie: CookieSettings::default(),
        }
    }
}
