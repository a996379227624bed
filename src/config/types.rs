//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{default_cache_timeout_ms, default_cache_url, default_listen};
use super::limits::LimitsConfig;
use super::retention::RetentionConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level pad server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Listener and public address settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Optional external cache for room snapshots.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Size, connection and rate limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Room retention and sweeper cadence.
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` when given (defaults otherwise), then apply the
    /// process environment on top.
    pub fn resolve<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to (default: 0.0.0.0:8000).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Base URL returned by `POST /` (e.g. "https://pad.example.org").
    /// Derived from the request's Host header when unset.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Prometheus endpoint port; 0 disables it.
    #[serde(default)]
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            public_url: None,
            metrics_port: 0,
        }
    }
}

/// Cache backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether room snapshots are mirrored to the external store.
    #[serde(default)]
    pub enabled: bool,
    /// Connection string, e.g. "redis://localhost:6379/0".
    #[serde(default = "default_cache_url")]
    pub url: String,
    /// Upper bound on connecting and on each backend call, in milliseconds.
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

impl CacheConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_cache_url(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}
