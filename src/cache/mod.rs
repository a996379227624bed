//! Room snapshot cache abstraction.
//!
//! The cache lets room state outlive a process and be shared between
//! instances. It is optional: [`Cache`] wraps whichever [`RoomCache`] was
//! selected at startup and swallows every backend failure, so callers always
//! see a hit, a miss, or a no-op.

use crate::config::CacheConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod noop;
pub mod valkey;

pub use memory::MemoryCache;
pub use noop::NoOpCache;
pub use valkey::ValkeyCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

/// A room snapshot as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRoom {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ver: u64,
    /// Unix timestamp (seconds) of the last read or write.
    #[serde(default)]
    pub last_access: f64,
}

impl CachedRoom {
    pub fn new(text: impl Into<String>, ver: u64) -> Self {
        Self {
            text: text.into(),
            ver,
            last_access: unix_now(),
        }
    }
}

/// Storage key for a room.
pub fn room_key(room: &str) -> String {
    format!("room:{room}")
}

/// Current wall-clock time as fractional unix seconds.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[async_trait]
pub trait RoomCache: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch a snapshot, `None` when absent or expired.
    async fn read(&self, room: &str) -> Result<Option<CachedRoom>, CacheError>;

    /// Store a snapshot and (re)set its time-to-live to the retention window.
    async fn write(&self, room: &str, text: &str, ver: u64) -> Result<(), CacheError>;

    /// Refresh last-access and time-to-live without changing content.
    /// Absent entries stay absent.
    async fn touch(&self, room: &str) -> Result<(), CacheError>;
}

/// Infallible handle over the configured backend.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn RoomCache>,
}

impl Cache {
    pub fn new(backend: Arc<dyn RoomCache>) -> Self {
        Self { backend }
    }

    /// A cache that stores nothing.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoOpCache))
    }

    /// Build the cache described by `config`.
    ///
    /// An unreachable backend degrades to [`Cache::disabled`] rather than
    /// failing startup.
    pub async fn from_config(config: &CacheConfig, ttl: Duration) -> Self {
        if !config.enabled {
            tracing::info!("Cache disabled, running memory-only");
            return Self::disabled();
        }
        match ValkeyCache::connect(&config.url, ttl, config.timeout()).await {
            Ok(backend) => {
                tracing::info!(ttl_secs = ttl.as_secs(), "Connected to cache backend");
                Self::new(Arc::new(backend))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache unavailable, running memory-only");
                crate::metrics::record_cache_error("connect");
                Self::disabled()
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Read a snapshot; backend failures are logged and reported as a miss.
    pub async fn read(&self, room: &str) -> Option<CachedRoom> {
        match self.backend.read(room).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(room = %room, error = %e, "Cache read failed");
                crate::metrics::record_cache_error("read");
                None
            }
        }
    }

    /// Write a snapshot; backend failures are logged and ignored.
    pub async fn write(&self, room: &str, text: &str, ver: u64) {
        if let Err(e) = self.backend.write(room, text, ver).await {
            tracing::warn!(room = %room, ver, error = %e, "Cache write failed");
            crate::metrics::record_cache_error("write");
        }
    }

    /// Refresh a snapshot's TTL; backend failures are logged and ignored.
    pub async fn touch(&self, room: &str) {
        if let Err(e) = self.backend.touch(room).await {
            tracing::warn!(room = %room, error = %e, "Cache access update failed");
            crate::metrics::record_cache_error("touch");
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.name())
            .finish()
    }
}
