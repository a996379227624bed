//! No-op cache that stores nothing.
//!
//! Used when the cache is disabled or unreachable at startup.
//! All operations succeed; every read is a miss.

use super::{CacheError, CachedRoom, RoomCache};
use async_trait::async_trait;

pub struct NoOpCache;

#[async_trait]
impl RoomCache for NoOpCache {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn read(&self, _room: &str) -> Result<Option<CachedRoom>, CacheError> {
        Ok(None)
    }

    async fn write(&self, _room: &str, _text: &str, _ver: u64) -> Result<(), CacheError> {
        Ok(())
    }

    async fn touch(&self, _room: &str) -> Result<(), CacheError> {
        Ok(())
    }
}
