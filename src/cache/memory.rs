//! Process-local cache backend.
//!
//! Keeps snapshots in a `DashMap` with the same TTL semantics as the
//! external store. Sharing one instance between two registries through `Arc`
//! models a restart or a second instance without running a server.

use super::{CacheError, CachedRoom, RoomCache, unix_now};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

pub struct MemoryCache {
    entries: DashMap<String, (CachedRoom, Instant)>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().1 > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RoomCache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, room: &str) -> Result<Option<CachedRoom>, CacheError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(room)
            .filter(|e| e.value().1 > now)
            .map(|e| e.value().0.clone()))
    }

    async fn write(&self, room: &str, text: &str, ver: u64) -> Result<(), CacheError> {
        let expires = Instant::now() + self.ttl;
        self.entries
            .insert(room.to_string(), (CachedRoom::new(text, ver), expires));
        Ok(())
    }

    async fn touch(&self, room: &str) -> Result<(), CacheError> {
        let now = Instant::now();
        if let Some(mut entry) = self.entries.get_mut(room)
            && entry.1 > now
        {
            entry.0.last_access = unix_now();
            entry.1 = now + self.ttl;
        }
        Ok(())
    }
}
