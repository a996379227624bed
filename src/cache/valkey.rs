//! Valkey/Redis cache backend.
//!
//! Snapshots are stored as JSON under `room:{id}` with `SETEX`, so the store
//! expires rooms on its own once the retention window passes without access.
//! `touch` runs server-side as one script so it can never interleave with an
//! edit's write.
//!
//! The connection is a [`ConnectionManager`], which re-dials after the store
//! restarts or the link drops. Connecting and every call are bounded by the
//! configured timeout; a store that stops answering looks like a failing one.

use super::{CacheError, CachedRoom, RoomCache, room_key, unix_now};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Update `last_access` and refresh the TTL of an existing snapshot.
const TOUCH_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return 0
end
local room = cjson.decode(raw)
room.last_access = tonumber(ARGV[1])
redis.call('SETEX', KEYS[1], ARGV[2], cjson.encode(room))
return 1
"#;

pub struct ValkeyCache {
    conn: ConnectionManager,
    ttl_secs: u64,
    timeout: Duration,
    touch_script: redis::Script,
}

impl ValkeyCache {
    /// Connect and verify the link with `PING`, all within `timeout`.
    pub async fn connect(url: &str, ttl: Duration, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(timeout)
            .set_response_timeout(timeout);
        let conn = bounded("connect", timeout, async move {
            let mut conn = ConnectionManager::new_with_config(client, config).await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(conn)
        })
        .await?;
        info!("Valkey/Redis connected");
        Ok(Self {
            conn,
            ttl_secs: ttl.as_secs().max(1),
            timeout,
            touch_script: redis::Script::new(TOUCH_SCRIPT),
        })
    }

    async fn store(&self, room: &str, snapshot: &CachedRoom) -> Result<(), CacheError> {
        let payload = serde_json::to_string(snapshot)?;
        let mut conn = self.conn.clone();
        let ttl_secs = self.ttl_secs;
        bounded("write", self.timeout, async move {
            conn.set_ex::<_, _, ()>(room_key(room), payload, ttl_secs).await
        })
        .await
    }
}

/// Run one backend exchange, failing with [`CacheError::Timeout`] once
/// `limit` passes.
async fn bounded<T, F>(op: &'static str, limit: Duration, call: F) -> Result<T, CacheError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(CacheError::Timeout { op, after: limit }),
    }
}

#[async_trait]
impl RoomCache for ValkeyCache {
    fn name(&self) -> &'static str {
        "valkey"
    }

    async fn read(&self, room: &str) -> Result<Option<CachedRoom>, CacheError> {
        let mut conn = self.conn.clone();
        let raw = bounded("read", self.timeout, async move {
            conn.get::<_, Option<String>>(room_key(room)).await
        })
        .await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, room: &str, text: &str, ver: u64) -> Result<(), CacheError> {
        self.store(room, &CachedRoom::new(text, ver)).await
    }

    async fn touch(&self, room: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.touch_script.key(room_key(room));
        invocation.arg(unix_now()).arg(self.ttl_secs);
        bounded("touch", self.timeout, async move {
            let updated: RedisResult<i64> = invocation.invoke_async(&mut conn).await;
            updated
        })
        .await?;
        Ok(())
    }
}
