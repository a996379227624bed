//! Shared application state handed to every handler and background task.

use crate::cache::Cache;
use crate::config::Config;
use crate::security::{ConnectionLimiter, CreateRateLimiter};
use std::sync::Arc;

use super::ids::SessionIdGenerator;
use super::registry::RoomRegistry;

/// Process-wide state: initialised empty at startup, cloned cheaply into
/// each request and session task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<RoomRegistry>,
    pub rate_limiter: Arc<CreateRateLimiter>,
    pub connections: Arc<ConnectionLimiter>,
    pub session_ids: Arc<SessionIdGenerator>,
}

impl AppState {
    pub fn new(config: Config, cache: Cache) -> Self {
        let rate_limiter = CreateRateLimiter::new(
            config.limits.create_requests_per_hour,
            config.limits.create_window(),
        );
        let connections = ConnectionLimiter::new(config.limits.max_connections_per_ip);
        Self {
            registry: Arc::new(RoomRegistry::new(cache)),
            rate_limiter: Arc::new(rate_limiter),
            connections: Arc::new(connections),
            session_ids: Arc::new(SessionIdGenerator::new()),
            config: Arc::new(config),
        }
    }
}
