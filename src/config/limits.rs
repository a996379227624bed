//! Size, connection and rate limits.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_create_requests_per_hour, default_create_window_secs, default_max_connections_per_ip,
    default_max_text_bytes,
};

/// Abuse and resource limits.
///
/// All limits are enforced per source address except `max_text_bytes`,
/// which bounds every stored document.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum document size in UTF-8 encoded bytes (default: 5 MiB).
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
    /// Concurrent WebSocket sessions allowed per address (default: 10).
    #[serde(default = "default_max_connections_per_ip")]
    pub max_connections_per_ip: usize,
    /// Pad creations allowed per address inside one window (default: 50).
    #[serde(default = "default_create_requests_per_hour")]
    pub create_requests_per_hour: usize,
    /// Length of the sliding creation window in seconds (default: 3600).
    #[serde(default = "default_create_window_secs")]
    pub create_window_secs: u64,
}

impl LimitsConfig {
    /// Sliding window used by the create-request limiter.
    pub fn create_window(&self) -> Duration {
        Duration::from_secs(self.create_window_secs)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_bytes: default_max_text_bytes(),
            max_connections_per_ip: default_max_connections_per_ip(),
            create_requests_per_hour: default_create_requests_per_hour(),
            create_window_secs: default_create_window_secs(),
        }
    }
}
