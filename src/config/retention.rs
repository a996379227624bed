//! Room retention configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{default_retention_hours, default_sweep_interval_secs};

/// How long idle rooms survive, in memory and in the cache.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Idle time after which a peer-less room is evicted, and the cache TTL (default: 48).
    #[serde(default = "default_retention_hours")]
    pub hours: u64,
    /// Seconds between sweeper passes (default: 3600).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl RetentionConfig {
    /// Retention window as a duration.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.hours.saturating_mul(3600))
    }

    /// Interval between sweeper passes.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            hours: default_retention_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}
