//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

/// One mebibyte, the unit `MAX_TEXT_SIZE` is expressed in.
pub const MIB: usize = 1024 * 1024;

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

// =============================================================================
// Cache Defaults
// =============================================================================

pub fn default_cache_url() -> String {
    "redis://localhost:6379/0".to_string()
}

pub fn default_cache_timeout_ms() -> u64 {
    2000
}

// =============================================================================
// Limits Defaults
// =============================================================================

pub fn default_max_text_bytes() -> usize {
    5 * MIB
}

pub fn default_max_connections_per_ip() -> usize {
    10
}

pub fn default_create_requests_per_hour() -> usize {
    50
}

pub fn default_create_window_secs() -> u64 {
    3600
}

// =============================================================================
// Retention Defaults
// =============================================================================

pub fn default_retention_hours() -> u64 {
    48
}

pub fn default_sweep_interval_secs() -> u64 {
    3600
}
