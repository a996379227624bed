//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, CacheConfig)
//! - [`limits`]: Size, connection and rate limits (LimitsConfig)
//! - [`retention`]: Room retention and sweep cadence (RetentionConfig)
//! - [`env`]: Environment variable overlay applied after file loading
//! - [`defaults`]: Default value functions shared by serde and `Default` impls

mod defaults;
mod env;
mod limits;
mod retention;
mod types;

pub use limits::LimitsConfig;
pub use retention::RetentionConfig;
pub use types::{CacheConfig, Config, ConfigError, ServerConfig};
