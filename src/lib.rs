//! aukpad - shared-text pads synchronized over WebSockets.
//!
//! Rooms live in an in-process registry, optionally mirrored to a Valkey/Redis
//! cache so they survive restarts and can be shared between instances.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod network;
pub mod security;
pub mod state;
pub mod telemetry;
