//! Admission control for aukpad.
//!
//! Two independent per-address policies gate the public surface:
//! - **Create rate limiting**: sliding-window count of `POST /` requests
//! - **Connection limiting**: cap on concurrent WebSocket sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             Admission Control               │
//! ├──────────────────────┬──────────────────────┤
//! │  CreateRateLimiter   │  ConnectionLimiter   │
//! │  DashMap<IP, deque>  │  DashMap<IP, count>  │
//! │  lazy window expiry  │  RAII permits        │
//! └──────────────────────┴──────────────────────┘
//! ```

pub mod conn_limit;
pub mod rate_limit;

pub use conn_limit::{ConnectionLimiter, ConnectionPermit};
pub use rate_limit::{CreateRateLimiter, RateLimitStats};
