//! Sliding-window rate limiting for pad creation.
//!
//! Each address keeps the timestamps of its accepted requests. Timestamps
//! older than the window are discarded lazily on every check, then the
//! remaining ones are counted against the limit. Rejected requests are not
//! recorded, so a client hammering the endpoint regains access exactly when
//! its oldest accepted request ages out.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::debug;

/// Thread-safe per-address sliding-window limiter.
#[derive(Debug)]
pub struct CreateRateLimiter {
    windows: DashMap<IpAddr, VecDeque<Instant>>,
    limit: usize,
    window: Duration,
}

impl CreateRateLimiter {
    /// Allow at most `limit` requests per address within any `window`.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Check and record a request from `ip`.
    ///
    /// Returns `true` if allowed, `false` if rate limited.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut stamps = self.windows.entry(ip).or_default();
        expire(&mut stamps, now, self.window);

        if stamps.len() >= self.limit {
            debug!(ip = %ip, limit = self.limit, "create rate limit exceeded");
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Requests from `ip` still inside the window as of `now`.
    pub fn recent(&self, ip: IpAddr, now: Instant) -> usize {
        self.windows
            .get(&ip)
            .map(|stamps| {
                stamps
                    .iter()
                    .filter(|t| now.saturating_duration_since(**t) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Drop addresses whose every timestamp has aged out.
    ///
    /// Returns the number of addresses removed.
    pub fn cleanup(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, stamps| {
            expire(stamps, now, self.window);
            !stamps.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            tracked_addresses: self.windows.len(),
        }
    }
}

fn expire(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = stamps.front() {
        if now.saturating_duration_since(*oldest) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

/// Rate limiter statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStats {
    /// Addresses with a live window.
    pub tracked_addresses: usize,
}
