//! Concurrent connection limiting.
//!
//! A session holds a [`ConnectionPermit`] for its whole lifetime; dropping
//! the permit releases the slot, so every exit path of a session (clean
//! close, transport error, panic, task cancellation) gives it back.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Live session count per source address.
#[derive(Debug)]
pub struct ConnectionLimiter {
    counts: DashMap<IpAddr, usize>,
    max_per_ip: usize,
}

impl ConnectionLimiter {
    pub fn new(max_per_ip: usize) -> Self {
        Self {
            counts: DashMap::new(),
            max_per_ip,
        }
    }

    pub fn max_per_ip(&self) -> usize {
        self.max_per_ip
    }

    /// Reserve a slot for `ip`, or `None` if it already has the maximum.
    pub fn try_acquire(self: &Arc<Self>, ip: IpAddr) -> Option<ConnectionPermit> {
        let mut count = self.counts.entry(ip).or_insert(0);
        if *count >= self.max_per_ip {
            let active = *count;
            drop(count);
            debug!(ip = %ip, active, "connection limit exceeded");
            if active == 0 {
                self.counts.remove_if(&ip, |_, c| *c == 0);
            }
            return None;
        }
        *count += 1;
        Some(ConnectionPermit {
            limiter: Arc::clone(self),
            ip,
        })
    }

    /// Live sessions for `ip`.
    pub fn active(&self, ip: IpAddr) -> usize {
        self.counts.get(&ip).map(|c| *c).unwrap_or(0)
    }

    /// Addresses with at least one live session.
    pub fn tracked_addresses(&self) -> usize {
        self.counts.len()
    }

    fn release(&self, ip: IpAddr) {
        if let Entry::Occupied(mut slot) = self.counts.entry(ip) {
            let remaining = slot.get().saturating_sub(1);
            if remaining == 0 {
                slot.remove();
            } else {
                *slot.get_mut() = remaining;
            }
        }
    }
}

/// One reserved connection slot. Released on drop.
#[derive(Debug)]
pub struct ConnectionPermit {
    limiter: Arc<ConnectionLimiter>,
    ip: IpAddr,
}

impl ConnectionPermit {
    pub fn ip(&self) -> IpAddr {
        self.ip
    }
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.limiter.release(self.ip);
    }
}
