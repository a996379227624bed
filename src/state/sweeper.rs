//! Retention sweeper.
//!
//! Periodically evicts rooms that have no attached sessions and have not been
//! accessed within the retention window. Only the in-process registry is
//! swept; cached snapshots expire through their TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::app::AppState;
use super::registry::RoomRegistry;

/// Run one sweep pass. Returns the number of rooms evicted.
pub fn run_sweep(registry: &RoomRegistry, window: Duration) -> usize {
    let removed = registry.sweep(Instant::now(), window);
    for room in &removed {
        info!(room = %room, "Cleaned up inactive room");
    }
    crate::metrics::record_rooms_swept(removed.len());
    removed.len()
}

/// Spawn the background sweep loop.
///
/// The first pass runs immediately. Each pass runs in its own task so a
/// panicking pass is logged and the loop carries on with the next tick. Stale
/// create-rate windows are pruned on the same cadence.
pub fn spawn_sweeper(state: AppState) -> JoinHandle<()> {
    let window = state.config.retention.window();
    let period = state.config.retention.sweep_interval();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;

            let registry = Arc::clone(&state.registry);
            let pass = tokio::spawn(async move { run_sweep(&registry, window) });
            match pass.await {
                Ok(removed) if removed > 0 => {
                    info!(removed, remaining = state.registry.len(), "Room sweep completed");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Room sweep failed"),
            }

            let pruned = state.rate_limiter.cleanup(Instant::now());
            if pruned > 0 {
                info!(removed = pruned, "Stale rate limit windows pruned");
            }
        }
    })
}
