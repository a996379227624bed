//! Prometheus metrics collection for aukpad.
//!
//! Exposed on a separate HTTP listener when `server.metrics_port` is set.
//! Every recording helper is a no-op until [`init`] has run, so library
//! users and tests never need a registry.
//!
//! - `aukpad_rooms_active` - Rooms held in the in-process registry
//! - `aukpad_sessions_active` - Attached WebSocket sessions
//! - `aukpad_edits_total` / `aukpad_edits_rejected_total{reason}`
//! - `aukpad_fanout_recipients` - Recipients per accepted edit (histogram)

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Edits accepted and applied to a room.
pub static EDITS_APPLIED: OnceLock<IntCounter> = OnceLock::new();

/// Edits and create requests rejected, by reason.
pub static REJECTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Rooms evicted by the retention sweeper.
pub static ROOMS_SWEPT: OnceLock<IntCounter> = OnceLock::new();

/// WebSocket connections refused by the per-address limit.
pub static CONNECTIONS_REFUSED: OnceLock<IntCounter> = OnceLock::new();

/// Cache backend failures, by operation.
pub static CACHE_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Rooms currently in the registry.
pub static ACTIVE_ROOMS: OnceLock<IntGauge> = OnceLock::new();

/// Sessions currently attached to a room.
pub static ACTIVE_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

/// Recipients per accepted edit.
pub static FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(EDITS_APPLIED, IntCounter::new("aukpad_edits_total", "Edits applied to rooms"));
    register!(REJECTED, IntCounterVec::new(Opts::new("aukpad_rejected_total", "Rejected edits and create requests by reason"), &["reason"]));
    register!(ROOMS_SWEPT, IntCounter::new("aukpad_rooms_swept_total", "Rooms evicted by the retention sweeper"));
    register!(CONNECTIONS_REFUSED, IntCounter::new("aukpad_connections_refused_total", "WebSocket connections refused by the per-address limit"));
    register!(CACHE_ERRORS, IntCounterVec::new(Opts::new("aukpad_cache_errors_total", "Cache backend failures by operation"), &["op"]));
    register!(ACTIVE_ROOMS, IntGauge::new("aukpad_rooms_active", "Rooms in the in-process registry"));
    register!(ACTIVE_SESSIONS, IntGauge::new("aukpad_sessions_active", "Attached WebSocket sessions"));
    register!(FANOUT, Histogram::with_opts(
        HistogramOpts::new("aukpad_fanout_recipients", "Recipients per accepted edit")
            .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

#[inline]
pub fn record_edit() {
    if let Some(c) = EDITS_APPLIED.get() {
        c.inc();
    }
}

/// Record a rejected edit or create request (label from `PadError::error_code`).
#[inline]
pub fn record_rejected(reason: &str) {
    if let Some(c) = REJECTED.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn record_rooms_swept(count: usize) {
    if let Some(c) = ROOMS_SWEPT.get() {
        c.inc_by(count as u64);
    }
}

#[inline]
pub fn record_connection_refused() {
    if let Some(c) = CONNECTIONS_REFUSED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_cache_error(op: &str) {
    if let Some(c) = CACHE_ERRORS.get() {
        c.with_label_values(&[op]).inc();
    }
}

#[inline]
pub fn set_active_rooms(count: usize) {
    if let Some(g) = ACTIVE_ROOMS.get() {
        g.set(count as i64);
    }
}

#[inline]
pub fn session_opened() {
    if let Some(g) = ACTIVE_SESSIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn session_closed() {
    if let Some(g) = ACTIVE_SESSIONS.get() {
        g.dec();
    }
}

#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(h) = FANOUT.get() {
        h.observe(recipients as f64);
    }
}
