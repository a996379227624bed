//! Telemetry utilities: standardized tracing spans.

/// Standardized span constructors for pad observability.
pub mod spans {
    use std::net::IpAddr;
    use tracing::{Span, info_span};

    /// Create a span for one WebSocket session.
    pub fn session(room: &str, ip: IpAddr, session: &str) -> Span {
        info_span!("session", room = %room, ip = %ip, session = %session)
    }

    /// Create a span for an HTTP request touching a room.
    pub fn request(route: &'static str, room: Option<&str>) -> Span {
        if let Some(room) = room {
            info_span!("request", route = route, room = %room)
        } else {
            info_span!("request", route = route)
        }
    }
}
