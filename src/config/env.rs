//! Environment variable overlay.
//!
//! Variable names match the ones existing deployments already export.

use std::net::SocketAddr;
use std::str::FromStr;

use super::defaults::MIB;
use super::types::Config;

pub const USE_VALKEY: &str = "USE_VALKEY";
pub const VALKEY_URL: &str = "VALKEY_URL";
pub const MAX_TEXT_SIZE: &str = "MAX_TEXT_SIZE";
pub const MAX_CONNECTIONS_PER_IP: &str = "MAX_CONNECTIONS_PER_IP";
pub const RETENTION_HOURS: &str = "RETENTION_HOURS";
pub const LISTEN: &str = "AUKPAD_LISTEN";
pub const METRICS_PORT: &str = "AUKPAD_METRICS_PORT";

impl Config {
    /// Override fields from environment-style variables.
    ///
    /// `lookup` abstracts `std::env::var` so the overlay can be tested without
    /// touching the process environment. Values that fail to parse are logged
    /// and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(USE_VALKEY) {
            self.cache.enabled = value.trim().eq_ignore_ascii_case("true");
        }
        if let Some(value) = lookup(VALKEY_URL) {
            self.cache.url = value;
        }
        if let Some(mib) = parse_var::<usize>(&lookup, MAX_TEXT_SIZE) {
            self.limits.max_text_bytes = mib.saturating_mul(MIB);
        }
        if let Some(max) = parse_var(&lookup, MAX_CONNECTIONS_PER_IP) {
            self.limits.max_connections_per_ip = max;
        }
        if let Some(hours) = parse_var(&lookup, RETENTION_HOURS) {
            self.retention.hours = hours;
        }
        if let Some(addr) = parse_var::<SocketAddr>(&lookup, LISTEN) {
            self.server.listen = addr;
        }
        if let Some(port) = parse_var(&lookup, METRICS_PORT) {
            self.server.metrics_port = port;
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(var = key, value = %raw, error = %e, "Ignoring invalid environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overlay(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn no_variables_keeps_defaults() {
        let config = overlay(&[]);
        assert!(!config.cache.enabled);
        assert_eq!(config.limits.max_text_bytes, 5 * MIB);
        assert_eq!(config.limits.max_connections_per_ip, 10);
        assert_eq!(config.retention.hours, 48);
    }

    #[test]
    fn recognized_variables_override() {
        let config = overlay(&[
            (USE_VALKEY, "TRUE"),
            (VALKEY_URL, "redis://valkey:6379/2"),
            (MAX_TEXT_SIZE, "2"),
            (MAX_CONNECTIONS_PER_IP, "4"),
            (RETENTION_HOURS, "12"),
            (LISTEN, "127.0.0.1:8080"),
            (METRICS_PORT, "9090"),
        ]);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.url, "redis://valkey:6379/2");
        assert_eq!(config.limits.max_text_bytes, 2 * MIB);
        assert_eq!(config.limits.max_connections_per_ip, 4);
        assert_eq!(config.retention.hours, 12);
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.server.metrics_port, 9090);
    }

    #[test]
    fn use_valkey_other_values_disable() {
        assert!(!overlay(&[(USE_VALKEY, "yes")]).cache.enabled);
        assert!(!overlay(&[(USE_VALKEY, "false")]).cache.enabled);
    }

    #[test]
    fn invalid_numbers_are_ignored() {
        let config = overlay(&[(MAX_CONNECTIONS_PER_IP, "many"), (RETENTION_HOURS, "-1")]);
        assert_eq!(config.limits.max_connections_per_ip, 10);
        assert_eq!(config.retention.hours, 48);
    }
}
