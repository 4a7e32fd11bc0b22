//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the rate monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Breaker ceiling and smoothing.
    pub breaker: BreakerConfig,

    /// Update loop settings.
    pub monitor: MonitorSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Rate circuit breaker configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Maximum sustainable events per second (the ceiling).
    pub max_events_per_sec: f64,

    /// EWMA weight given to the newest sample, in (0, 1].
    /// Lower values tolerate longer bursts before tripping.
    pub smoothing_factor: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_events_per_sec: 10_000.0,
            smoothing_factor: 0.2,
        }
    }
}

/// Monitor loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MonitorSettings {
    /// Interval between breaker updates in milliseconds.
    pub tick_interval_ms: u64,

    /// Re-arm the breaker right after a trip has been reported.
    pub reset_after_open: bool,
}

impl MonitorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            reset_after_open: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: MonitorConfig = toml::from_str("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.breaker.smoothing_factor, 0.2);
        assert_eq!(config.monitor.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_sections() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [breaker]
            max_events_per_sec = 250.0

            [monitor]
            reset_after_open = true
            "#,
        )
        .unwrap();

        assert_eq!(config.breaker.max_events_per_sec, 250.0);
        assert_eq!(config.breaker.smoothing_factor, 0.2);
        assert!(config.monitor.reset_after_open);
        assert_eq!(config.monitor.tick_interval_ms, 1000);
        assert_eq!(config.observability.log_level, "info");
    }
}
