//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::{BreakerConfig, BreakerError};

/// Root configuration for the breaker service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration for the management API.
    pub listener: ListenerConfig,

    /// Management API access settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Breakers registered at startup and on reload.
    pub breakers: Vec<BreakerDefinition>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Management API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required on every request. No token disables auth.
    pub api_key: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// How often the `breaker_state` gauges are resampled from the registry, in seconds.
    pub state_sample_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            state_sample_secs: 15,
        }
    }
}

/// A named breaker as written in the config file.
///
/// Every field is required; there are no fallback thresholds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BreakerDefinition {
    /// Registry key (case-sensitive).
    pub key: String,

    /// Failure ratio in (0, 1] that trips the breaker.
    pub failure_threshold: f64,

    /// Trailing window for statistics, in milliseconds.
    pub sampling_duration_ms: u64,

    /// Outcomes required in the window before the ratio is trusted.
    pub minimum_throughput: u32,

    /// How long the breaker stays open, in milliseconds.
    pub break_duration_ms: u64,
}

impl BreakerDefinition {
    /// Convert to a validated runtime config.
    pub fn to_breaker_config(&self) -> Result<BreakerConfig, BreakerError> {
        BreakerConfig::new(
            self.failure_threshold,
            Duration::from_millis(self.sampling_duration_ms),
            self.minimum_throughput,
            Duration::from_millis(self.break_duration_ms),
        )
    }
}
