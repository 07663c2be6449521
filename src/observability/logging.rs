//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Turn breaker notifications into log events and metrics
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Breakers stay silent; a [`BreakerLogger`] per key does the talking

use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::metrics;
use crate::resilience::{BreakerEvents, CallFailure, CircuitState};

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("breaker_registry={default_level},tower_http={default_level}").into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Event sink that logs transitions of the breaker registered under `key`.
#[derive(Debug, Clone)]
pub struct BreakerLogger {
    key: String,
}

impl BreakerLogger {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl BreakerEvents for BreakerLogger {
    fn on_break(&self, failure: &CallFailure, break_duration: Duration) {
        tracing::warn!(
            key = %self.key,
            error = %failure,
            break_secs = break_duration.as_secs_f64(),
            "Circuit breaker opened"
        );
        metrics::record_transition(&self.key, CircuitState::Open);
    }

    fn on_reset(&self) {
        tracing::info!(key = %self.key, "Circuit breaker closed");
        metrics::record_transition(&self.key, CircuitState::Closed);
    }

    fn on_half_open(&self) {
        tracing::info!(key = %self.key, "Circuit breaker half-open, admitting trial call");
        metrics::record_transition(&self.key, CircuitState::HalfOpen);
    }
}
