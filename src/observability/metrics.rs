//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_transitions_total` (counter): transitions by key and target state
//! - `breaker_state` (gauge): 0=closed, 1=open, 2=half-open, 3=isolated
//! - `breaker_admin_commands_total` (counter): isolate/reset by key
//! - `breaker_registered` (gauge): number of registered breakers
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Keys are label values; cardinality follows the registry size
//! - Isolation emits no breaker event, so state gauges are also resampled
//!   from the registry on a fixed period

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::resilience::{BreakerRegistry, CircuitState};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transition(key: &str, to: CircuitState) {
    metrics::counter!(
        "breaker_transitions_total",
        "key" => key.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_state(key, to);
}

pub fn record_state(key: &str, state: CircuitState) {
    metrics::gauge!("breaker_state", "key" => key.to_string()).set(state.as_gauge());
}

pub fn record_admin_command(command: &'static str, key: &str) {
    metrics::counter!(
        "breaker_admin_commands_total",
        "command" => command,
        "key" => key.to_string()
    )
    .increment(1);
}

pub fn record_registered(count: usize) {
    metrics::gauge!("breaker_registered").set(count as f64);
}

/// Set every `breaker_state` gauge from the registry's current snapshot.
pub fn sample_states(registry: &BreakerRegistry) {
    for (key, state) in registry.states() {
        record_state(&key, state);
    }
    record_registered(registry.len());
}

/// Resample state gauges every `period` until shutdown.
pub async fn run_state_sampler(
    registry: Arc<BreakerRegistry>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => sample_states(&registry),
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("State sampler stopped");
}
