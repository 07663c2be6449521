//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry and register configured breakers
//! - Apply reloaded configs without disturbing live breakers
//!
//! # Design Decisions
//! - Fail fast: an invalid breaker definition aborts startup
//! - Each configured breaker gets a [`BreakerLogger`] keyed by its registry key
//! - On reload, keys already present keep their instance and statistics

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::config::{BreakerDefinition, ServiceConfig};
use crate::observability::{metrics, BreakerLogger};
use crate::resilience::{BreakerError, BreakerRegistry, CircuitBreaker};

/// Register every definition, skipping keys that already exist.
///
/// All definitions are converted before any is registered, so an invalid
/// one leaves the registry untouched. Returns the keys that were newly added.
pub fn register_definitions(
    registry: &BreakerRegistry,
    definitions: &[BreakerDefinition],
) -> Result<Vec<String>, BreakerError> {
    let configs = definitions
        .iter()
        .map(|definition| -> Result<_, BreakerError> {
            Ok((definition.key.as_str(), definition.to_breaker_config()?))
        })
        .collect::<Result<Vec<_>, BreakerError>>()?;

    let mut added = Vec::new();
    for (key, config) in configs {
        let mut created = false;
        let breaker = registry.get_or_add_with(key, || {
            created = true;
            Arc::new(CircuitBreaker::new(config).with_events(Arc::new(BreakerLogger::new(key))))
        });

        if created {
            metrics::record_state(key, breaker.state());
            added.push(key.to_string());
        } else {
            tracing::debug!(key = %key, "Breaker already registered, keeping existing instance");
        }
    }

    metrics::record_registered(registry.len());
    Ok(added)
}

/// Build the registry for a freshly loaded config.
pub fn bootstrap(config: &ServiceConfig) -> Result<Arc<BreakerRegistry>, BreakerError> {
    let registry = Arc::new(BreakerRegistry::new());
    let added = register_definitions(&registry, &config.breakers)?;

    tracing::info!(breakers = added.len(), keys = ?added, "Breakers registered");
    Ok(registry)
}

/// Apply reloaded configs until the channel closes or shutdown fires.
///
/// A config whose breakers fail to register is dropped and the current one stays live.
pub async fn apply_config_updates(
    mut updates: mpsc::UnboundedReceiver<ServiceConfig>,
    current: Arc<ArcSwap<ServiceConfig>>,
    registry: Arc<BreakerRegistry>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(new_config) = update else { break };
                match register_definitions(&registry, &new_config.breakers) {
                    Ok(added) => {
                        tracing::info!(added = ?added, total = registry.len(), "Configuration reloaded");
                        current.store(Arc::new(new_config));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded configuration");
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Config update loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitState;

    fn definition(key: &str) -> BreakerDefinition {
        BreakerDefinition {
            key: key.to_string(),
            failure_threshold: 0.5,
            sampling_duration_ms: 120_000,
            minimum_throughput: 2,
            break_duration_ms: 300_000,
        }
    }

    #[test]
    fn test_bootstrap_registers_configured_breakers() {
        let mut config = ServiceConfig::default();
        config.breakers = vec![definition("Ideal-Policy"), definition("inventory")];

        let registry = bootstrap(&config).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.state_of("Ideal-Policy").unwrap(), CircuitState::Closed);
    }

    #[test]
    fn test_reload_keeps_existing_instances() {
        let registry = BreakerRegistry::new();
        register_definitions(&registry, &[definition("a")]).unwrap();
        let original = registry.get("a").unwrap();
        original.isolate();

        let added = register_definitions(&registry, &[definition("a"), definition("b")]).unwrap();

        assert_eq!(added, vec!["b".to_string()]);
        assert!(Arc::ptr_eq(&original, &registry.get("a").unwrap()));
        assert_eq!(registry.state_of("a").unwrap(), CircuitState::Isolated);
    }

    #[tokio::test]
    async fn test_apply_config_updates_swaps_and_registers() {
        let initial = ServiceConfig::default();
        let current = Arc::new(ArcSwap::from_pointee(initial));
        let registry = Arc::new(BreakerRegistry::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(apply_config_updates(
            rx,
            current.clone(),
            registry.clone(),
            shutdown_rx,
        ));

        let mut reloaded = ServiceConfig::default();
        reloaded.admin.api_key = Some("rotated".to_string());
        reloaded.breakers = vec![definition("orders")];
        tx.send(reloaded).unwrap();

        let mut bad = ServiceConfig::default();
        let mut bad_def = definition("broken");
        bad_def.break_duration_ms = 0;
        bad.breakers = vec![bad_def];
        tx.send(bad).unwrap();

        let mut mixed = ServiceConfig::default();
        let mut broken = definition("broken-too");
        broken.break_duration_ms = 0;
        mixed.breakers = vec![definition("late-arrival"), broken];
        tx.send(mixed).unwrap();

        drop(tx);
        task.await.unwrap();

        assert!(registry.contains_key("orders"));
        assert!(!registry.contains_key("late-arrival"));
        assert!(!registry.contains_key("broken"));
        assert_eq!(current.load().admin.api_key.as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_apply_config_updates_stops_on_shutdown() {
        let current = Arc::new(ArcSwap::from_pointee(ServiceConfig::default()));
        let (_tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(apply_config_updates(
            rx,
            current,
            Arc::new(BreakerRegistry::new()),
            shutdown_rx,
        ));
        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_invalid_definition_fails() {
        let mut bad = definition("bad");
        bad.failure_threshold = 1.5;

        let err = register_definitions(&BreakerRegistry::new(), &[bad]).unwrap_err();
        assert!(matches!(err, BreakerError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_invalid_definition_registers_nothing() {
        let registry = BreakerRegistry::new();
        let mut bad = definition("broken");
        bad.break_duration_ms = 0;

        let result = register_definitions(&registry, &[definition("valid"), bad]);

        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
