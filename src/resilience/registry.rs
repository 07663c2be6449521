//! Keyed collection of shared circuit breakers.
//!
//! # Responsibilities
//! - Create a breaker on first use of a key and hand the same instance to every later caller
//! - Resolve keys for inspection and manual isolate/reset
//! - Snapshot keys and states for the management API
//!
//! # Design Decisions
//! - First writer wins: a second registration under a key is discarded silently
//! - Keys are case-sensitive and matched exactly
//! - No removal or replacement for the registry's lifetime
//! - The map shard lock is held only for the insert-if-absent step, never while a breaker is in use

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::resilience::circuit_breaker::{BreakerConfig, CircuitBreaker};
use crate::resilience::error::{BreakerError, CallFailure};
use crate::resilience::state::CircuitState;

/// Concurrent map of key to breaker.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `breaker` under `key` unless one is already there.
    ///
    /// Returns whichever instance ends up registered.
    pub fn get_or_add(&self, key: &str, breaker: Arc<CircuitBreaker>) -> Arc<CircuitBreaker> {
        self.get_or_add_with(key, move || breaker)
    }

    /// Like [`get_or_add`](Self::get_or_add), building the breaker only if the key is new.
    pub fn get_or_add_with<F>(&self, key: &str, factory: F) -> Arc<CircuitBreaker>
    where
        F: FnOnce() -> Arc<CircuitBreaker>,
    {
        // Fast path avoids a shard write lock and a key allocation.
        if let Some(existing) = self.breakers.get(key) {
            return existing.value().clone();
        }

        let mut created = false;
        let breaker = self
            .breakers
            .entry(key.to_string())
            .or_insert_with(|| {
                created = true;
                factory()
            })
            .value()
            .clone();

        if created {
            tracing::debug!(key = %key, "Circuit breaker registered");
        }
        breaker
    }

    /// Register a breaker built from `config`, or return the one already under `key`.
    pub fn register(&self, key: &str, config: BreakerConfig) -> Arc<CircuitBreaker> {
        self.get_or_add_with(key, || Arc::new(CircuitBreaker::new(config)))
    }

    /// Look up a breaker without creating one.
    pub fn get(&self, key: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.breakers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.breakers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// State of every breaker at the time of the call.
    pub fn states(&self) -> BTreeMap<String, CircuitState> {
        // Collect handles first so no shard lock is held while breakers are locked.
        self.entries()
            .into_iter()
            .map(|(key, breaker)| (key, breaker.state()))
            .collect()
    }

    /// Every key with its breaker.
    pub fn entries(&self) -> Vec<(String, Arc<CircuitBreaker>)> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn state_of(&self, key: &str) -> Result<CircuitState, BreakerError> {
        Ok(self.resolve(key)?.state())
    }

    pub fn last_exception_of(&self, key: &str) -> Result<Option<CallFailure>, BreakerError> {
        Ok(self.resolve(key)?.last_exception())
    }

    /// Isolate the breaker under `key`; true if it is now isolated.
    pub fn isolate(&self, key: &str) -> Result<bool, BreakerError> {
        let breaker = self.resolve(key)?;
        breaker.isolate();
        Ok(breaker.state() == CircuitState::Isolated)
    }

    /// Reset the breaker under `key`; true if it is now closed.
    pub fn reset(&self, key: &str) -> Result<bool, BreakerError> {
        let breaker = self.resolve(key)?;
        breaker.reset();
        Ok(breaker.state() == CircuitState::Closed)
    }

    /// Reset every registered breaker.
    pub fn reset_all(&self) {
        for (_, breaker) in self.entries() {
            breaker.reset();
        }
    }

    fn resolve(&self, key: &str) -> Result<Arc<CircuitBreaker>, BreakerError> {
        self.get(key).ok_or_else(|| BreakerError::not_found(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::{Duration, Instant};

    const TEST_KEY: &str = "test";

    fn breaker() -> Arc<CircuitBreaker> {
        let config = BreakerConfig::new(1.0, Duration::from_secs(1), 2, Duration::from_secs(60))
            .unwrap();
        Arc::new(CircuitBreaker::new(config))
    }

    #[derive(Debug, thiserror::Error)]
    #[error("remote call failed")]
    struct RemoteError;

    #[test]
    fn test_get_or_add_returns_added_breaker() {
        let registry = BreakerRegistry::new();
        let added = breaker();

        let returned = registry.get_or_add(TEST_KEY, added.clone());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains_key(TEST_KEY));
        assert!(Arc::ptr_eq(&added, &returned));
    }

    #[test]
    fn test_get_or_add_keeps_existing_breaker() {
        let registry = BreakerRegistry::new();
        let first = breaker();
        let second = breaker();

        let a = registry.get_or_add(TEST_KEY, first.clone());
        let b = registry.get_or_add(TEST_KEY, second.clone());

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&a, &first));
        assert!(Arc::ptr_eq(&b, &first));
        assert!(!Arc::ptr_eq(&b, &second));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let registry = BreakerRegistry::new();
        let lower = registry.get_or_add(TEST_KEY, breaker());
        let upper = registry.get_or_add(&TEST_KEY.to_uppercase(), breaker());

        assert_eq!(registry.len(), 2);
        assert!(!Arc::ptr_eq(&lower, &upper));
    }

    #[test]
    fn test_factory_not_called_for_existing_key() {
        let registry = BreakerRegistry::new();
        registry.get_or_add(TEST_KEY, breaker());

        registry.get_or_add_with(TEST_KEY, || panic!("factory must not run"));
    }

    #[test]
    fn test_register_keeps_first_config() {
        let registry = BreakerRegistry::new();
        let first = BreakerConfig::new(0.5, Duration::from_secs(1), 1, Duration::from_secs(1))
            .unwrap();
        let second = BreakerConfig::new(0.9, Duration::from_secs(5), 7, Duration::from_secs(5))
            .unwrap();

        let registered = registry.register("ok", first);
        let again = registry.register("ok", second);

        assert!(Arc::ptr_eq(&registered, &again));
        assert_eq!(again.config().minimum_throughput(), 1);
        assert_eq!(registry.keys(), vec!["ok".to_string()]);
    }

    #[test]
    fn test_keys_empty_then_populated() {
        let registry = BreakerRegistry::new();
        assert!(registry.keys().is_empty());
        assert!(registry.is_empty());

        registry.get_or_add("a", breaker());
        registry.get_or_add("b", breaker());

        let keys = registry.keys();
        assert!(keys.iter().any(|k| k == "a"));
        assert!(keys.iter().any(|k| k == "b"));
        assert!(!keys.iter().any(|k| k == "c"));
    }

    #[test]
    fn test_states_snapshot() {
        let registry = BreakerRegistry::new();
        registry.get_or_add("a", breaker());
        registry.get_or_add("b", breaker()).isolate();

        let states = registry.states();
        assert_eq!(states.len(), 2);
        assert_eq!(states["a"], CircuitState::Closed);
        assert_eq!(states["b"], CircuitState::Isolated);

        // Snapshot does not follow later changes.
        registry.reset("b").unwrap();
        assert_eq!(states["b"], CircuitState::Isolated);
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let registry = BreakerRegistry::new();
        let expected = BreakerError::not_found(TEST_KEY);

        assert_eq!(registry.state_of(TEST_KEY).unwrap_err(), expected);
        assert_eq!(registry.last_exception_of(TEST_KEY).unwrap_err(), expected);
        assert_eq!(registry.isolate(TEST_KEY).unwrap_err(), expected);
        assert_eq!(registry.reset(TEST_KEY).unwrap_err(), expected);
    }

    #[test]
    fn test_state_and_last_exception_of_known_key() {
        let registry = BreakerRegistry::new();
        let cb = registry.get_or_add(TEST_KEY, breaker());

        assert_eq!(registry.state_of(TEST_KEY).unwrap(), cb.state());
        assert!(registry.last_exception_of(TEST_KEY).unwrap().is_none());

        let t0 = Instant::now();
        cb.report_failure_at(Arc::new(RemoteError), t0);
        cb.report_failure_at(Arc::new(RemoteError), t0);

        assert_eq!(registry.state_of(TEST_KEY).unwrap(), CircuitState::Open);
        let last = registry.last_exception_of(TEST_KEY).unwrap().unwrap();
        assert_eq!(last.to_string(), "remote call failed");
    }

    #[test]
    fn test_isolate_and_reset_by_key() {
        let registry = BreakerRegistry::new();
        let cb = registry.get_or_add("known-key", breaker());

        assert!(registry.isolate("known-key").unwrap());
        assert_eq!(cb.state(), CircuitState::Isolated);
        assert!(!cb.permit_call());

        assert!(registry.reset("known-key").unwrap());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.permit_call());
    }

    #[test]
    fn test_reset_all() {
        let registry = BreakerRegistry::new();
        registry.get_or_add("a", breaker()).isolate();
        registry.get_or_add("b", breaker()).isolate();

        registry.reset_all();

        assert!(registry.states().values().all(|s| *s == CircuitState::Closed));
    }

    #[test]
    fn test_concurrent_get_or_add_installs_one_instance() {
        let registry = Arc::new(BreakerRegistry::new());
        let threads = 32;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                let candidate = breaker();
                thread::spawn(move || {
                    barrier.wait();
                    registry.get_or_add("shared", candidate)
                })
            })
            .collect();

        let returned: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let installed = registry.get("shared").unwrap();

        assert_eq!(registry.len(), 1);
        assert!(returned.iter().all(|b| Arc::ptr_eq(b, &installed)));
    }
}
