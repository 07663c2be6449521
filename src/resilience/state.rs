//! Circuit state enumeration.
//!
//! # States
//! - Closed: calls pass through, outcomes are counted
//! - Open: calls fail fast without executing
//! - HalfOpen: a single trial call probes recovery
//! - Isolated: calls fail fast until manually reset
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     failure rate >= threshold and throughput >= minimum
//! Open     → HalfOpen: duration of break elapsed and next call permitted
//! HalfOpen → Closed:   trial call succeeds
//! HalfOpen → Open:     trial call fails
//! any      → Isolated: manual isolate
//! any      → Closed:   manual reset
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls pass through and failures are counted.
    #[default]
    Closed,
    /// Calls fail fast without executing.
    Open,
    /// One trial call is permitted to probe recovery.
    HalfOpen,
    /// Calls fail fast until manually reset.
    Isolated,
}

impl CircuitState {
    /// Returns true if calls are rejected outright in this state.
    pub fn is_fail_fast(self) -> bool {
        matches!(self, CircuitState::Open | CircuitState::Isolated)
    }

    /// Numeric encoding used for the `breaker_state` gauge.
    pub fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::Open => 1.0,
            CircuitState::HalfOpen => 2.0,
            CircuitState::Isolated => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
            CircuitState::Isolated => "isolated",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_closed() {
        assert_eq!(CircuitState::default(), CircuitState::Closed);
    }

    #[test]
    fn test_fail_fast_states() {
        assert!(!CircuitState::Closed.is_fail_fast());
        assert!(!CircuitState::HalfOpen.is_fail_fast());
        assert!(CircuitState::Open.is_fail_fast());
        assert!(CircuitState::Isolated.is_fail_fast());
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&CircuitState::HalfOpen).unwrap();
        assert_eq!(json, "\"half_open\"");
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
    }
}
