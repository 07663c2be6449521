//! Error types for breakers and the registry.

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use crate::resilience::state::CircuitState;

/// Opaque failure reported by a protected call.
///
/// The breaker stores it as the last exception but never inspects it.
pub type CallFailure = Arc<dyn StdError + Send + Sync + 'static>;

/// Errors raised by breaker construction and registry lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BreakerError {
    /// No breaker is registered under the key.
    #[error("no circuit breaker registered with key '{key}'")]
    NotFound { key: String },

    /// Breaker parameters are out of range.
    #[error("invalid breaker configuration: {0}")]
    InvalidConfiguration(String),
}

impl BreakerError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }
}

/// Outcome of a call wrapped by a breaker.
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// The breaker refused the call without executing it.
    #[error("call rejected: circuit is {state}")]
    Rejected { state: CircuitState },

    /// The call ran and failed.
    #[error("call failed: {0}")]
    Failed(E),
}

impl<E> CallError<E> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallError::Rejected { .. })
    }

    /// Returns the inner error if the call actually ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CallError::Failed(e) => Some(e),
            CallError::Rejected { .. } => None,
        }
    }
}
