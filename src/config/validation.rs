//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate breaker parameter ranges
//! - Reject empty and duplicate breaker keys
//! - Check listener and metrics addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("breaker #{index} has an empty key")]
    EmptyKey { index: usize },

    #[error("breaker key '{key}' is declared more than once")]
    DuplicateKey { key: String },

    #[error("breaker '{key}': {reason}")]
    InvalidBreaker { key: String, reason: String },

    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut seen = HashSet::new();
    for (index, definition) in config.breakers.iter().enumerate() {
        if definition.key.is_empty() {
            errors.push(ValidationError::EmptyKey { index });
            continue;
        }
        if !seen.insert(definition.key.as_str()) {
            errors.push(ValidationError::DuplicateKey {
                key: definition.key.clone(),
            });
        }
        if let Err(e) = definition.to_breaker_config() {
            errors.push(ValidationError::InvalidBreaker {
                key: definition.key.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
