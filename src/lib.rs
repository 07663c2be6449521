//! Circuit breaker registry with a management API.
//!
//! Breakers are registered under string keys, driven by callers through
//! permit/report or `call`, and inspected or overridden by operators over HTTP.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ServiceConfig;
pub use http::AdminServer;
pub use lifecycle::Shutdown;
pub use resilience::{BreakerConfig, BreakerRegistry, CircuitBreaker, CircuitState};
