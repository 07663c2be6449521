//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → breakers registered, settings shared via ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new breaker keys registered, existing keys keep their instance
//!     → atomic swap of Arc<ServiceConfig>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - Service settings have defaults, breaker definitions do not
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AdminConfig, BreakerDefinition, ListenerConfig, ObservabilityConfig, ServiceConfig};
pub use validation::ValidationError;
