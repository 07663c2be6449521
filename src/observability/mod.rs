//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker transitions:
//!     → BreakerLogger (logging.rs) receives break/half-open/reset
//!     → structured log event + metrics.rs counters and gauges
//!
//! Management API:
//!     → TraceLayer spans with request IDs
//!     → metrics.rs admin command counters
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, BreakerLogger};
