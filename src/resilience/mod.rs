//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Protected call site:
//!     → registry.rs (look up or create the breaker for a key)
//!     → circuit_breaker.rs (permit? run, then report success/failure)
//!     → window.rs (rolling success/failure statistics)
//!     → events.rs (break/half-open/reset notifications to observers)
//!
//! Operator:
//!     → registry.rs (keys, states, last exception, isolate, reset by key)
//! ```
//!
//! # Design Decisions
//! - One mutex per breaker; the registry map only guards key insertion
//! - Time is read from a Clock, never from timers or background threads
//! - Protected-call failures are opaque shared error values

pub mod circuit_breaker;
pub mod clock;
pub mod error;
pub mod events;
pub mod registry;
pub mod state;
pub mod window;

pub use circuit_breaker::{BreakerConfig, BreakerStats, CircuitBreaker};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BreakerError, CallError, CallFailure};
pub use events::BreakerEvents;
pub use registry::BreakerRegistry;
pub use state::CircuitState;
pub use window::{FailureWindow, WindowSnapshot};
