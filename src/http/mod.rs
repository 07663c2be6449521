//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace span)
//!     → admin router (auth, handlers)
//!     → BreakerRegistry
//!     → JSON response
//! ```

pub mod server;

pub use server::{AdminServer, AdminState};
