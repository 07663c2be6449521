//! Break/reset notifications.
//!
//! Breakers hand transitions to an optional sink; they never log themselves.
//! Sinks are invoked after the breaker's lock is released, so a sink may
//! safely query the breaker that notified it.

use std::time::Duration;

use crate::resilience::error::CallFailure;

/// Receives state-change notifications from a breaker.
pub trait BreakerEvents: Send + Sync {
    /// The circuit opened because of `failure` and will stay open for `break_duration`.
    fn on_break(&self, failure: &CallFailure, break_duration: Duration);

    /// The circuit closed, either by reset or by a successful trial.
    fn on_reset(&self);

    /// The circuit started admitting a trial call.
    fn on_half_open(&self) {}
}
