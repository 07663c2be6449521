//! Circuit breaker for protected calls.
//!
//! # States
//! - Closed: normal operation, outcomes feed the failure window
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: one trial call probes recovery
//! - Isolated: manual override, calls fail fast until reset
//!
//! # State Transitions
//! ```text
//! Closed → Open: throughput >= minimum and failure rate >= threshold in window
//! Open → Half-Open: duration of break elapsed, next permit request wins the trial
//! Half-Open → Closed: trial succeeds
//! Half-Open → Open: trial fails
//! any → Isolated / Closed: manual isolate / reset
//! ```
//!
//! # Design Decisions
//! - One mutex per breaker serializes every transition and window mutation
//! - Timing is passive: each operation compares against the supplied instant
//! - Events fire after the lock is released
//! - The breaker never logs; observers subscribe through [`BreakerEvents`]

use parking_lot::Mutex;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::error::{BreakerError, CallError, CallFailure};
use crate::resilience::events::BreakerEvents;
use crate::resilience::state::CircuitState;
use crate::resilience::window::FailureWindow;

/// Trip and recovery parameters for one breaker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerConfig {
    failure_threshold: f64,
    sampling_duration: Duration,
    minimum_throughput: u32,
    break_duration: Duration,
}

impl BreakerConfig {
    /// Build a validated configuration.
    pub fn new(
        failure_threshold: f64,
        sampling_duration: Duration,
        minimum_throughput: u32,
        break_duration: Duration,
    ) -> Result<Self, BreakerError> {
        let config = Self {
            failure_threshold,
            sampling_duration,
            minimum_throughput,
            break_duration,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), BreakerError> {
        // Written so that NaN is rejected as well.
        if !(self.failure_threshold > 0.0 && self.failure_threshold <= 1.0) {
            return Err(BreakerError::InvalidConfiguration(format!(
                "failure_threshold must be in (0, 1], got {}",
                self.failure_threshold
            )));
        }
        if self.sampling_duration.is_zero() {
            return Err(BreakerError::InvalidConfiguration(
                "sampling_duration must be greater than zero".to_string(),
            ));
        }
        if self.minimum_throughput < 1 {
            return Err(BreakerError::InvalidConfiguration(
                "minimum_throughput must be at least 1".to_string(),
            ));
        }
        if self.break_duration.is_zero() {
            return Err(BreakerError::InvalidConfiguration(
                "break_duration must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn failure_threshold(&self) -> f64 {
        self.failure_threshold
    }

    pub fn sampling_duration(&self) -> Duration {
        self.sampling_duration
    }

    pub fn minimum_throughput(&self) -> u32 {
        self.minimum_throughput
    }

    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone)]
pub struct BreakerStats {
    pub state: CircuitState,
    pub throughput: usize,
    pub failure_rate: f64,
    pub opened_at: Option<Instant>,
    /// Time since the last trip, measured at the snapshot instant.
    pub open_for: Option<Duration>,
    pub last_exception: Option<CallFailure>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    window: FailureWindow,
    last_exception: Option<CallFailure>,
    opened_at: Option<Instant>,
    /// When the outstanding half-open trial was granted.
    trial_started_at: Option<Instant>,
}

enum Transition {
    Broke(CallFailure),
    HalfOpened,
    Reset,
}

/// Per-key circuit breaker.
///
/// Callers ask [`permit_call`](Self::permit_call) before running the protected
/// operation and then report its outcome. [`call`](Self::call) does all three.
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
    events: Option<Arc<dyn BreakerEvents>>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                window: FailureWindow::new(config.sampling_duration),
                last_exception: None,
                opened_at: None,
                trial_started_at: None,
            }),
            events: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Attach a sink for break/reset notifications.
    pub fn with_events(mut self, events: Arc<dyn BreakerEvents>) -> Self {
        self.events = Some(events);
        self
    }

    /// Replace the time source used by the clock-driven operations.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn last_exception(&self) -> Option<CallFailure> {
        self.inner.lock().last_exception.clone()
    }

    /// Window statistics at `at`.
    pub fn stats_at(&self, at: Instant) -> BreakerStats {
        let mut inner = self.inner.lock();
        let snapshot = inner.window.snapshot(at);
        BreakerStats {
            state: inner.state,
            throughput: snapshot.throughput,
            failure_rate: snapshot.failure_rate,
            opened_at: inner.opened_at,
            open_for: inner.opened_at.map(|opened_at| at.saturating_duration_since(opened_at)),
            last_exception: inner.last_exception.clone(),
        }
    }

    pub fn stats(&self) -> BreakerStats {
        self.stats_at(self.clock.now())
    }

    /// Decide whether a call may run at `at`.
    ///
    /// In half-open only one trial is admitted. A trial that never reports
    /// back stops blocking once a full break duration has passed.
    pub fn permit_call_at(&self, at: Instant) -> bool {
        let mut transitions = Vec::new();
        let permitted = {
            let mut inner = self.inner.lock();
            match inner.state {
                CircuitState::Closed => true,
                CircuitState::HalfOpen => self.try_start_trial(&mut inner, at),
                CircuitState::Open => {
                    if self.break_elapsed(&inner, at) {
                        inner.state = CircuitState::HalfOpen;
                        inner.trial_started_at = Some(at);
                        transitions.push(Transition::HalfOpened);
                        true
                    } else {
                        false
                    }
                }
                CircuitState::Isolated => false,
            }
        };
        self.emit(transitions);
        permitted
    }

    pub fn permit_call(&self) -> bool {
        self.permit_call_at(self.clock.now())
    }

    /// Report a successful call finished at `at`.
    ///
    /// Ignored while open or isolated: such a call should have been rejected.
    pub fn report_success_at(&self, at: Instant) {
        let mut transitions = Vec::new();
        {
            let mut inner = self.inner.lock();
            match inner.state {
                CircuitState::Closed => inner.window.record_outcome(true, at),
                CircuitState::HalfOpen => {
                    Self::close(&mut inner);
                    transitions.push(Transition::Reset);
                }
                CircuitState::Open | CircuitState::Isolated => {}
            }
        }
        self.emit(transitions);
    }

    pub fn report_success(&self) {
        self.report_success_at(self.clock.now())
    }

    /// Report a failed call finished at `at`.
    pub fn report_failure_at(&self, failure: CallFailure, at: Instant) {
        let mut transitions = Vec::new();
        {
            let mut inner = self.inner.lock();
            match inner.state {
                CircuitState::Closed => {
                    inner.window.record_outcome(false, at);
                    let snapshot = inner.window.snapshot(at);
                    if snapshot.throughput >= self.config.minimum_throughput as usize
                        && snapshot.failure_rate >= self.config.failure_threshold
                    {
                        Self::trip(&mut inner, failure, at, &mut transitions);
                    }
                }
                CircuitState::HalfOpen => {
                    Self::trip(&mut inner, failure, at, &mut transitions);
                }
                CircuitState::Open => {
                    // Break over: the probe window opened and this failure is its trial.
                    if self.break_elapsed(&inner, at) {
                        inner.state = CircuitState::HalfOpen;
                        transitions.push(Transition::HalfOpened);
                        Self::trip(&mut inner, failure, at, &mut transitions);
                    }
                }
                CircuitState::Isolated => {}
            }
        }
        self.emit(transitions);
    }

    pub fn report_failure(&self, failure: CallFailure) {
        self.report_failure_at(failure, self.clock.now())
    }

    /// Report any error value as a failure.
    pub fn report_error<E>(&self, error: E)
    where
        E: StdError + Send + Sync + 'static,
    {
        self.report_failure(Arc::new(error))
    }

    /// Force the circuit into `Isolated`. Idempotent, emits nothing.
    pub fn isolate(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Isolated;
        inner.trial_started_at = None;
    }

    /// Force the circuit closed with fresh statistics.
    pub fn reset(&self) {
        {
            let mut inner = self.inner.lock();
            Self::close(&mut inner);
        }
        self.emit(vec![Transition::Reset]);
    }

    /// Run `operation` under the breaker.
    ///
    /// The failure stored as last exception and the one returned are the
    /// same shared value; downcast it to recover the concrete error.
    pub fn call<T, E, F>(&self, operation: F) -> Result<T, CallError<CallFailure>>
    where
        F: FnOnce() -> Result<T, E>,
        E: StdError + Send + Sync + 'static,
    {
        if !self.permit_call() {
            return Err(CallError::Rejected {
                state: self.state(),
            });
        }

        match operation() {
            Ok(value) => {
                self.report_success();
                Ok(value)
            }
            Err(e) => {
                let failure: CallFailure = Arc::new(e);
                self.report_failure(failure.clone());
                Err(CallError::Failed(failure))
            }
        }
    }

    /// Async counterpart of [`call`](Self::call). The lock is never held across the await.
    pub async fn call_async<T, E, F, Fut>(&self, operation: F) -> Result<T, CallError<CallFailure>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StdError + Send + Sync + 'static,
    {
        if !self.permit_call() {
            return Err(CallError::Rejected {
                state: self.state(),
            });
        }

        match operation().await {
            Ok(value) => {
                self.report_success();
                Ok(value)
            }
            Err(e) => {
                let failure: CallFailure = Arc::new(e);
                self.report_failure(failure.clone());
                Err(CallError::Failed(failure))
            }
        }
    }

    fn break_elapsed(&self, inner: &BreakerInner, at: Instant) -> bool {
        match inner.opened_at {
            Some(opened_at) => at.saturating_duration_since(opened_at) >= self.config.break_duration,
            None => true,
        }
    }

    fn try_start_trial(&self, inner: &mut BreakerInner, at: Instant) -> bool {
        if let Some(started) = inner.trial_started_at {
            if at.saturating_duration_since(started) < self.config.break_duration {
                return false;
            }
        }
        inner.trial_started_at = Some(at);
        true
    }

    fn trip(
        inner: &mut BreakerInner,
        failure: CallFailure,
        at: Instant,
        transitions: &mut Vec<Transition>,
    ) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(at);
        inner.trial_started_at = None;
        inner.last_exception = Some(failure.clone());
        transitions.push(Transition::Broke(failure));
    }

    fn close(inner: &mut BreakerInner) {
        inner.state = CircuitState::Closed;
        inner.window.clear();
        inner.last_exception = None;
        inner.opened_at = None;
        inner.trial_started_at = None;
    }

    fn emit(&self, transitions: Vec<Transition>) {
        let Some(events) = &self.events else {
            return;
        };
        for transition in transitions {
            match transition {
                Transition::Broke(failure) => events.on_break(&failure, self.config.break_duration),
                Transition::HalfOpened => events.on_half_open(),
                Transition::Reset => events.on_reset(),
            }
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("has_events", &self.events.is_some())
            .finish()
    }
}
