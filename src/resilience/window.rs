//! Rolling failure statistics over a trailing time window.
//!
//! Outcomes are kept in arrival order. Anything older than the sampling
//! duration relative to the query time is dropped lazily on the next
//! record or snapshot; there is no background sweep.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Throughput and failure rate at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSnapshot {
    /// Outcomes inside the window.
    pub throughput: usize,
    /// Failed / total inside the window, 0.0 when empty.
    pub failure_rate: f64,
}

#[derive(Debug)]
pub struct FailureWindow {
    sampling_duration: Duration,
    outcomes: VecDeque<(Instant, bool)>,
    failures: usize,
}

impl FailureWindow {
    pub fn new(sampling_duration: Duration) -> Self {
        Self {
            sampling_duration,
            outcomes: VecDeque::new(),
            failures: 0,
        }
    }

    pub fn sampling_duration(&self) -> Duration {
        self.sampling_duration
    }

    /// Append an outcome observed at `at`.
    pub fn record_outcome(&mut self, success: bool, at: Instant) {
        self.purge(at);
        self.outcomes.push_back((at, success));
        if !success {
            self.failures += 1;
        }
    }

    /// Purge expired outcomes and compute statistics over the rest.
    pub fn snapshot(&mut self, at: Instant) -> WindowSnapshot {
        self.purge(at);

        let throughput = self.outcomes.len();
        let failure_rate = if throughput == 0 {
            0.0
        } else {
            self.failures as f64 / throughput as f64
        };

        WindowSnapshot {
            throughput,
            failure_rate,
        }
    }

    /// Drop every recorded outcome.
    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }

    // An outcome expires once its age reaches the sampling duration.
    // Timestamps later than `at` have age zero and are kept.
    fn purge(&mut self, at: Instant) {
        while let Some(&(recorded_at, success)) = self.outcomes.front() {
            if at.saturating_duration_since(recorded_at) < self.sampling_duration {
                break;
            }
            self.outcomes.pop_front();
            if !success {
                self.failures = self.failures.saturating_sub(1);
            }
        }
    }
}
