//! Per-call time budget.

use std::time::{Duration, Instant};

/// Soft deadline for one extraction call.
///
/// OCR inference has no upper bound on latency. Once the budget is spent,
/// remaining attempts are skipped and selection runs on what was collected.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Start a deadline now. `None` never expires.
    pub fn new(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn expired(&self) -> bool {
        self.budget
            .is_some_and(|budget| self.started.elapsed() >= budget)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::unbounded()
    }
}
