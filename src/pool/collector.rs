//! Result collector, the fan-in point for every worker in a run.

use tokio::sync::Mutex;

use crate::types::{TagOutcome, TaskFailure};

/// Gathers outcomes and failure records from concurrent workers.
///
/// Unbounded: recording never waits on capacity and never drops an item.
/// One collector belongs to one run; [`drain`](Self::drain) is meant to be
/// called once the pool has been shut down.
#[derive(Debug, Default)]
pub struct Collector {
    outcomes: Mutex<Vec<TagOutcome>>,
    failures: Mutex<Vec<TaskFailure>>,
}

impl Collector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector pre-sized for `tasks` outcomes
    pub fn with_capacity(tasks: usize) -> Self {
        Self {
            outcomes: Mutex::new(Vec::with_capacity(tasks)),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Record a successful lookup
    pub async fn record(&self, outcome: TagOutcome) {
        self.outcomes.lock().await.push(outcome);
    }

    /// Record a failed lookup
    pub async fn record_failure(&self, failure: TaskFailure) {
        self.failures.lock().await.push(failure);
    }

    /// Number of (outcomes, failures) recorded so far
    #[cfg(test)]
    pub(crate) async fn counts(&self) -> (usize, usize) {
        let outcomes = self.outcomes.lock().await.len();
        let failures = self.failures.lock().await.len();
        (outcomes, failures)
    }

    /// Take everything recorded so far, leaving the collector empty
    pub async fn drain(&self) -> (Vec<TagOutcome>, Vec<TaskFailure>) {
        let outcomes = std::mem::take(&mut *self.outcomes.lock().await);
        let failures = std::mem::take(&mut *self.failures.lock().await);
        (outcomes, failures)
    }
}
