//! Per-sweep audit trail of batch outcomes.

use crate::{BatchIndex, BatchKey, ParameterAssignment};
use std::fmt;
use std::time::Duration;

/// Pipeline stage at which a batch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchStage {
    /// Binding parameters into the session.
    Apply,
    /// Running the engine.
    Execute,
    /// Extracting channels from raw output.
    Extract,
    /// Persisting the result.
    Record,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchStage::Apply => "apply",
            BatchStage::Execute => "execute",
            BatchStage::Extract => "extract",
            BatchStage::Record => "record",
        };
        f.write_str(name)
    }
}

/// Outcome status of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Succeeded,
    Failed {
        /// Stage that failed.
        stage: BatchStage,
        /// Rendered error detail.
        error: String,
    },
}

impl BatchStatus {
    /// Check if the batch succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, BatchStatus::Succeeded)
    }
}

/// One attempted batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Position in the sweep.
    pub index: BatchIndex,
    /// Store key the batch was recorded under, or would have been.
    pub key: BatchKey,
    pub assignment: ParameterAssignment,
    pub description: String,
    pub status: BatchStatus,
    /// Wall-clock time spent on the batch.
    pub elapsed: Duration,
}

/// Ordered, immutable record of every attempted batch of a sweep.
///
/// Built through [`SummaryBuilder`]; once finished it can only be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    outcomes: Vec<BatchOutcome>,
    stopped_early: bool,
}

impl RunSummary {
    /// All outcomes in execution order.
    pub fn outcomes(&self) -> &[BatchOutcome] {
        &self.outcomes
    }

    /// Number of attempted batches.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if no batch was attempted.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of succeeded batches.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_success())
            .count()
    }

    /// Number of failed batches.
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Failed outcomes in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    /// True if the sweep ended before exhausting the expansion
    /// (batch limit or stop signal).
    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }

    /// True if every attempted batch succeeded and the sweep ran to the end.
    pub fn is_complete_success(&self) -> bool {
        !self.stopped_early && self.failed() == 0
    }

    /// Total wall-clock time across attempted batches.
    pub fn total_elapsed(&self) -> Duration {
        self.outcomes.iter().map(|o| o.elapsed).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} batches attempted: {} succeeded, {} failed{}",
            self.len(),
            self.succeeded(),
            self.failed(),
            if self.stopped_early {
                " (stopped early)"
            } else {
                ""
            }
        )?;
        for outcome in self.failures() {
            if let BatchStatus::Failed { stage, error } = &outcome.status {
                writeln!(
                    f,
                    "  batch {} failed at {}: {} [{}]",
                    outcome.index, stage, error, outcome.assignment
                )?;
            }
        }
        Ok(())
    }
}

/// Incrementally accumulates outcomes while a sweep runs.
#[derive(Debug, Default)]
pub struct SummaryBuilder {
    outcomes: Vec<BatchOutcome>,
}

impl SummaryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome. Outcomes must arrive in batch order.
    pub fn push(&mut self, outcome: BatchOutcome) {
        debug_assert!(
            self.outcomes
                .last()
                .map_or(true, |last| last.index < outcome.index),
            "outcomes must be pushed in batch order"
        );
        self.outcomes.push(outcome);
    }

    /// Number of outcomes so far.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Finalize into an immutable summary.
    pub fn finish(self, stopped_early: bool) -> RunSummary {
        RunSummary {
            outcomes: self.outcomes,
            stopped_early,
        }
    }
}
