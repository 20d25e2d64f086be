//! Sweep-level errors.

use simsweep_core::{BatchError, SessionError, StageError};
use simsweep_types::{BatchIndex, RunSummary, SpecError};
use thiserror::Error;

/// Errors that end a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The model-parameter spec cannot be expanded. No batch ran.
    #[error("Invalid parameter spec: {0}")]
    InvalidSpec(#[from] SpecError),

    /// The session could not load the artifact.
    #[error("Failed to prepare session: {0}")]
    Prepare(#[source] SessionError),

    /// A batch failed under halt-on-error.
    #[error("Batch {index} failed: {source}")]
    BatchFailed {
        index: BatchIndex,
        source: StageError,
        /// Outcomes up to and including the failed batch.
        summary: RunSummary,
    },

    /// The store became unusable; aborts under every policy.
    #[error("Store unavailable at batch {index}: {source}")]
    StoreUnavailable {
        index: BatchIndex,
        source: StageError,
        summary: RunSummary,
    },

    /// The runner already ran or was closed.
    #[error("Runner is closed")]
    Closed,

    /// Releasing the session or closing the store failed.
    #[error("Failed to close runner: {0}")]
    Close(#[source] BatchError),
}

impl SweepError {
    /// Partial summary for sweeps that stopped at a batch.
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            SweepError::BatchFailed { summary, .. } | SweepError::StoreUnavailable { summary, .. } => {
                Some(summary)
            }
            _ => None,
        }
    }
}

/// Error returned by an after-batch hook.
///
/// Hook errors never fail a batch; the runner logs and drops them.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}
