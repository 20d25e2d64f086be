//! Capability traits for the sweep pipeline.
//!
//! The runner only ever sees these three seams:
//!
//! - [`SimulationSession`] - the external engine: load, bind, run, release
//! - [`OutputProcessor`] - raw run output to named channels
//! - [`ResultRecorder`] - persisting one batch with its provenance
//!
//! Implementations are chosen when the runner is built and passed in as
//! trait objects; nothing in the runner depends on a concrete engine,
//! extraction strategy or storage format.

use crate::{ProcessError, SessionError, StorageError};
use simsweep_types::{
    BatchIndex, BatchKey, NormalizedResult, ParameterAssignment, RawOutput, RunConfig,
};
use std::path::Path;

/// An external, stateful simulation engine session.
///
/// # Lifecycle
///
/// ```text
/// Unprepared ──prepare──▶ Prepared ──apply──▶ Applied ──execute──▶ Executed
///                            ▲                                        │
///                            └────────────── apply (next batch) ◀────┘
/// any state ──release──▶ Released (terminal)
/// ```
///
/// Implementations may assume callers respect this order; wrap them in
/// [`SessionGuard`](crate::SessionGuard) to have it enforced.
///
/// All calls block until the engine answers. Sessions are not reentrant and
/// never see two batches in flight.
pub trait SimulationSession {
    /// Load the simulation artifact. Called exactly once per session.
    fn prepare(&mut self, artifact: &str) -> Result<(), SessionError>;

    /// Push an assignment plus the fixed run configuration into the artifact.
    ///
    /// Fails with [`SessionError::ParameterBinding`] naming the offending key
    /// if a target does not exist or rejects its value.
    fn apply(
        &mut self,
        assignment: &ParameterAssignment,
        run_config: &RunConfig,
    ) -> Result<(), SessionError>;

    /// Run once with the applied values and return the raw output.
    fn execute(&mut self) -> Result<RawOutput, SessionError>;

    /// Free engine resources.
    fn release(&mut self) -> Result<(), SessionError>;
}

impl<S: SimulationSession + ?Sized> SimulationSession for Box<S> {
    fn prepare(&mut self, artifact: &str) -> Result<(), SessionError> {
        (**self).prepare(artifact)
    }

    fn apply(
        &mut self,
        assignment: &ParameterAssignment,
        run_config: &RunConfig,
    ) -> Result<(), SessionError> {
        (**self).apply(assignment, run_config)
    }

    fn execute(&mut self) -> Result<RawOutput, SessionError> {
        (**self).execute()
    }

    fn release(&mut self) -> Result<(), SessionError> {
        (**self).release()
    }
}

/// Turns raw engine output into a normalized, named-channel result.
///
/// Processors must be pure with respect to the raw output: extracting the
/// same output twice yields the same result.
pub trait OutputProcessor {
    /// Extract the channels this processor is configured for.
    fn extract(&self, raw: &RawOutput) -> Result<NormalizedResult, ProcessError>;
}

/// How a recorder treats an existing store at its path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Discard any existing store and start fresh.
    #[default]
    Truncate,
    /// Keep existing entries; new batches are keyed after the last one.
    Append,
}

/// Persists normalized results together with their originating assignment.
///
/// The assignment and description written by [`record`](Self::record) are
/// the only link from stored data back to sweep parameters, so an entry must
/// never become visible without them.
pub trait ResultRecorder {
    /// Acquire the backing store at `path`.
    fn open(path: &Path, mode: OpenMode) -> Result<Self, StorageError>
    where
        Self: Sized;

    /// First index not yet taken in the store.
    ///
    /// A sweep keys its batches from here, so appending to a non-empty store
    /// never collides with earlier entries.
    fn next_index(&self) -> BatchIndex {
        BatchIndex::FIRST
    }

    /// Write one batch's channels and metadata atomically.
    ///
    /// Errors are local to the batch unless [`StorageError::is_fatal`] says
    /// the store itself is unusable.
    fn record(
        &mut self,
        key: BatchKey,
        assignment: &ParameterAssignment,
        description: &str,
        result: &NormalizedResult,
    ) -> Result<(), StorageError>;

    /// Release the store. Idempotent, and must succeed after failed records.
    fn close(&mut self) -> Result<(), StorageError>;
}
