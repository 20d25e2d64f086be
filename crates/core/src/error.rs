//! Error types for the sweep pipeline stages.

use simsweep_types::{BatchKey, BatchStage};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a simulation session (external engine).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The artifact could not be resolved or loaded by the engine.
    #[error("Failed to load artifact '{artifact}': {reason}")]
    ArtifactLoad { artifact: String, reason: String },

    /// A parameter target does not exist or rejected its value.
    #[error("Failed to bind parameter '{key}': {reason}")]
    ParameterBinding { key: String, reason: String },

    /// The engine run failed.
    #[error("Execution failed: {diagnostic}")]
    Execution { diagnostic: String },

    /// A capability was invoked out of lifecycle order.
    #[error("Session cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Releasing engine resources failed.
    #[error("Failed to release session: {0}")]
    Release(String),
}

/// Errors raised while extracting channels from raw output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// A declared channel is absent from the raw output.
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// A trace has inconsistent time and value lengths.
    #[error("Malformed trace '{name}': {time_len} timestamps, {value_len} values")]
    MalformedTrace {
        name: String,
        time_len: usize,
        value_len: usize,
    },

    /// Two extracted channels resolve to the same name.
    #[error("Duplicate channel: {0}")]
    DuplicateChannel(String),
}

/// Errors raised by a result recorder.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An incompatible entry already exists at the key.
    #[error("Entry {0} already exists in store")]
    KeyExists(BatchKey),

    /// I/O failure writing one entry.
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry could not be encoded.
    #[error("Failed to encode {what}: {reason}")]
    Serialize { what: String, reason: String },

    /// Stored data does not match the expected layout.
    #[error("Corrupt store entry at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The store itself can no longer be written.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether the store is unusable and the sweep must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// A failure of one batch, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl BatchError {
    /// True if this failure makes further batches pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BatchError::Storage(e) if e.is_fatal())
    }
}

/// A batch error paired with the pipeline stage it came from.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: BatchStage,
    #[source]
    pub source: BatchError,
}

impl StageError {
    /// Tag an error with its stage.
    pub fn new(stage: BatchStage, source: impl Into<BatchError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
