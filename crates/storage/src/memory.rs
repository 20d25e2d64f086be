//! In-memory recorder for dry runs and tests.

use crate::layout::{check_finite, timestamp, BatchAttributes, StoredBatch};
use parking_lot::Mutex;
use simsweep_core::{OpenMode, ResultRecorder, StorageError};
use simsweep_types::{BatchIndex, BatchKey, NormalizedResult, ParameterAssignment};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<BatchKey, StoredBatch>,
    closed: bool,
}

/// Recorder that keeps entries in memory.
///
/// Clones share the same entries, so a caller can keep a clone to inspect
/// what a runner recorded after handing the original over.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    label: PathBuf,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the recorder was opened with.
    pub fn label(&self) -> &Path {
        &self.label
    }

    /// Snapshot of all entries in batch order.
    pub fn entries(&self) -> Vec<StoredBatch> {
        self.state.lock().entries.values().cloned().collect()
    }

    /// Look up one entry.
    pub fn get(&self, key: BatchKey) -> Option<StoredBatch> {
        self.state.lock().entries.get(&key).cloned()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Check if the recorder has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl ResultRecorder for MemoryRecorder {
    /// Memory recorders have no backing path; it is kept as a label only.
    fn open(path: &Path, _mode: OpenMode) -> Result<Self, StorageError> {
        Ok(Self {
            label: path.to_path_buf(),
            state: Arc::default(),
        })
    }

    fn record(
        &mut self,
        key: BatchKey,
        assignment: &ParameterAssignment,
        description: &str,
        result: &NormalizedResult,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StorageError::Unavailable("memory store is closed".into()));
        }
        if state.entries.contains_key(&key) {
            return Err(StorageError::KeyExists(key));
        }
        check_finite(key, result)?;
        state.entries.insert(
            key,
            StoredBatch {
                key,
                attributes: BatchAttributes {
                    index: key.index(),
                    assignment: assignment.clone(),
                    description: description.to_string(),
                    timestamp: timestamp(),
                },
                result: result.clone(),
            },
        );
        Ok(())
    }

    fn next_index(&self) -> BatchIndex {
        self.state
            .lock()
            .entries
            .keys()
            .next_back()
            .map_or(BatchIndex::FIRST, |key| key.index().next())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.state.lock().closed = true;
        Ok(())
    }
}
