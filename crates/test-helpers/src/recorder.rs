use simsweep_core::{OpenMode, ResultRecorder, StorageError};
use simsweep_storage::MemoryRecorder;
use simsweep_types::{BatchIndex, BatchKey, NormalizedResult, ParameterAssignment};
use std::collections::HashSet;
use std::path::Path;

/// Memory recorder that fails at chosen batch indices.
#[derive(Debug, Clone, Default)]
pub struct FailingRecorder {
    inner: MemoryRecorder,
    fail_at: HashSet<BatchIndex>,
    unavailable_at: Option<BatchIndex>,
}

impl FailingRecorder {
    /// Wrap a memory recorder; keep a clone of it to inspect entries.
    pub fn new(inner: MemoryRecorder) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail recording of batch `index` with a per-batch error.
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at.insert(BatchIndex(index));
        self
    }

    /// Report the store unavailable from batch `index` on.
    pub fn unavailable_from(mut self, index: usize) -> Self {
        self.unavailable_at = Some(BatchIndex(index));
        self
    }
}

impl ResultRecorder for FailingRecorder {
    fn open(path: &Path, mode: OpenMode) -> Result<Self, StorageError> {
        Ok(Self::new(MemoryRecorder::open(path, mode)?))
    }

    fn record(
        &mut self,
        key: BatchKey,
        assignment: &ParameterAssignment,
        description: &str,
        result: &NormalizedResult,
    ) -> Result<(), StorageError> {
        if self.unavailable_at.is_some_and(|from| key.index() >= from) {
            return Err(StorageError::Unavailable("scripted store loss".into()));
        }
        if self.fail_at.contains(&key.index()) {
            return Err(StorageError::Serialize {
                what: key.to_string(),
                reason: "scripted failure".into(),
            });
        }
        self.inner.record(key, assignment, description, result)
    }

    fn next_index(&self) -> BatchIndex {
        self.inner.next_index()
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.inner.close()
    }
}
