//! Read-back access to a directory store.

use crate::layout::{
    entry_dir, list_keys, read_json, BatchAttributes, Manifest, StoredBatch, ATTRIBUTES_FILE,
    CHANNELS_FILE, MANIFEST_FILE,
};
use simsweep_core::StorageError;
use simsweep_types::{BatchKey, NormalizedResult};
use std::path::{Path, PathBuf};

/// Read-only view of a store written by [`DirectoryStore`](crate::DirectoryStore).
///
/// Only complete entries are visible; staged partial entries are skipped.
#[derive(Debug)]
pub struct StoreReader {
    root: PathBuf,
    manifest: Manifest,
}

impl StoreReader {
    /// Open an existing store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = path.as_ref().to_path_buf();
        let manifest: Manifest = read_json(&root.join(MANIFEST_FILE))?;
        manifest.check(&root)?;
        Ok(Self { root, manifest })
    }

    /// Store manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Keys of all complete entries, in batch order.
    pub fn keys(&self) -> Result<Vec<BatchKey>, StorageError> {
        list_keys(&self.root)
    }

    /// Read one entry.
    pub fn read(&self, key: BatchKey) -> Result<StoredBatch, StorageError> {
        let dir = entry_dir(&self.root, key);
        let attributes: BatchAttributes = read_json(&dir.join(ATTRIBUTES_FILE))?;
        if attributes.index != key.index() {
            return Err(StorageError::Corrupt {
                path: dir,
                reason: format!("entry labelled as batch {}", attributes.index),
            });
        }
        let result: NormalizedResult = read_json(&dir.join(CHANNELS_FILE))?;
        Ok(StoredBatch {
            key,
            attributes,
            result,
        })
    }

    /// Read every complete entry in batch order.
    pub fn read_all(&self) -> Result<Vec<StoredBatch>, StorageError> {
        self.keys()?.into_iter().map(|key| self.read(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectoryStore;
    use simsweep_core::{OpenMode, ResultRecorder};
    use simsweep_types::{BatchIndex, ChannelData, ParameterAssignment};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_keys_sorted_and_partials_hidden() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path(), OpenMode::Truncate).unwrap();
        let result = NormalizedResult::new().with("x", ChannelData::Scalar(1.0));
        for i in [2, 0, 1] {
            store
                .record(
                    BatchIndex(i).key(),
                    &ParameterAssignment::new(),
                    "",
                    &result,
                )
                .unwrap();
        }
        fs::create_dir(dir.path().join(".batch_00003.partial")).unwrap();

        let reader = StoreReader::open(dir.path()).unwrap();
        let keys = reader.keys().unwrap();
        assert_eq!(
            keys,
            vec![BatchIndex(0).key(), BatchIndex(1).key(), BatchIndex(2).key()]
        );
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            StoreReader::open(dir.path()),
            Err(StorageError::Io { .. })
        ));
    }

    #[test]
    fn test_mislabelled_entry_is_corrupt() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::open(dir.path(), OpenMode::Truncate).unwrap();
        store
            .record(
                BatchIndex(0).key(),
                &ParameterAssignment::new(),
                "",
                &NormalizedResult::new(),
            )
            .unwrap();
        fs::rename(dir.path().join("batch_00000"), dir.path().join("batch_00005")).unwrap();

        let reader = StoreReader::open(dir.path()).unwrap();
        assert!(matches!(
            reader.read(BatchIndex(5).key()),
            Err(StorageError::Corrupt { .. })
        ));
    }
}
