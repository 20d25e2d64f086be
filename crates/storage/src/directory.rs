//! Hierarchical on-disk result store.

use crate::layout::{
    check_finite, entry_dir, io_error, is_staging_name, list_keys, read_json, staging_dir, timestamp, write_json,
    write_json_atomic, BatchAttributes, Manifest, ATTRIBUTES_FILE, CHANNELS_FILE, MANIFEST_FILE,
};
use simsweep_core::{OpenMode, ResultRecorder, StorageError};
use simsweep_types::{BatchIndex, BatchKey, NormalizedResult, ParameterAssignment};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory-backed store with one sub-directory per batch.
///
/// Entries are staged under a hidden name and renamed into place once both
/// channels and attributes are on disk, so a crash mid-write never leaves a
/// visible entry without its metadata.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    closed: bool,
    recorded: usize,
    next: BatchIndex,
}

impl DirectoryStore {
    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of entries recorded through this handle.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Check if the store has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> StorageError {
        StorageError::Unavailable(format!("{}: {}", self.root.display(), reason))
    }

    /// Make sure a directory about to be truncated really is a store.
    fn check_truncatable(root: &Path) -> Result<(), StorageError> {
        let manifest = root.join(MANIFEST_FILE);
        if manifest.is_file() {
            return Ok(());
        }
        let mut entries = fs::read_dir(root).map_err(io_error(root))?;
        if entries.next().is_some() {
            return Err(StorageError::Unavailable(format!(
                "{} exists and is not a simsweep store; refusing to overwrite",
                root.display()
            )));
        }
        Ok(())
    }

    fn remove_stale_staging(root: &Path) -> Result<(), StorageError> {
        for entry in fs::read_dir(root).map_err(io_error(root))? {
            let entry = entry.map_err(io_error(root))?;
            let name = entry.file_name();
            if is_staging_name(&name.to_string_lossy()) {
                warn!(entry = %name.to_string_lossy(), "Removing incomplete entry from earlier run");
                fs::remove_dir_all(entry.path()).map_err(io_error(&entry.path()))?;
            }
        }
        Ok(())
    }

    fn ensure_usable(&self) -> Result<(), StorageError> {
        if self.closed {
            return Err(self.unavailable("store is closed"));
        }
        if !self.root.is_dir() {
            return Err(self.unavailable("store directory is missing"));
        }
        if !self.root.join(MANIFEST_FILE).is_file() {
            return Err(self.unavailable("store manifest is missing"));
        }
        Ok(())
    }

    fn write_entry(
        staging: &Path,
        attributes: &BatchAttributes,
        result: &NormalizedResult,
    ) -> Result<(), StorageError> {
        fs::create_dir(staging).map_err(io_error(staging))?;
        write_json(&staging.join(CHANNELS_FILE), result)?;
        write_json(&staging.join(ATTRIBUTES_FILE), attributes)
    }
}

impl ResultRecorder for DirectoryStore {
    fn open(path: &Path, mode: OpenMode) -> Result<Self, StorageError> {
        let root = path.to_path_buf();
        let exists = root.exists();
        if exists && !root.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut next = BatchIndex::FIRST;
        match mode {
            OpenMode::Truncate if exists => {
                Self::check_truncatable(&root)?;
                info!(path = %root.display(), "Overwriting existing store");
                fs::remove_dir_all(&root).map_err(io_error(&root))?;
                fs::create_dir_all(&root).map_err(io_error(&root))?;
                write_json_atomic(&root.join(MANIFEST_FILE), &Manifest::current())?;
            }
            OpenMode::Append if exists && root.join(MANIFEST_FILE).is_file() => {
                let manifest: Manifest = read_json(&root.join(MANIFEST_FILE))?;
                manifest.check(&root)?;
                Self::remove_stale_staging(&root)?;
                if let Some(last) = list_keys(&root)?.last() {
                    next = last.index().next();
                }
                debug!(path = %root.display(), %next, "Appending to existing store");
            }
            OpenMode::Append if exists => {
                Self::check_truncatable(&root)?;
                write_json_atomic(&root.join(MANIFEST_FILE), &Manifest::current())?;
            }
            _ => {
                fs::create_dir_all(&root).map_err(io_error(&root))?;
                write_json_atomic(&root.join(MANIFEST_FILE), &Manifest::current())?;
            }
        }

        info!(path = %root.display(), ?mode, "Opened result store");
        Ok(Self {
            root,
            closed: false,
            recorded: 0,
            next,
        })
    }

    fn record(
        &mut self,
        key: BatchKey,
        assignment: &ParameterAssignment,
        description: &str,
        result: &NormalizedResult,
    ) -> Result<(), StorageError> {
        self.ensure_usable()?;
        check_finite(key, result)?;

        let target = entry_dir(&self.root, key);
        if target.exists() {
            return Err(StorageError::KeyExists(key));
        }

        let staging = staging_dir(&self.root, key);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(io_error(&staging))?;
        }

        let attributes = BatchAttributes {
            index: key.index(),
            assignment: assignment.clone(),
            description: description.to_string(),
            timestamp: timestamp(),
        };

        let written = Self::write_entry(&staging, &attributes, result)
            .and_then(|()| fs::rename(&staging, &target).map_err(io_error(&target)));
        if let Err(e) = written {
            if staging.exists() {
                let _ = fs::remove_dir_all(&staging);
            }
            // root vanished underneath us: no later batch can succeed either
            if !self.root.is_dir() {
                return Err(self.unavailable(e));
            }
            return Err(e);
        }

        self.recorded += 1;
        self.next = self.next.max(key.index().next());
        debug!(%key, channels = result.len(), "Recorded batch");
        Ok(())
    }

    fn next_index(&self) -> BatchIndex {
        self.next
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if !self.closed {
            self.closed = true;
            info!(path = %self.root.display(), recorded = self.recorded, "Closed result store");
        }
        Ok(())
    }
}
