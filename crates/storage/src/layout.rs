//! On-disk layout of a directory store.
//!
//! ```text
//! <root>/
//!   store.json                  manifest
//!   batch_00000/
//!     channels.json             channel name -> series | scalar
//!     attributes.json           index, assignment, description, timestamp
//!   .batch_00001.partial/       entry being written (ignored by readers)
//! ```

use serde::{Deserialize, Serialize};
use simsweep_core::StorageError;
use simsweep_types::{BatchIndex, BatchKey, NormalizedResult, ParameterAssignment};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub(crate) const MANIFEST_FILE: &str = "store.json";
pub(crate) const CHANNELS_FILE: &str = "channels.json";
pub(crate) const ATTRIBUTES_FILE: &str = "attributes.json";
pub(crate) const STORE_FORMAT: &str = "simsweep-store";
pub(crate) const STORE_VERSION: u32 = 1;

/// Store-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format: String,
    pub version: u32,
    /// RFC 3339 creation time.
    pub created: String,
}

impl Manifest {
    pub(crate) fn current() -> Self {
        Self {
            format: STORE_FORMAT.to_string(),
            version: STORE_VERSION,
            created: timestamp(),
        }
    }

    pub(crate) fn check(&self, path: &Path) -> Result<(), StorageError> {
        if self.format != STORE_FORMAT || self.version != STORE_VERSION {
            return Err(StorageError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported store format {} v{}",
                    self.format, self.version
                ),
            });
        }
        Ok(())
    }
}

/// Metadata attached to one batch entry.
///
/// This is what maps a stored result back to the sweep point that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAttributes {
    pub index: BatchIndex,
    pub assignment: ParameterAssignment,
    pub description: String,
    /// RFC 3339 time the entry was written.
    pub timestamp: String,
}

/// One entry read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBatch {
    pub key: BatchKey,
    pub attributes: BatchAttributes,
    pub result: NormalizedResult,
}

/// Current time in RFC 3339, second precision.
pub(crate) fn timestamp() -> String {
    humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
}

pub(crate) fn entry_dir(root: &Path, key: BatchKey) -> PathBuf {
    root.join(key.to_string())
}

pub(crate) fn staging_dir(root: &Path, key: BatchKey) -> PathBuf {
    root.join(format!(".{}.partial", key))
}

pub(crate) fn is_staging_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".partial")
}

/// Keys of all complete entries under `root`, in batch order.
pub(crate) fn list_keys(root: &Path) -> Result<Vec<BatchKey>, StorageError> {
    let mut keys = Vec::new();
    for entry in fs::read_dir(root).map_err(io_error(root))? {
        let entry = entry.map_err(io_error(root))?;
        let Ok(key) = entry.file_name().to_string_lossy().parse::<BatchKey>() else {
            continue;
        };
        if entry.path().is_dir() {
            keys.push(key);
        }
    }
    keys.sort();
    Ok(keys)
}

/// Reject channels JSON cannot carry; they would be written as `null`.
pub(crate) fn check_finite(key: BatchKey, result: &NormalizedResult) -> Result<(), StorageError> {
    match result.channels().find(|(_, data)| !data.is_finite()) {
        Some((name, _)) => Err(StorageError::Serialize {
            what: format!("{}/{}", key, name),
            reason: "channel holds a non-finite value".to_string(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serialize {
        what: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut file = fs::File::create(path).map_err(io_error(path))?;
    file.write_all(&bytes).map_err(io_error(path))?;
    file.sync_all().map_err(io_error(path))
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StorageError> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write a file via a sibling temp file and rename.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let tmp = path.with_extension("json.tmp");
    write_json(&tmp, value)?;
    fs::rename(&tmp, path).map_err(io_error(path))
}
