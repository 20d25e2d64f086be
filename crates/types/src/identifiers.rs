//! Batch identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a batch in a sweep's expansion order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BatchIndex(pub usize);

impl BatchIndex {
    /// The first batch of a sweep.
    pub const FIRST: Self = BatchIndex(0);

    /// Get the next batch index.
    pub fn next(self) -> Self {
        BatchIndex(self.0 + 1)
    }

    /// Storage key derived from this index.
    pub fn key(self) -> BatchKey {
        BatchKey::from(self)
    }
}

impl fmt::Display for BatchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for BatchIndex {
    fn from(index: usize) -> Self {
        BatchIndex(index)
    }
}

/// Storage key for one batch entry.
///
/// Rendered as `batch_00042`; the zero padding keeps lexical and numeric
/// order identical for sweeps of up to 100 000 batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey(BatchIndex);

impl BatchKey {
    /// Prefix shared by every batch key.
    pub const PREFIX: &'static str = "batch_";

    /// The batch index this key was derived from.
    pub fn index(&self) -> BatchIndex {
        self.0
    }
}

impl From<BatchIndex> for BatchKey {
    fn from(index: BatchIndex) -> Self {
        BatchKey(index)
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:05}", Self::PREFIX, self.0 .0)
    }
}

/// Error parsing a [`BatchKey`] from its rendered form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a batch key: {0:?}")]
pub struct ParseBatchKeyError(pub String);

impl FromStr for BatchKey {
    type Err = ParseBatchKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| ParseBatchKeyError(s.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseBatchKeyError(s.to_string()));
        }
        digits
            .parse::<usize>()
            .map(|index| BatchKey(BatchIndex(index)))
            .map_err(|_| ParseBatchKeyError(s.to_string()))
    }
}
