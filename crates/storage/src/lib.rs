//! Result recorders for simsweep.
//!
//! - [`DirectoryStore`] - hierarchical on-disk store, one directory per batch
//! - [`StoreReader`] - reads a directory store back
//! - [`MemoryRecorder`] - keeps entries in memory
//!
//! Every entry carries [`BatchAttributes`]: the batch index, the assignment
//! that produced it, the batch description and a timestamp.

mod directory;
mod layout;
mod memory;
mod reader;

pub use directory::DirectoryStore;
pub use layout::{BatchAttributes, Manifest, StoredBatch};
pub use memory::MemoryRecorder;
pub use reader::StoreReader;
