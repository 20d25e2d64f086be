//! Core abstractions for simsweep.
//!
//! Defines the three capability traits the batch runner is built from and
//! the error taxonomy shared across pipeline stages:
//!
//! | Stage   | Trait                 | Error           |
//! |---------|-----------------------|-----------------|
//! | apply   | [`SimulationSession`] | [`SessionError`] |
//! | execute | [`SimulationSession`] | [`SessionError`] |
//! | extract | [`OutputProcessor`]   | [`ProcessError`] |
//! | record  | [`ResultRecorder`]    | [`StorageError`] |

mod error;
mod session;
mod traits;

pub use error::{BatchError, ProcessError, SessionError, StageError, StorageError};
pub use session::{SessionGuard, SessionState};
pub use traits::{OpenMode, OutputProcessor, ResultRecorder, SimulationSession};
