//! Test fixtures for simsweep.
//!
//! - [`ScriptedSession`] - in-process engine with failure injection and a call journal
//! - [`FailingRecorder`] - memory recorder that fails at chosen batches
//! - [`sample_output`] - deterministic raw output derived from an assignment

mod recorder;
mod session;

pub use recorder::FailingRecorder;
pub use session::{sample_output, Journal, ScriptedSession, SessionCall};
