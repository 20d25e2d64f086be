//! Simulation session adapter for external engines.
//!
//! [`CommandSession`] implements [`SimulationSession`](simsweep_core::SimulationSession)
//! by launching an engine process per run and speaking a small JSON
//! protocol over its standard streams (see [`EngineRequest`]).
//!
//! ```text
//! prepare(artifact) ── resolve in search_dir (+ extensions)
//! apply(assignment) ── check targets, stage request
//! execute()         ── spawn ─▶ stdin: request ─▶ stdout: raw output
//! release()         ── drop staged state
//! ```

mod command;
mod config;
mod protocol;

pub use command::CommandSession;
pub use config::CommandSessionConfig;
pub use protocol::{decode_output, EngineRequest};
