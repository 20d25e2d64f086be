//! Wire protocol between [`CommandSession`](crate::CommandSession) and an engine process.
//!
//! One run is one process invocation:
//!
//! ```text
//! stdin:  {"artifact": "...", "parameters": {...}, "run": {...}}
//! stdout: {"traces": [{"name", "port", "time", "values"}...], "scalars": {...}, "diagnostics": [...]}
//! ```
//!
//! A non-zero exit status means the run failed; stderr carries the diagnostic.

use serde::{Deserialize, Serialize};
use simsweep_core::SessionError;
use simsweep_types::{ParameterAssignment, RawOutput, RunConfig};

/// Request written to the engine's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// Resolved artifact path.
    pub artifact: String,
    /// Model parameter values for this batch.
    pub parameters: ParameterAssignment,
    /// Fixed run-control values.
    pub run: RunConfig,
}

impl EngineRequest {
    pub fn encode(&self) -> Result<Vec<u8>, SessionError> {
        serde_json::to_vec(self).map_err(|e| SessionError::Execution {
            diagnostic: format!("failed to encode engine request: {}", e),
        })
    }
}

/// Decode the engine's stdout into a raw output.
pub fn decode_output(stdout: &[u8]) -> Result<RawOutput, SessionError> {
    serde_json::from_slice(stdout).map_err(|e| SessionError::Execution {
        diagnostic: format!("invalid engine output: {}", e),
    })
}
