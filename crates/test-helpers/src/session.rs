use parking_lot::Mutex;
use simsweep_core::{SessionError, SimulationSession};
use simsweep_types::{ParameterAssignment, RawOutput, RawTrace, RunConfig, Scalar};
use std::collections::HashSet;
use std::sync::Arc;

/// One call observed by a [`ScriptedSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    Prepare(String),
    Apply(ParameterAssignment),
    Execute,
    Release,
}

/// Shared record of session calls; clones observe the same journal.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<SessionCall>>>);

impl Journal {
    pub fn push(&self, call: SessionCall) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.0.lock().clone()
    }

    /// Assignments applied so far, in order.
    pub fn applied(&self) -> Vec<ParameterAssignment> {
        self.0
            .lock()
            .iter()
            .filter_map(|call| match call {
                SessionCall::Apply(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &SessionCall) -> usize {
        self.0.lock().iter().filter(|c| *c == call).count()
    }

    pub fn released(&self) -> bool {
        self.count(&SessionCall::Release) > 0
    }
}

/// Deterministic output for an assignment.
///
/// Trace `y` (port 1) samples `gain * t` for `t` in `0..=2`, where `gain` is
/// the numeric value of parameter `gain` (1.0 if absent or non-numeric).
/// Scalar `params` holds the number of bound parameters.
pub fn sample_output(assignment: &ParameterAssignment) -> RawOutput {
    let gain = match assignment.get("gain") {
        Some(Scalar::Int(v)) => *v as f64,
        Some(Scalar::Float(v)) => *v,
        Some(Scalar::Text(s)) => s.parse().unwrap_or(1.0),
        _ => 1.0,
    };
    let time = vec![0.0, 1.0, 2.0];
    let values = time.iter().map(|t| gain * t).collect();

    let mut raw = RawOutput::default();
    raw.traces.push(RawTrace {
        name: "y".into(),
        port: 1,
        time,
        values,
    });
    raw.scalars.insert("params".into(), assignment.len() as f64);
    raw
}

/// In-process session that journals every call.
///
/// Batch indices count `apply` calls from zero.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    journal: Journal,
    fail_prepare: bool,
    fail_apply: HashSet<usize>,
    fail_execute: HashSet<usize>,
    empty_output: HashSet<usize>,
    applied: usize,
    current: Option<ParameterAssignment>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal handle for assertions after the session is moved.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    pub fn fail_apply_at(mut self, index: usize) -> Self {
        self.fail_apply.insert(index);
        self
    }

    pub fn fail_execute_at(mut self, index: usize) -> Self {
        self.fail_execute.insert(index);
        self
    }

    /// Produce an output without traces or scalars at `index`.
    pub fn empty_output_at(mut self, index: usize) -> Self {
        self.empty_output.insert(index);
        self
    }
}

impl SimulationSession for ScriptedSession {
    fn prepare(&mut self, artifact: &str) -> Result<(), SessionError> {
        self.journal.push(SessionCall::Prepare(artifact.to_string()));
        if self.fail_prepare {
            return Err(SessionError::ArtifactLoad {
                artifact: artifact.to_string(),
                reason: "scripted failure".into(),
            });
        }
        Ok(())
    }

    fn apply(
        &mut self,
        assignment: &ParameterAssignment,
        _run_config: &RunConfig,
    ) -> Result<(), SessionError> {
        self.journal.push(SessionCall::Apply(assignment.clone()));
        let index = self.applied;
        self.applied += 1;
        if self.fail_apply.contains(&index) {
            self.current = None;
            return Err(SessionError::ParameterBinding {
                key: assignment.keys().next().unwrap_or("<none>").to_string(),
                reason: format!("scripted failure at batch {}", index),
            });
        }
        self.current = Some(assignment.clone());
        Ok(())
    }

    fn execute(&mut self) -> Result<RawOutput, SessionError> {
        self.journal.push(SessionCall::Execute);
        let index = self.applied.saturating_sub(1);
        let assignment = self.current.take().ok_or(SessionError::InvalidState {
            operation: "execute",
            state: "not applied",
        })?;
        if self.fail_execute.contains(&index) {
            return Err(SessionError::Execution {
                diagnostic: format!("scripted failure at batch {}", index),
            });
        }
        if self.empty_output.contains(&index) {
            return Ok(RawOutput::default());
        }
        Ok(sample_output(&assignment))
    }

    fn release(&mut self) -> Result<(), SessionError> {
        self.journal.push(SessionCall::Release);
        Ok(())
    }
}
