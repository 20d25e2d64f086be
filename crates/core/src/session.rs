//! Lifecycle enforcement for simulation sessions.

use crate::{SessionError, SimulationSession};
use simsweep_types::{ParameterAssignment, RawOutput, RunConfig};
use std::fmt;
use tracing::{debug, warn};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unprepared,
    Prepared,
    Applied,
    Executed,
    Released,
}

impl SessionState {
    fn label(self) -> &'static str {
        match self {
            SessionState::Unprepared => "unprepared",
            SessionState::Prepared => "prepared",
            SessionState::Applied => "applied",
            SessionState::Executed => "executed",
            SessionState::Released => "released",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Owns a session and enforces its state machine.
///
/// - `prepare` only from `Unprepared`; a failed prepare releases immediately.
/// - `apply` from `Prepared`, `Applied` or `Executed`.
/// - `execute` only from `Applied`; afterwards a new `apply` is required.
/// - `release` from anywhere, idempotent.
///
/// Dropping an unreleased guard releases the session, so engine resources are
/// freed on every exit path.
pub struct SessionGuard<S: SimulationSession> {
    inner: S,
    state: SessionState,
}

impl<S: SimulationSession> SessionGuard<S> {
    /// Wrap an unprepared session.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: SessionState::Unprepared,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Borrow the wrapped session.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn reject(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state.label(),
        }
    }

    /// Load the artifact.
    pub fn prepare(&mut self, artifact: &str) -> Result<(), SessionError> {
        if self.state != SessionState::Unprepared {
            return Err(self.reject("prepare"));
        }
        match self.inner.prepare(artifact) {
            Ok(()) => {
                debug!(artifact, "Session prepared");
                self.state = SessionState::Prepared;
                Ok(())
            }
            Err(e) => {
                if let Err(release_err) = self.release() {
                    warn!(error = %release_err, "Release after failed prepare also failed");
                }
                Err(e)
            }
        }
    }

    /// Bind an assignment and the fixed run configuration.
    pub fn apply(
        &mut self,
        assignment: &ParameterAssignment,
        run_config: &RunConfig,
    ) -> Result<(), SessionError> {
        match self.state {
            SessionState::Prepared | SessionState::Applied | SessionState::Executed => {}
            _ => return Err(self.reject("apply")),
        }
        // a partial bind leaves nothing runnable
        self.state = SessionState::Prepared;
        self.inner.apply(assignment, run_config)?;
        self.state = SessionState::Applied;
        Ok(())
    }

    /// Run once with the applied values.
    pub fn execute(&mut self) -> Result<RawOutput, SessionError> {
        if self.state != SessionState::Applied {
            return Err(self.reject("execute"));
        }
        self.state = SessionState::Prepared;
        let raw = self.inner.execute()?;
        self.state = SessionState::Executed;
        Ok(raw)
    }

    /// Release engine resources. Safe to call repeatedly.
    pub fn release(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Released {
            return Ok(());
        }
        self.state = SessionState::Released;
        let result = self.inner.release();
        debug!(ok = result.is_ok(), "Session released");
        result
    }

    /// Check if the session has been released.
    pub fn is_released(&self) -> bool {
        self.state == SessionState::Released
    }
}

impl<S: SimulationSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "Failed to release session on drop");
        }
    }
}

impl<S: SimulationSession> fmt::Debug for SessionGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tracing_test::traced_test;

    /// Session that journals calls and can fail on demand.
    struct JournalSession {
        calls: Rc<RefCell<Vec<&'static str>>>,
        fail_prepare: bool,
        fail_apply: bool,
        fail_release: bool,
    }

    impl JournalSession {
        fn new() -> (Self, Rc<RefCell<Vec<&'static str>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    calls: calls.clone(),
                    fail_prepare: false,
                    fail_apply: false,
                    fail_release: false,
                },
                calls,
            )
        }
    }

    impl SimulationSession for JournalSession {
        fn prepare(&mut self, artifact: &str) -> Result<(), SessionError> {
            self.calls.borrow_mut().push("prepare");
            if self.fail_prepare {
                return Err(SessionError::ArtifactLoad {
                    artifact: artifact.to_string(),
                    reason: "missing".into(),
                });
            }
            Ok(())
        }

        fn apply(&mut self, _: &ParameterAssignment, _: &RunConfig) -> Result<(), SessionError> {
            self.calls.borrow_mut().push("apply");
            if self.fail_apply {
                return Err(SessionError::ParameterBinding {
                    key: "k".into(),
                    reason: "rejected".into(),
                });
            }
            Ok(())
        }

        fn execute(&mut self) -> Result<RawOutput, SessionError> {
            self.calls.borrow_mut().push("execute");
            Ok(RawOutput::default())
        }

        fn release(&mut self) -> Result<(), SessionError> {
            self.calls.borrow_mut().push("release");
            if self.fail_release {
                return Err(SessionError::Release("engine gone".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let (session, calls) = JournalSession::new();
        let mut guard = SessionGuard::new(session);
        let assignment = ParameterAssignment::new();
        let config = RunConfig::new();

        guard.prepare("model").unwrap();
        for _ in 0..2 {
            guard.apply(&assignment, &config).unwrap();
            guard.execute().unwrap();
            assert_eq!(guard.state(), SessionState::Executed);
        }
        guard.release().unwrap();
        guard.release().unwrap();

        assert_eq!(
            *calls.borrow(),
            vec!["prepare", "apply", "execute", "apply", "execute", "release"]
        );
    }

    #[test]
    fn test_out_of_order_calls_rejected() {
        let (session, calls) = JournalSession::new();
        let mut guard = SessionGuard::new(session);

        assert!(matches!(
            guard.execute(),
            Err(SessionError::InvalidState {
                operation: "execute",
                state: "unprepared"
            })
        ));
        assert!(guard
            .apply(&ParameterAssignment::new(), &RunConfig::new())
            .is_err());

        guard.prepare("model").unwrap();
        assert!(guard.prepare("model").is_err());
        assert!(guard.execute().is_err());
        drop(guard);

        assert_eq!(*calls.borrow(), vec!["prepare", "release"]);
    }

    #[test]
    fn test_failed_prepare_releases() {
        let (mut session, calls) = JournalSession::new();
        session.fail_prepare = true;
        let mut guard = SessionGuard::new(session);

        assert!(matches!(
            guard.prepare("missing"),
            Err(SessionError::ArtifactLoad { .. })
        ));
        assert!(guard.is_released());
        drop(guard);

        assert_eq!(*calls.borrow(), vec!["prepare", "release"]);
    }

    #[test]
    fn test_failed_apply_requires_new_apply() {
        let (mut session, _calls) = JournalSession::new();
        session.fail_apply = true;
        let mut guard = SessionGuard::new(session);
        guard.prepare("model").unwrap();

        assert!(guard
            .apply(&ParameterAssignment::new(), &RunConfig::new())
            .is_err());
        assert_eq!(guard.state(), SessionState::Prepared);
        assert!(guard.execute().is_err());
    }

    #[test]
    #[traced_test]
    fn test_drop_releases_and_logs_failure() {
        let (mut session, calls) = JournalSession::new();
        session.fail_release = true;
        let mut guard = SessionGuard::new(session);
        guard.prepare("model").unwrap();
        drop(guard);

        assert_eq!(*calls.borrow(), vec!["prepare", "release"]);
        assert!(logs_contain("Failed to release session on drop"));
    }
}
