//! Engine session backed by an external process.

use crate::protocol::{decode_output, EngineRequest};
use crate::CommandSessionConfig;
use simsweep_core::{SessionError, SimulationSession};
use simsweep_types::{ParameterAssignment, RawOutput, RunConfig};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A child process that is killed if still running when dropped.
struct RunningEngine {
    child: Child,
}

impl RunningEngine {
    fn wait(
        &mut self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<ExitStatus, SessionError> {
        let started = Instant::now();
        loop {
            let polled = self.child.try_wait().map_err(|e| SessionError::Execution {
                diagnostic: format!("failed to poll engine process: {}", e),
            })?;
            if let Some(status) = polled {
                return Ok(status);
            }
            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    return Err(SessionError::Execution {
                        diagnostic: format!("engine run timed out after {:?}", limit),
                    });
                }
            }
            thread::sleep(poll_interval);
        }
    }
}

impl Drop for RunningEngine {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Write the request on its own thread so an engine that never reads stdin
/// cannot block the caller past the timeout.
fn feed<W: Write + Send + 'static>(
    pipe: Option<W>,
    request: Vec<u8>,
) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || match pipe {
        // dropping the pipe afterwards closes the engine's stdin
        Some(mut pipe) => pipe.write_all(&request),
        None => Ok(()),
    })
}

fn collect(handle: JoinHandle<Vec<u8>>, stream: &str) -> Result<Vec<u8>, SessionError> {
    handle.join().map_err(|_| SessionError::Execution {
        diagnostic: format!("failed to read engine {}", stream),
    })
}

/// Drives an engine that runs once per process invocation.
///
/// The artifact is resolved once in [`prepare`](SimulationSession::prepare);
/// every [`execute`](SimulationSession::execute) launches
/// `program [args...] <artifact>`, writes the staged request to its stdin and
/// decodes the raw output from its stdout.
#[derive(Debug)]
pub struct CommandSession {
    config: CommandSessionConfig,
    artifact: Option<PathBuf>,
    staged: Option<EngineRequest>,
    runs: usize,
}

impl CommandSession {
    /// Create an unprepared session.
    pub fn new(config: CommandSessionConfig) -> Self {
        Self {
            config,
            artifact: None,
            staged: None,
            runs: 0,
        }
    }

    /// Resolved artifact path, once prepared.
    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    /// Number of completed engine runs.
    pub fn runs(&self) -> usize {
        self.runs
    }

    fn resolve_artifact(&self, name: &str) -> Result<PathBuf, SessionError> {
        let base = self.config.search_dir.join(name);
        let mut candidates = vec![base.clone()];
        candidates.extend(
            self.config
                .extensions
                .iter()
                .map(|ext| base.with_extension(ext.trim_start_matches('.'))),
        );

        candidates
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| SessionError::ArtifactLoad {
                artifact: name.to_string(),
                reason: format!(
                    "not found (tried {})",
                    candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }

    fn launch(&self, artifact: &Path, request: Vec<u8>) -> Result<RawOutput, SessionError> {
        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(artifact)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SessionError::Execution {
                diagnostic: format!("failed to launch '{}': {}", self.config.program, e),
            })?;
        let mut engine = RunningEngine { child };

        let stdout = drain(engine.child.stdout.take());
        let stderr = drain(engine.child.stderr.take());
        let stdin = feed(engine.child.stdin.take(), request);

        let status = engine.wait(self.config.timeout, self.config.poll_interval)?;
        let sent = stdin.join().map_err(|_| SessionError::Execution {
            diagnostic: "failed to write engine stdin".to_string(),
        })?;
        match sent {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("Engine closed stdin before reading the request");
            }
            Err(e) => {
                return Err(SessionError::Execution {
                    diagnostic: format!("failed to send request to engine: {}", e),
                })
            }
        }
        let stdout = collect(stdout, "stdout")?;
        let stderr = collect(stderr, "stderr")?;

        if !status.success() {
            let text = String::from_utf8_lossy(&stderr);
            let text = text.trim();
            return Err(SessionError::Execution {
                diagnostic: if text.is_empty() {
                    format!("engine exited with {}", status)
                } else {
                    format!("engine exited with {}: {}", status, text)
                },
            });
        }

        decode_output(&stdout)
    }
}

impl SimulationSession for CommandSession {
    fn prepare(&mut self, artifact: &str) -> Result<(), SessionError> {
        let path = self.resolve_artifact(artifact)?;
        info!(artifact = %path.display(), program = %self.config.program, "Engine artifact loaded");
        self.artifact = Some(path);
        Ok(())
    }

    fn apply(
        &mut self,
        assignment: &ParameterAssignment,
        run_config: &RunConfig,
    ) -> Result<(), SessionError> {
        let artifact = self.artifact.as_ref().ok_or(SessionError::InvalidState {
            operation: "apply",
            state: "unprepared",
        })?;

        if !self.config.known_parameters.is_empty() {
            if let Some(key) = assignment
                .keys()
                .find(|key| !self.config.known_parameters.iter().any(|k| k == key))
            {
                self.staged = None;
                return Err(SessionError::ParameterBinding {
                    key: key.to_string(),
                    reason: format!("no such parameter target in {}", artifact.display()),
                });
            }
        }

        self.staged = Some(EngineRequest {
            artifact: artifact.display().to_string(),
            parameters: assignment.clone(),
            run: run_config.clone(),
        });
        Ok(())
    }

    fn execute(&mut self) -> Result<RawOutput, SessionError> {
        let (Some(artifact), Some(request)) = (self.artifact.as_ref(), self.staged.take()) else {
            return Err(SessionError::InvalidState {
                operation: "execute",
                state: "not applied",
            });
        };

        let started = Instant::now();
        let raw = self.launch(artifact, request.encode()?)?;
        self.runs += 1;

        for line in &raw.diagnostics {
            warn!(artifact = %artifact.display(), "Engine: {}", line);
        }
        debug!(
            traces = raw.traces.len(),
            scalars = raw.scalars.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Engine run completed"
        );
        Ok(raw)
    }

    fn release(&mut self) -> Result<(), SessionError> {
        if self.artifact.take().is_some() {
            debug!(runs = self.runs, "Engine session released");
        }
        self.staged = None;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tracing_test::traced_test;

    const ECHO_ENGINE: &str = r#"
request=$(cat)
case "$request" in
  *'"fail":"yes"'*) echo "solver diverged" >&2; exit 3 ;;
esac
echo '{"traces":[{"name":"y","port":1,"time":[0,1],"values":[2,4]}],"scalars":{"k":1.5},"diagnostics":["step size reduced"]}'
"#;

    fn setup(script: &str) -> (TempDir, CommandSessionConfig) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("model.sh"), script).unwrap();
        let config = CommandSessionConfig::new("sh")
            .with_search_dir(dir.path())
            .with_extensions(vec!["sh".into()]);
        (dir, config)
    }

    fn assignment(pairs: &[(&str, &str)]) -> ParameterAssignment {
        pairs.iter().copied().collect()
    }

    #[test]
    #[traced_test]
    fn test_run_decodes_output() {
        let (_dir, config) = setup(ECHO_ENGINE);
        let mut session = CommandSession::new(config);

        session.prepare("model").unwrap();
        session
            .apply(&assignment(&[("gain", "2")]), &RunConfig::new())
            .unwrap();
        let raw = session.execute().unwrap();

        assert_eq!(raw.traces.len(), 1);
        assert_eq!(raw.traces[0].values, vec![2.0, 4.0]);
        assert_eq!(raw.scalars.get("k"), Some(&1.5));
        assert_eq!(session.runs(), 1);
        assert!(logs_contain("step size reduced"));
        session.release().unwrap();
        session.release().unwrap();
    }

    #[test]
    fn test_missing_artifact() {
        let (_dir, config) = setup(ECHO_ENGINE);
        let mut session = CommandSession::new(config);
        match session.prepare("other") {
            Err(SessionError::ArtifactLoad { artifact, reason }) => {
                assert_eq!(artifact, "other");
                assert!(reason.contains("other.sh"));
            }
            other => panic!("expected artifact load error, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_failure_carries_stderr() {
        let (_dir, config) = setup(ECHO_ENGINE);
        let mut session = CommandSession::new(config);
        session.prepare("model.sh").unwrap();
        session
            .apply(&assignment(&[("fail", "yes")]), &RunConfig::new())
            .unwrap();

        match session.execute() {
            Err(SessionError::Execution { diagnostic }) => {
                assert!(diagnostic.contains("solver diverged"), "{}", diagnostic);
            }
            other => panic!("expected execution error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_parameter_target() {
        let (_dir, config) = setup(ECHO_ENGINE);
        let mut session =
            CommandSession::new(config.with_known_parameters(vec!["oGain/Gain".into()]));
        session.prepare("model").unwrap();

        match session.apply(&assignment(&[("oGain/Gain", "1"), ("dGain/Gain", "3")]), &RunConfig::new()) {
            Err(SessionError::ParameterBinding { key, .. }) => assert_eq!(key, "dGain/Gain"),
            other => panic!("expected binding error, got {:?}", other),
        }
        assert!(session.execute().is_err());
    }

    #[test]
    fn test_timeout_kills_engine() {
        let (_dir, config) = setup("cat > /dev/null; exec sleep 5\n");
        let mut session = CommandSession::new(
            config
                .with_timeout(Duration::from_millis(200))
                .with_poll_interval(Duration::from_millis(10)),
        );
        session.prepare("model").unwrap();
        session
            .apply(&ParameterAssignment::new(), &RunConfig::new())
            .unwrap();

        let started = Instant::now();
        match session.execute() {
            Err(SessionError::Execution { diagnostic }) => {
                assert!(diagnostic.contains("timed out"), "{}", diagnostic)
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_with_unread_large_request() {
        let (_dir, config) = setup("exec sleep 5\n");
        let mut session = CommandSession::new(
            config
                .with_timeout(Duration::from_millis(200))
                .with_poll_interval(Duration::from_millis(10)),
        );
        session.prepare("model").unwrap();
        // far beyond any pipe buffer
        let payload = "x".repeat(1 << 20);
        session
            .apply(&assignment(&[("blob", payload.as_str())]), &RunConfig::new())
            .unwrap();

        let started = Instant::now();
        match session.execute() {
            Err(SessionError::Execution { diagnostic }) => {
                assert!(diagnostic.contains("timed out"), "{}", diagnostic)
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_garbage_output() {
        let (_dir, config) = setup("cat > /dev/null; echo hello\n");
        let mut session = CommandSession::new(config);
        session.prepare("model").unwrap();
        session
            .apply(&ParameterAssignment::new(), &RunConfig::new())
            .unwrap();
        assert!(matches!(
            session.execute(),
            Err(SessionError::Execution { .. })
        ));
    }
}
