//! Configuration for command-driven engine sessions.

use std::path::PathBuf;
use std::time::Duration;

/// How to launch and supervise the engine process.
#[derive(Clone, Debug)]
pub struct CommandSessionConfig {
    /// Program to launch (interpreter or engine binary).
    pub program: String,

    /// Arguments passed before the artifact path.
    pub args: Vec<String>,

    /// Directory artifacts are resolved in.
    pub search_dir: PathBuf,

    /// Extensions tried when the artifact name is given without one.
    pub extensions: Vec<String>,

    /// Parameter targets the artifact accepts.
    ///
    /// Empty means the engine validates parameters itself.
    pub known_parameters: Vec<String>,

    /// Maximum wall-clock time for one run; `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// How often a running engine is polled for completion.
    pub poll_interval: Duration,
}

impl CommandSessionConfig {
    /// Create a configuration launching `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            search_dir: PathBuf::from("."),
            extensions: Vec::new(),
            known_parameters: Vec::new(),
            timeout: None,
            poll_interval: Duration::from_millis(20),
        }
    }

    /// Set the program arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set the artifact search directory.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = dir.into();
        self
    }

    /// Set the artifact extensions to try.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Declare the parameter targets the artifact accepts.
    pub fn with_known_parameters(mut self, parameters: Vec<String>) -> Self {
        self.known_parameters = parameters;
        self
    }

    /// Set the per-run timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the completion poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
