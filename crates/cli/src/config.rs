//! TOML configuration file.
//!
//! ```toml
//! [model]
//! path = "models"
//! args = { "DUnit/DelayLength" = "2", "oGain/Gain" = ["2", "1"] }
//!
//! [simulation]
//! args = { SimulationMode = "normal", StopTime = "10" }
//!
//! [output]
//! file = "data/sims_{}"
//! continue_on_error = false
//! channels = ["y", "port:2"]
//!
//! [logging]
//! file = ".logs/sims_{}.log"
//!
//! [engine]
//! program = "python3"
//! args = ["-u"]
//! timeout = "5m"
//! extensions = ["py"]
//! known_parameters = []
//! ```
//!
//! Every section and key is optional.

use serde::Deserialize;
use simsweep_params::KeyValueError;
use simsweep_processors::ParseSelectorError;
use simsweep_types::SpecError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config/simsweep.toml";

/// Errors while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid arguments file {path}: {reason}")]
    ArgsFile { path: PathBuf, reason: String },

    #[error("Invalid {section} arguments: {source}")]
    InvalidSpec {
        section: &'static str,
        #[source]
        source: SpecError,
    },

    #[error(transparent)]
    KeyValue(#[from] KeyValueError),

    #[error("Invalid duration '{value}': {source}")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error(transparent)]
    Selector(#[from] ParseSelectorError),

    #[error("No engine program configured (use --engine or [engine].program)")]
    MissingEngine,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSection {
    /// Directory the model artifact is resolved in.
    pub path: Option<PathBuf>,
    /// Base model-parameter spec.
    pub args: toml::Table,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Base run-control spec.
    pub args: toml::Table,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Store path template; `{}` is replaced by the model name.
    pub file: Option<String>,
    pub continue_on_error: Option<bool>,
    /// Channel selectors for extraction.
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Log file template; `{}` is replaced by the model name.
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub program: Option<String>,
    pub args: Vec<String>,
    /// Per-run timeout in humantime notation (`"90s"`, `"5m"`).
    pub timeout: Option<String>,
    pub extensions: Vec<String>,
    pub known_parameters: Vec<String>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub model: ModelSection,
    pub simulation: SimulationSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
    pub engine: EngineSection,
}

impl FileConfig {
    /// Load the configuration file.
    ///
    /// With `path = None` the default location is tried and a missing file
    /// yields an empty configuration. An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"
[model]
path = "models"
args = { "DUnit/DelayLength" = "2", "oGain/Gain" = ["2", "1"] }

[simulation]
args = { SimulationMode = "normal", StopTime = "10" }

[output]
continue_on_error = true

[engine]
program = "python3"
timeout = "5m"
"#;

    #[test]
    fn test_parse_sample() {
        let config = FileConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.model.path, Some(PathBuf::from("models")));
        let keys: Vec<_> = config.model.args.keys().cloned().collect();
        assert_eq!(keys, vec!["DUnit/DelayLength", "oGain/Gain"]);
        assert_eq!(config.output.continue_on_error, Some(true));
        assert_eq!(config.output.file, None);
        assert_eq!(config.engine.program.as_deref(), Some("python3"));
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("[output]\nfiel = \"x\"\n").is_err());
    }

    #[test]
    fn test_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            FileConfig::load(Some(&missing)),
            Err(ConfigError::NotFound(_))
        ));

        let path = dir.path().join("simsweep.toml");
        fs::write(&path, SAMPLE).unwrap();
        let config = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(config.simulation.args.len(), 2);

        fs::write(&path, "[model\n").unwrap();
        assert!(matches!(
            FileConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
