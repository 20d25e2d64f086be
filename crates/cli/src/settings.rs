//! Resolution of command-line arguments against the configuration file.
//!
//! Precedence per setting: command line, then config file, then built-in
//! default. Parameter specs are merged key by key: the config file gives
//! the base, `--model-args-file` overrides it, `--model-args` overrides both.

use crate::args::{Cli, ProcessorKind};
use crate::config::{ConfigError, FileConfig};
use simsweep_core::OpenMode;
use simsweep_engine::CommandSessionConfig;
use simsweep_params::{
    group_key_values, parse_pairs, spec_from_groups, spec_from_json, spec_from_toml,
};
use simsweep_processors::ChannelSelector;
use simsweep_runner::{FailurePolicy, RunnerConfig};
use simsweep_types::{ParameterSpec, RunConfig, SpecError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output store template used when neither flag nor config names one.
pub const DEFAULT_OUTPUT: &str = "data/sims_{}";

/// Log file template used when neither flag nor config names one.
pub const DEFAULT_LOG_FILE: &str = ".logs/sims_{}.log";

/// Replace every `{}` in a path template with the model name.
pub fn substitute(template: &str, model: &str) -> PathBuf {
    PathBuf::from(template.replace("{}", model))
}

/// Name used for `{}` substitution: the model without directory or extension.
pub fn model_label(model: &str) -> &str {
    Path::new(model)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(model)
}

/// Everything a sweep needs, fully resolved.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub model: String,
    pub model_spec: ParameterSpec,
    pub run_config: RunConfig,
    pub output: PathBuf,
    pub log_file: PathBuf,
    pub open_mode: OpenMode,
    pub policy: FailurePolicy,
    pub max_batches: Option<usize>,
    pub engine: CommandSessionConfig,
    pub channels: Vec<ChannelSelector>,
    pub processor: ProcessorKind,
    pub verbose: bool,
}

impl SweepSettings {
    /// Resolve settings from parsed arguments and a loaded config file.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let label = model_label(&cli.model).to_string();

        let model_spec = resolve_model_spec(&cli, &file)?;
        let run_config = resolve_run_config(&cli, &file)?;

        let output = substitute(
            cli.output
                .as_deref()
                .or(file.output.file.as_deref())
                .unwrap_or(DEFAULT_OUTPUT),
            &label,
        );
        let log_file = substitute(
            cli.log_file
                .as_deref()
                .or(file.logging.file.as_deref())
                .unwrap_or(DEFAULT_LOG_FILE),
            &label,
        );

        let channels = if cli.channels.is_empty() {
            file.output
                .channels
                .iter()
                .map(|s| s.parse::<ChannelSelector>())
                .collect::<Result<Vec<_>, _>>()?
        } else {
            cli.channels
        };

        let engine = resolve_engine(
            cli.engine,
            cli.engine_args,
            cli.timeout.map(Into::into),
            cli.model_path,
            &file,
        )?;

        Ok(Self {
            model: cli.model,
            model_spec,
            run_config,
            output,
            log_file,
            open_mode: if cli.append {
                OpenMode::Append
            } else {
                OpenMode::Truncate
            },
            policy: FailurePolicy::resolve(cli.continue_on_error, file.output.continue_on_error),
            max_batches: cli.max_batches,
            engine,
            channels,
            processor: cli.processor,
            verbose: cli.verbose,
        })
    }

    /// Runner configuration for these settings.
    pub fn runner_config(&self) -> RunnerConfig {
        let config = RunnerConfig::new().with_policy(self.policy);
        match self.max_batches {
            Some(max) => config.with_max_batches(max),
            None => config,
        }
    }
}

fn resolve_model_spec(cli: &Cli, file: &FileConfig) -> Result<ParameterSpec, ConfigError> {
    let invalid = |source: SpecError| ConfigError::InvalidSpec {
        section: "model",
        source,
    };

    let mut spec = spec_from_toml(&file.model.args).map_err(invalid)?;
    if let Some(path) = &cli.model_args_file {
        spec = spec.merge_overrides(read_args_file(path)?);
    }
    if !cli.model_args.is_empty() {
        let overrides = spec_from_groups(group_key_values(&cli.model_args)?);
        spec = spec.merge_overrides(overrides);
    }
    spec.validate().map_err(invalid)?;
    Ok(spec)
}

fn read_args_file(path: &Path) -> Result<ParameterSpec, ConfigError> {
    let args_error = |reason: String| ConfigError::ArgsFile {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| args_error(e.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| args_error(e.to_string()))?;
    spec_from_json(&value).map_err(|e| args_error(e.to_string()))
}

fn resolve_run_config(cli: &Cli, file: &FileConfig) -> Result<RunConfig, ConfigError> {
    let invalid = |source: SpecError| ConfigError::InvalidSpec {
        section: "simulation",
        source,
    };

    let mut spec = spec_from_toml(&file.simulation.args).map_err(invalid)?;
    for pairs in &cli.simulation_args {
        spec = spec.merge_overrides(parse_pairs(pairs)?);
    }
    RunConfig::resolve(&spec).map_err(invalid)
}

fn resolve_engine(
    program: Option<String>,
    args: Vec<String>,
    timeout: Option<Duration>,
    model_path: Option<PathBuf>,
    file: &FileConfig,
) -> Result<CommandSessionConfig, ConfigError> {
    let section = &file.engine;
    let program = program
        .or_else(|| section.program.clone())
        .ok_or(ConfigError::MissingEngine)?;
    let args = if args.is_empty() {
        section.args.clone()
    } else {
        args
    };
    let timeout = match (timeout, &section.timeout) {
        (Some(timeout), _) => Some(timeout),
        (None, Some(value)) => Some(humantime::parse_duration(value).map_err(|source| {
            ConfigError::InvalidDuration {
                value: value.clone(),
                source,
            }
        })?),
        (None, None) => None,
    };
    let search_dir = model_path
        .or_else(|| file.model.path.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = CommandSessionConfig::new(program)
        .with_args(args)
        .with_search_dir(search_dir)
        .with_extensions(section.extensions.clone())
        .with_known_parameters(section.known_parameters.clone());
    if let Some(timeout) = timeout {
        config = config.with_timeout(timeout);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use simsweep_types::{Scalar, SpecValue};

    const CONFIG: &str = r#"
[model]
path = "models"
args = { "DUnit/DelayLength" = "2", "oGain/Gain" = ["2", "1"] }

[simulation]
args = { SimulationMode = "normal", StopTime = "10" }

[output]
file = "out/{}_sweep"

[engine]
program = "python3"
args = ["-u"]
timeout = "5m"
"#;

    fn resolve(args: &[&str], config: &str) -> Result<SweepSettings, ConfigError> {
        let mut argv = vec!["simsweep"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        SweepSettings::resolve(cli, FileConfig::parse(config).unwrap())
    }

    #[test]
    fn test_defaults_from_config() {
        let settings = resolve(&["plant.py"], CONFIG).unwrap();

        assert_eq!(settings.output, PathBuf::from("out/plant_sweep"));
        assert_eq!(settings.log_file, PathBuf::from(".logs/sims_plant.log"));
        assert_eq!(settings.policy, FailurePolicy::HaltOnError);
        assert_eq!(settings.open_mode, OpenMode::Truncate);
        assert_eq!(settings.engine.program, "python3");
        assert_eq!(settings.engine.args, vec!["-u"]);
        assert_eq!(settings.engine.search_dir, PathBuf::from("models"));
        assert_eq!(settings.engine.timeout, Some(Duration::from_secs(300)));
        assert_eq!(
            settings.run_config.get("StopTime"),
            Some(&Scalar::Text("10".into()))
        );
        assert_eq!(
            settings.model_spec.get("oGain/Gain"),
            Some(&SpecValue::list(["2", "1"]))
        );
    }

    #[test]
    fn test_command_line_overrides() {
        let settings = resolve(
            &[
                "plant",
                "-m",
                "oGain/Gain=3",
                "extra=1 2",
                "-s",
                "StopTime=20, StartTime=0",
                "-o",
                "runs/{}",
                "--engine",
                "octave",
                "--timeout",
                "10s",
                "-e",
                "--append",
            ],
            CONFIG,
        )
        .unwrap();

        let keys: Vec<_> = settings.model_spec.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["DUnit/DelayLength", "oGain/Gain", "extra"]);
        assert_eq!(
            settings.model_spec.get("oGain/Gain"),
            Some(&SpecValue::list(["3"]))
        );
        assert_eq!(
            settings.run_config.get("StopTime"),
            Some(&Scalar::Text("20".into()))
        );
        assert_eq!(settings.run_config.len(), 3);
        assert_eq!(settings.output, PathBuf::from("runs/plant"));
        assert_eq!(settings.engine.program, "octave");
        assert_eq!(settings.engine.timeout, Some(Duration::from_secs(10)));
        assert_eq!(settings.policy, FailurePolicy::ContinueOnError);
        assert_eq!(settings.open_mode, OpenMode::Append);
    }

    #[test]
    fn test_builtin_defaults() {
        let settings = resolve(&["plant", "--engine", "sh"], "").unwrap();
        assert_eq!(settings.output, PathBuf::from("data/sims_plant"));
        assert!(settings.model_spec.is_empty());
        assert!(settings.run_config.is_empty());
        assert_eq!(settings.engine.search_dir, PathBuf::from("."));
        assert_eq!(settings.engine.timeout, None);
    }

    #[test]
    fn test_resolution_errors() {
        assert!(matches!(
            resolve(&["plant"], ""),
            Err(ConfigError::MissingEngine)
        ));
        assert!(matches!(
            resolve(&["plant", "--engine", "sh", "-s", "StopTime=1, StopTime"], ""),
            Err(ConfigError::KeyValue(_))
        ));
        assert!(matches!(
            resolve(&["plant", "--engine", "sh", "-m", "gain="], ""),
            Err(ConfigError::InvalidSpec {
                section: "model",
                ..
            })
        ));
        assert!(matches!(
            resolve(&["plant", "--engine", "sh"], "[simulation]\nargs = { StopTime = [1, 2] }\n"),
            Err(ConfigError::InvalidSpec {
                section: "simulation",
                ..
            })
        ));
        assert!(matches!(
            resolve(&["plant", "--engine", "sh"], "[engine]\ntimeout = \"soon\"\n"),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_args_file_between_config_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("args.json");
        fs::write(&path, r#"{"oGain/Gain": [5, 6], "len": "4"}"#).unwrap();
        let path = path.to_str().unwrap();

        let settings = resolve(&["plant", "-a", path, "-m", "len=8"], CONFIG).unwrap();
        assert_eq!(
            settings.model_spec.get("oGain/Gain"),
            Some(&SpecValue::list([5, 6]))
        );
        assert_eq!(settings.model_spec.get("len"), Some(&SpecValue::list(["8"])));
    }

    #[test]
    fn test_model_label() {
        assert_eq!(model_label("plant.slx"), "plant");
        assert_eq!(model_label("models/plant"), "plant");
        assert_eq!(substitute("data/sims_{}", "plant"), PathBuf::from("data/sims_plant"));
    }
}
