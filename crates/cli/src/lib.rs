//! Command-line front-end for simsweep.
//!
//! Turns `simsweep` arguments and the optional TOML configuration file into
//! [`SweepSettings`], installs logging and runs the sweep through a
//! [`BatchRunner`](simsweep_runner::BatchRunner) wired to a
//! [`CommandSession`](simsweep_engine::CommandSession) and a
//! [`DirectoryStore`](simsweep_storage::DirectoryStore).

pub mod args;
pub mod config;
pub mod logging;
pub mod settings;
pub mod sweep;

pub use args::{Cli, ProcessorKind};
pub use config::{ConfigError, FileConfig, DEFAULT_CONFIG_PATH};
pub use logging::init_logging;
pub use settings::SweepSettings;
pub use sweep::{report, run_sweep};
