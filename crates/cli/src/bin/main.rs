//! simsweep CLI
//!
//! Runs a simulation model across a parameter sweep and stores every batch.

use clap::Parser;
use simsweep_cli::{init_logging, report, run_sweep, Cli, FileConfig, SweepSettings};
use tracing::debug;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = SweepSettings::resolve(cli, file)?;

    init_logging(&settings.log_file, settings.verbose)?;
    debug!(
        model_spec = %settings.model_spec,
        log_file = %settings.log_file.display(),
        "Settings resolved"
    );

    report(run_sweep(&settings))
}
