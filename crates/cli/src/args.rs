//! Command-line arguments.

use clap::{Parser, ValueEnum};
use simsweep_processors::ChannelSelector;
use std::path::PathBuf;

/// Output extraction strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProcessorKind {
    /// Store selected traces as time series.
    #[default]
    Ports,
    /// Store min/max/mean/final of each selected trace.
    Summary,
}

#[derive(Debug, Parser)]
#[command(name = "simsweep")]
#[command(about = "Run a simulation model across a parameter sweep and store every batch")]
#[command(version)]
pub struct Cli {
    /// Model (artifact) name
    pub model: String,

    /// Directory containing the model
    #[arg(short = 'p', long = "path")]
    pub model_path: Option<PathBuf>,

    /// Model parameters: "key=v1 v2" groups; tokens without '=' continue the previous key
    #[arg(short = 'm', long = "model-args", num_args = 1.., value_name = "KEY=VALUES")]
    pub model_args: Vec<String>,

    /// JSON file with model parameters
    #[arg(short = 'a', long = "model-args-file")]
    pub model_args_file: Option<PathBuf>,

    /// Simulation (run-control) parameters: "Key=Value, Key=Value"
    #[arg(short = 's', long = "simulation-args", value_name = "PAIRS")]
    pub simulation_args: Vec<String>,

    /// Output store path; '{}' is replaced by the model name
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Log file; '{}' is replaced by the model name
    #[arg(short = 'l', long = "log")]
    pub log_file: Option<String>,

    /// Verbose (debug) logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Keep going when a batch fails
    #[arg(short = 'e', long = "continue-on-error")]
    pub continue_on_error: bool,

    /// Add to an existing store instead of replacing it
    #[arg(long)]
    pub append: bool,

    /// Engine program
    #[arg(long)]
    pub engine: Option<String>,

    /// Engine argument placed before the model path (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Per-run timeout (e.g., "30s", "5m")
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Channel to extract: NAME, port:N, or ALIAS=NAME (repeatable; default all)
    #[arg(long = "channel", value_name = "SELECTOR")]
    pub channels: Vec<ChannelSelector>,

    /// Output processor
    #[arg(long, value_enum, default_value_t = ProcessorKind::Ports)]
    pub processor: ProcessorKind,

    /// Stop after this many batches
    #[arg(long)]
    pub max_batches: Option<usize>,
}
