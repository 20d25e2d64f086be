//! Batch orchestration for simsweep.
//!
//! [`BatchRunner`] expands the model-parameter spec, drives the session
//! through every assignment, routes each raw output through the processor
//! into the recorder and accumulates a [`RunSummary`](simsweep_types::RunSummary).
//!
//! # Failure handling
//!
//! | Failure                              | Halt-on-error        | Continue-on-error  |
//! |--------------------------------------|----------------------|--------------------|
//! | apply / execute / extract / record   | stop, `BatchFailed`  | record, next batch |
//! | store unavailable                    | stop                 | stop               |
//! | after-batch hook                     | logged               | logged             |

mod config;
mod error;
mod metrics;
mod runner;

pub use config::{FailurePolicy, RunnerConfig};
pub use error::{HookError, SweepError};
pub use metrics::{BatchMetrics, MetricsReport};
pub use runner::BatchRunner;
