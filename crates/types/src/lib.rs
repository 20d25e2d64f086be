//! Core data types for simsweep.
//!
//! Everything that flows through a parameter sweep is defined here:
//!
//! - [`ParameterSpec`] - the declared parameter space (scalars and candidate lists)
//! - [`ParameterAssignment`] - one fully resolved point of that space
//! - [`RunConfig`] - run-control values held fixed across a sweep
//! - [`RawOutput`] / [`NormalizedResult`] - engine output before and after extraction
//! - [`RunSummary`] - the ordered audit trail of batch outcomes

mod assignment;
mod identifiers;
mod output;
mod scalar;
mod spec;
mod summary;

pub use assignment::ParameterAssignment;
pub use identifiers::{BatchIndex, BatchKey, ParseBatchKeyError};
pub use output::{ChannelData, NormalizedResult, RawOutput, RawTrace, Sample};
pub use scalar::{Scalar, SpecValue};
pub use spec::{ParameterSpec, RunConfig, SpecError};
pub use summary::{BatchOutcome, BatchStage, BatchStatus, RunSummary, SummaryBuilder};
