//! Parameter handling for simsweep.
//!
//! - [`ParameterSpace`] expands a model-parameter spec into the ordered
//!   sequence of assignments a sweep runs through.
//! - [`group_key_values`] / [`parse_pairs`] turn command-line tokens into specs.
//! - [`spec_from_toml`] / [`spec_from_json`] read specs from configuration data.
//!
//! Only the model-parameter spec is ever expanded. Run-control parameters are
//! resolved to a fixed [`RunConfig`](simsweep_types::RunConfig) with
//! [`resolve_run_config`] and never multiply the batch count.

mod kv;
mod loose;
mod space;

pub use kv::{group_key_values, parse_pairs, resolve_run_config, spec_from_groups, KeyValueError};
pub use loose::{spec_from_json, spec_from_toml};
pub use space::{Expansion, ParameterSpace};
