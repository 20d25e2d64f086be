//! Multi-value `key=value` input grouping.
//!
//! Command lines pass model parameters as a flat token list where a token
//! containing `=` opens a key and bare tokens keep adding values to it:
//!
//! ```text
//! len=2 "gain=2 1" gain2=3 1   ->   {len: [2], gain: [2, 1], gain2: [3, 1]}
//! ```

use indexmap::IndexMap;
use simsweep_types::{ParameterSpec, RunConfig, Scalar, SpecError, SpecValue};
use thiserror::Error;

/// Errors while grouping key/value tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyValueError {
    /// A bare value appeared before any `key=` token.
    #[error("Value '{0}' is not a key-value pair")]
    DanglingValue(String),

    /// A token of the form `=value`.
    #[error("Missing key in '{0}'")]
    EmptyKey(String),

    /// A comma-separated pair without `=`.
    #[error("Malformed pair '{0}', expected key=value")]
    MalformedPair(String),
}

/// Group tokens into an ordered mapping from key to its values.
///
/// Values are split on whitespace. Repeating a key appends to its list.
pub fn group_key_values<I, S>(tokens: I) -> Result<IndexMap<String, Vec<String>>, KeyValueError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut current: Option<String> = None;

    for token in tokens {
        let token = token.as_ref();
        let (key, rest) = match token.split_once('=') {
            Some((key, rest)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(KeyValueError::EmptyKey(token.to_string()));
                }
                current = Some(key.to_string());
                (key, rest)
            }
            None => match current.as_deref() {
                Some(key) => (key, token),
                None => return Err(KeyValueError::DanglingValue(token.to_string())),
            },
        };
        groups
            .entry(key.to_string())
            .or_default()
            .extend(rest.split_whitespace().map(str::to_string));
    }

    Ok(groups)
}

/// Build a model-parameter spec from grouped command-line values.
///
/// Every key becomes a text candidate list, so a key given without values
/// (`key=`) turns into an empty list and fails validation downstream.
pub fn spec_from_groups(groups: IndexMap<String, Vec<String>>) -> ParameterSpec {
    groups
        .into_iter()
        .map(|(key, values)| (key, SpecValue::list(values)))
        .collect()
}

/// Parse comma-separated `key=value` pairs (`"StartTime=0, StopTime=10"`).
pub fn parse_pairs(input: &str) -> Result<ParameterSpec, KeyValueError> {
    let mut spec = ParameterSpec::new();
    for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| KeyValueError::MalformedPair(pair.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(KeyValueError::EmptyKey(pair.to_string()));
        }
        spec.insert(key, Scalar::from(value.trim()));
    }
    Ok(spec)
}

/// Resolve a run-control spec, failing if any key would sweep.
pub fn resolve_run_config(
    base: ParameterSpec,
    overrides: ParameterSpec,
) -> Result<RunConfig, SpecError> {
    RunConfig::resolve(&base.merge_overrides(overrides))
}
