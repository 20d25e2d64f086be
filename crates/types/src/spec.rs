//! Parameter specifications.

use crate::{Scalar, SpecValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A malformed parameter specification.
///
/// Always fatal: raised before any batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// A key declared an empty candidate list.
    #[error("Invalid spec: parameter '{key}' has an empty value list")]
    EmptySequence { key: String },

    /// A value is neither a scalar nor a flat list of scalars.
    #[error("Invalid spec: parameter '{key}' has unsupported value type {kind}")]
    UnsupportedValue { key: String, kind: String },

    /// A run-control parameter declared more than one candidate.
    #[error("Invalid spec: run-control parameter '{key}' must be a single value, got {count} candidates")]
    RunControlList { key: String, count: usize },

    /// The Cartesian product does not fit in memory addressing.
    #[error("Invalid spec: combination count overflows")]
    TooManyCombinations,
}

/// Mapping from parameter name to a fixed value or a candidate list.
///
/// Keeps insertion order, which fixes the expansion order of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSpec {
    entries: IndexMap<String, SpecValue>,
}

impl ParameterSpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SpecValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a key.
    ///
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SpecValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.entries.get(key)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpecValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the spec has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose value is a candidate list, in insertion order.
    pub fn varying_keys(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, v)| v.is_varying()).map(|(k, _)| k)
    }

    /// Keys with a single fixed value, in insertion order.
    pub fn fixed_keys(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, v)| !v.is_varying()).map(|(k, _)| k)
    }

    /// Check the spec invariant: every list is non-empty.
    pub fn validate(&self) -> Result<(), SpecError> {
        for (key, value) in self.iter() {
            if value.is_empty() {
                return Err(SpecError::EmptySequence {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge caller overrides on top of a base spec.
    ///
    /// An override for key K replaces the base value for K wholesale; two
    /// lists for the same key are never merged element-wise.
    pub fn merge_overrides(mut self, overrides: ParameterSpec) -> Self {
        for (key, value) in overrides.entries {
            self.entries.insert(key, value);
        }
        self
    }
}

impl<K: Into<String>, V: Into<SpecValue>> FromIterator<(K, V)> for ParameterSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = ParameterSpec::new();
        for (k, v) in iter {
            spec.insert(k, v);
        }
        spec
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

/// Run-control parameters resolved to one fixed scalar set.
///
/// Applied identically to every batch; never expanded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunConfig {
    values: IndexMap<String, Scalar>,
}

impl RunConfig {
    /// Create an empty run config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a run-control spec into fixed values.
    ///
    /// A single-element list collapses to its element; longer lists are
    /// rejected since run-control parameters do not multiply the batch count.
    pub fn resolve(spec: &ParameterSpec) -> Result<Self, SpecError> {
        spec.validate()?;
        let mut values = IndexMap::with_capacity(spec.len());
        for (key, value) in spec.iter() {
            let scalar = match value {
                SpecValue::Scalar(s) => s.clone(),
                SpecValue::List(list) if list.len() == 1 => list[0].clone(),
                SpecValue::List(list) => {
                    return Err(SpecError::RunControlList {
                        key: key.to_string(),
                        count: list.len(),
                    })
                }
            };
            values.insert(key.to_string(), scalar);
        }
        Ok(Self { values })
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.values.get(key)
    }

    /// Iterate values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no run-control values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_whole_value() {
        let base = ParameterSpec::new()
            .with("A", "x")
            .with("B", SpecValue::list([1, 2]))
            .with("C", 3);
        let overrides = ParameterSpec::new()
            .with("B", SpecValue::list([7]))
            .with("D", "new");

        let merged = base.merge_overrides(overrides);

        assert_eq!(merged.get("B"), Some(&SpecValue::list([7])));
        assert_eq!(merged.get("A"), Some(&SpecValue::from("x")));
        let keys: Vec<&str> = merged.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        let spec = ParameterSpec::new()
            .with("A", 1)
            .with("B", SpecValue::List(vec![]));
        assert_eq!(
            spec.validate(),
            Err(SpecError::EmptySequence { key: "B".into() })
        );
    }

    #[test]
    fn test_run_config_rejects_lists() {
        let spec = ParameterSpec::new()
            .with("StopTime", "10")
            .with("SolverName", SpecValue::list(["ode45", "ode23"]));
        let err = RunConfig::resolve(&spec).unwrap_err();
        assert_eq!(
            err,
            SpecError::RunControlList {
                key: "SolverName".into(),
                count: 2
            }
        );
    }

    #[test]
    fn test_run_config_collapses_single_element_list() {
        let spec = ParameterSpec::new()
            .with("StopTime", SpecValue::list(["10"]))
            .with("FixedStep", "1");
        let config = RunConfig::resolve(&spec).unwrap();
        assert_eq!(config.get("StopTime"), Some(&Scalar::from("10")));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_fixed_and_varying_partition() {
        let spec = ParameterSpec::new()
            .with("A", "x")
            .with("B", SpecValue::list([1, 2]))
            .with("C", SpecValue::list([10, 20]));
        assert_eq!(spec.fixed_keys().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(spec.varying_keys().collect::<Vec<_>>(), vec!["B", "C"]);
    }
}
