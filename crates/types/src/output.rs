//! Raw engine output and normalized per-channel results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One signal trace as produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    /// Signal name.
    pub name: String,

    /// Output port number (1-based, as engines usually number ports).
    #[serde(default)]
    pub port: u32,

    /// Sample timestamps.
    pub time: Vec<f64>,

    /// Sample values, aligned with `time`.
    pub values: Vec<f64>,
}

/// Result of one engine run.
///
/// Owned by the runner for a single iteration and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
    /// Logged signal traces.
    #[serde(default)]
    pub traces: Vec<RawTrace>,

    /// Named scalar outputs (final values, computed metrics).
    #[serde(default)]
    pub scalars: IndexMap<String, f64>,

    /// Engine diagnostic lines (warnings emitted during the run).
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

impl RawOutput {
    /// Find a trace by name.
    pub fn trace(&self, name: &str) -> Option<&RawTrace> {
        self.traces.iter().find(|t| t.name == name)
    }

    /// Find a trace by output port.
    pub fn trace_by_port(&self, port: u32) -> Option<&RawTrace> {
        self.traces.iter().find(|t| t.port == port)
    }
}

/// One `(time, value)` sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

impl From<(f64, f64)> for Sample {
    fn from((time, value): (f64, f64)) -> Self {
        Sample { time, value }
    }
}

/// Data held by one normalized channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelData {
    /// Time series of samples.
    Series(Vec<Sample>),
    /// A single value.
    Scalar(f64),
}

impl ChannelData {
    /// Number of samples (1 for a scalar channel).
    pub fn len(&self) -> usize {
        match self {
            ChannelData::Series(samples) => samples.len(),
            ChannelData::Scalar(_) => 1,
        }
    }

    /// Check if this is an empty series.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if every time and value is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            ChannelData::Series(samples) => samples
                .iter()
                .all(|s| s.time.is_finite() && s.value.is_finite()),
            ChannelData::Scalar(value) => value.is_finite(),
        }
    }
}

/// Engine-agnostic per-channel data extracted from one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedResult {
    channels: IndexMap<String, ChannelData>,
}

impl NormalizedResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a channel.
    pub fn insert(&mut self, name: impl Into<String>, data: ChannelData) {
        self.channels.insert(name.into(), data);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, data: ChannelData) -> Self {
        self.insert(name, data);
        self
    }

    /// Look up a channel.
    pub fn channel(&self, name: &str) -> Option<&ChannelData> {
        self.channels.get(name)
    }

    /// Iterate channels in extraction order.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &ChannelData)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Channel names in extraction order.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if no channels were extracted.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_output_decodes_with_defaults() {
        let raw: RawOutput = serde_json::from_str(
            r#"{"traces": [{"name": "out1", "time": [0.0, 1.0], "values": [2.0, 4.0]}]}"#,
        )
        .unwrap();
        assert_eq!(raw.traces[0].port, 0);
        assert!(raw.scalars.is_empty());
        assert!(raw.trace("out1").is_some());
        assert!(raw.trace("out2").is_none());
    }

    #[test]
    fn test_finite_check() {
        assert!(ChannelData::Scalar(1e308).is_finite());
        assert!(!ChannelData::Scalar(f64::NAN).is_finite());
        assert!(!ChannelData::Series(vec![Sample::from((f64::INFINITY, 0.0))]).is_finite());
        assert!(ChannelData::Series(Vec::new()).is_finite());
    }

    #[test]
    fn test_channel_json_shape() {
        let result = NormalizedResult::new()
            .with("y", ChannelData::Series(vec![Sample::from((0.0, 1.5))]))
            .with("gain", ChannelData::Scalar(2.0));
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"y":{"series":[{"time":0.0,"value":1.5}]},"gain":{"scalar":2.0}}"#
        );
    }
}
