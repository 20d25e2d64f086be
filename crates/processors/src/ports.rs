//! Default processor: copy selected output ports into time series.

use crate::{ChannelSelector, ChannelSource};
use simsweep_core::{OutputProcessor, ProcessError};
use simsweep_types::{ChannelData, NormalizedResult, RawOutput, RawTrace, Sample};
use tracing::trace;

/// Add a channel, failing if the name is already taken.
pub(crate) fn insert_channel(
    result: &mut NormalizedResult,
    name: impl Into<String>,
    data: ChannelData,
) -> Result<(), ProcessError> {
    let name = name.into();
    if result.channel(&name).is_some() {
        return Err(ProcessError::DuplicateChannel(name));
    }
    result.insert(name, data);
    Ok(())
}

/// Convert an engine trace into `(time, value)` samples.
pub fn trace_samples(trace: &RawTrace) -> Result<Vec<Sample>, ProcessError> {
    if trace.time.len() != trace.values.len() {
        return Err(ProcessError::MalformedTrace {
            name: trace.name.clone(),
            time_len: trace.time.len(),
            value_len: trace.values.len(),
        });
    }
    Ok(trace
        .time
        .iter()
        .zip(&trace.values)
        .map(|(&time, &value)| Sample { time, value })
        .collect())
}

/// Extracts declared output channels verbatim.
///
/// With no selectors every trace and every named scalar is extracted.
/// A name selector matches a trace first and falls back to a named scalar.
/// Two channels landing on the same name fail the extraction.
#[derive(Debug, Clone, Default)]
pub struct OutputPortProcessor {
    selectors: Vec<ChannelSelector>,
}

impl OutputPortProcessor {
    /// Extract only the given channels, in the given order.
    pub fn new(selectors: Vec<ChannelSelector>) -> Self {
        Self { selectors }
    }

    /// Extract every channel of the raw output.
    pub fn all() -> Self {
        Self::default()
    }

    /// Declared selectors.
    pub fn selectors(&self) -> &[ChannelSelector] {
        &self.selectors
    }

    fn extract_all(raw: &RawOutput) -> Result<NormalizedResult, ProcessError> {
        let mut result = NormalizedResult::new();
        for trace in &raw.traces {
            insert_channel(
                &mut result,
                trace.name.as_str(),
                ChannelData::Series(trace_samples(trace)?),
            )?;
        }
        for (name, value) in &raw.scalars {
            insert_channel(&mut result, name.as_str(), ChannelData::Scalar(*value))?;
        }
        Ok(result)
    }
}

impl OutputProcessor for OutputPortProcessor {
    fn extract(&self, raw: &RawOutput) -> Result<NormalizedResult, ProcessError> {
        if self.selectors.is_empty() {
            return Self::extract_all(raw);
        }

        let mut result = NormalizedResult::new();
        for selector in &self.selectors {
            if let Some(trace) = selector.find_trace(raw) {
                let name = selector.channel_name(&trace.name);
                trace!(channel = name, samples = trace.time.len(), "Extracting trace");
                insert_channel(&mut result, name, ChannelData::Series(trace_samples(trace)?))?;
                continue;
            }
            match &selector.source {
                ChannelSource::Name(name) => match raw.scalars.get(name) {
                    Some(value) => insert_channel(
                        &mut result,
                        selector.channel_name(name),
                        ChannelData::Scalar(*value),
                    )?,
                    None => return Err(ProcessError::ChannelNotFound(selector.to_string())),
                },
                ChannelSource::Port(_) => {
                    return Err(ProcessError::ChannelNotFound(selector.to_string()))
                }
            }
        }
        Ok(result)
    }
}
