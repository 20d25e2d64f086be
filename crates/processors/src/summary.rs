//! Aggregating processor: reduce traces to summary statistics.

use crate::ports::insert_channel;
use crate::{trace_samples, ChannelSelector};
use simsweep_core::{OutputProcessor, ProcessError};
use simsweep_types::{ChannelData, NormalizedResult, RawOutput, RawTrace};
use tracing::debug;

/// Reduces each selected trace to scalar channels
/// `<name>.min`, `<name>.max`, `<name>.mean` and `<name>.final`.
///
/// Operates over the same raw output shape as
/// [`OutputPortProcessor`](crate::OutputPortProcessor). Empty traces produce
/// no statistics.
#[derive(Debug, Clone, Default)]
pub struct SummaryProcessor {
    selectors: Vec<ChannelSelector>,
}

impl SummaryProcessor {
    /// Summarize only the given traces.
    pub fn new(selectors: Vec<ChannelSelector>) -> Self {
        Self { selectors }
    }

    /// Summarize every trace.
    pub fn all() -> Self {
        Self::default()
    }

    fn summarize(
        result: &mut NormalizedResult,
        name: &str,
        trace: &RawTrace,
    ) -> Result<(), ProcessError> {
        let samples = trace_samples(trace)?;
        let Some(last) = samples.last() else {
            debug!(channel = name, "Skipping empty trace");
            return Ok(());
        };

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        // running mean stays finite where a plain sum would overflow
        let mut mean = 0.0;
        for (n, sample) in samples.iter().enumerate() {
            min = min.min(sample.value);
            max = max.max(sample.value);
            mean += (sample.value - mean) / (n + 1) as f64;
        }

        for (stat, value) in [("min", min), ("max", max), ("mean", mean), ("final", last.value)] {
            insert_channel(result, format!("{}.{}", name, stat), ChannelData::Scalar(value))?;
        }
        Ok(())
    }
}

impl OutputProcessor for SummaryProcessor {
    fn extract(&self, raw: &RawOutput) -> Result<NormalizedResult, ProcessError> {
        let mut result = NormalizedResult::new();
        if self.selectors.is_empty() {
            for trace in &raw.traces {
                Self::summarize(&mut result, &trace.name, trace)?;
            }
            return Ok(result);
        }
        for selector in &self.selectors {
            let trace = selector
                .find_trace(raw)
                .ok_or_else(|| ProcessError::ChannelNotFound(selector.to_string()))?;
            Self::summarize(&mut result, selector.channel_name(&trace.name), trace)?;
        }
        Ok(result)
    }
}
