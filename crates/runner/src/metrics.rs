//! Batch timing metrics.

use hdrhistogram::Histogram;
use std::time::Duration;
use tracing::info;

/// Collects per-batch wall-clock times (microsecond resolution).
#[derive(Debug)]
pub struct BatchMetrics {
    histogram: Option<Histogram<u64>>,
    succeeded: u64,
    failed: u64,
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchMetrics {
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(3).ok(),
            succeeded: 0,
            failed: 0,
        }
    }

    /// Record one batch.
    pub fn record(&mut self, elapsed: Duration, success: bool) {
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        if let Some(histogram) = self.histogram.as_mut() {
            histogram.saturating_record(elapsed.as_micros().min(u64::MAX as u128) as u64);
        }
    }

    /// Summarize what was recorded.
    pub fn report(&self) -> MetricsReport {
        let micros = |v: u64| Duration::from_micros(v);
        match &self.histogram {
            Some(h) if !h.is_empty() => MetricsReport {
                batches: h.len(),
                succeeded: self.succeeded,
                failed: self.failed,
                p50: micros(h.value_at_quantile(0.5)),
                p99: micros(h.value_at_quantile(0.99)),
                max: micros(h.max()),
                mean: Duration::from_secs_f64(h.mean() / 1_000_000.0),
            },
            _ => MetricsReport {
                succeeded: self.succeeded,
                failed: self.failed,
                ..MetricsReport::default()
            },
        }
    }
}

/// Batch timing summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsReport {
    pub batches: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub p50: Duration,
    pub p99: Duration,
    pub max: Duration,
    pub mean: Duration,
}

impl MetricsReport {
    /// Log the report at info level.
    pub fn log(&self) {
        info!(
            batches = self.batches,
            succeeded = self.succeeded,
            failed = self.failed,
            p50_ms = self.p50.as_secs_f64() * 1000.0,
            p99_ms = self.p99.as_secs_f64() * 1000.0,
            max_ms = self.max.as_secs_f64() * 1000.0,
            mean_ms = self.mean.as_secs_f64() * 1000.0,
            "Batch timings"
        );
    }
}
