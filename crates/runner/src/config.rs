//! Runner configuration.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the runner does when a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failed batch.
    #[default]
    HaltOnError,
    /// Record the failure and move on to the next batch.
    ContinueOnError,
}

impl FailurePolicy {
    /// Resolve the policy from a command-line flag and a configured default.
    ///
    /// The flag only ever turns continue-on-error on; when absent the
    /// configured value applies, and halt-on-error otherwise.
    pub fn resolve(continue_flag: bool, configured: Option<bool>) -> Self {
        if continue_flag || configured.unwrap_or(false) {
            FailurePolicy::ContinueOnError
        } else {
            FailurePolicy::HaltOnError
        }
    }

    pub fn continues(self) -> bool {
        self == FailurePolicy::ContinueOnError
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::HaltOnError => f.write_str("halt-on-error"),
            FailurePolicy::ContinueOnError => f.write_str("continue-on-error"),
        }
    }
}

/// Configuration for a [`BatchRunner`](crate::BatchRunner).
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Failure policy.
    pub policy: FailurePolicy,

    /// Maximum number of batches to attempt; `None` runs the whole expansion.
    pub max_batches: Option<usize>,

    /// Stop signal checked before each batch.
    pub stop: Option<Arc<AtomicBool>>,
}

impl RunnerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Limit the number of attempted batches.
    pub fn with_max_batches(mut self, max: usize) -> Self {
        self.max_batches = Some(max);
        self
    }

    /// Install a stop flag. Setting it ends the sweep before the next batch.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub(crate) fn stop_requested(&self, attempted: usize) -> bool {
        self.max_batches.is_some_and(|max| attempted >= max)
            || self
                .stop
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_resolution() {
        assert_eq!(FailurePolicy::resolve(false, None), FailurePolicy::HaltOnError);
        assert_eq!(
            FailurePolicy::resolve(false, Some(false)),
            FailurePolicy::HaltOnError
        );
        assert_eq!(
            FailurePolicy::resolve(false, Some(true)),
            FailurePolicy::ContinueOnError
        );
        assert_eq!(
            FailurePolicy::resolve(true, Some(false)),
            FailurePolicy::ContinueOnError
        );
    }

    #[test]
    fn test_stop_conditions() {
        let config = RunnerConfig::new().with_max_batches(2);
        assert!(!config.stop_requested(1));
        assert!(config.stop_requested(2));

        let flag = Arc::new(AtomicBool::new(false));
        let config = RunnerConfig::new().with_stop_flag(flag.clone());
        assert!(!config.stop_requested(100));
        flag.store(true, Ordering::Release);
        assert!(config.stop_requested(0));
    }
}
