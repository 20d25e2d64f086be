//! The batch orchestration loop.

use crate::{BatchMetrics, HookError, RunnerConfig, SweepError};
use simsweep_core::{
    OutputProcessor, ResultRecorder, SessionGuard, SimulationSession, StageError,
};
use simsweep_params::ParameterSpace;
use simsweep_types::{
    BatchIndex, BatchKey, BatchOutcome, BatchStage, BatchStatus, NormalizedResult, ParameterAssignment,
    ParameterSpec, RunConfig, RunSummary, SummaryBuilder,
};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Drives one simulation session through a parameter sweep.
///
/// The runner owns the session, the processor and the recorder for its whole
/// lifetime. Per batch it runs:
///
/// ```text
/// descr_func ─▶ apply ─▶ execute ─▶ extract ─▶ record ─▶ after_func
///               └──────── stage failure: policy decides ────────┘
/// ```
///
/// Batches run strictly in expansion order, one at a time. Store keys start
/// at the recorder's [`next_index`](ResultRecorder::next_index), so a sweep
/// appended to an existing store lands after its entries.
pub struct BatchRunner {
    session: SessionGuard<Box<dyn SimulationSession>>,
    model_spec: ParameterSpec,
    run_config: RunConfig,
    processor: Box<dyn OutputProcessor>,
    recorder: Box<dyn ResultRecorder>,
    config: RunnerConfig,
    ran: bool,
    closed: bool,
}

impl BatchRunner {
    /// Build a runner and load the artifact into the session.
    ///
    /// # Arguments
    ///
    /// * `session` - Unprepared engine session
    /// * `artifact` - Artifact the session loads
    /// * `model_spec` - Model parameters to sweep
    /// * `run_config` - Run-control values applied to every batch
    /// * `processor` - Raw output extraction
    /// * `recorder` - Opened result store
    /// * `config` - Failure policy and stop conditions
    ///
    /// On a failed prepare the session is released and the recorder closed
    /// before the error is returned.
    pub fn new(
        session: Box<dyn SimulationSession>,
        artifact: &str,
        model_spec: ParameterSpec,
        run_config: RunConfig,
        processor: Box<dyn OutputProcessor>,
        mut recorder: Box<dyn ResultRecorder>,
        config: RunnerConfig,
    ) -> Result<Self, SweepError> {
        let mut session = SessionGuard::new(session);
        if let Err(e) = session.prepare(artifact) {
            if let Err(close_err) = recorder.close() {
                warn!(error = %close_err, "Failed to close store after failed prepare");
            }
            return Err(SweepError::Prepare(e));
        }

        Ok(Self {
            session,
            model_spec,
            run_config,
            processor,
            recorder,
            config,
            ran: false,
            closed: false,
        })
    }

    /// The model-parameter spec being swept.
    pub fn model_spec(&self) -> &ParameterSpec {
        &self.model_spec
    }

    /// The fixed run configuration.
    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Run the sweep.
    ///
    /// `descr_func(assignment, index)` describes each batch before it runs;
    /// the description is stored with the entry. `after_func(index,
    /// description, result)` is called after a batch was recorded; its errors
    /// and panics are logged and otherwise ignored.
    ///
    /// Under halt-on-error the first failed batch ends the sweep with
    /// [`SweepError::BatchFailed`]. A store that becomes unavailable ends it
    /// under either policy. The runner can run once.
    pub fn run<D, A>(&mut self, descr_func: D, mut after_func: A) -> Result<RunSummary, SweepError>
    where
        D: Fn(&ParameterAssignment, usize) -> String,
        A: FnMut(usize, &str, &NormalizedResult) -> Result<(), HookError>,
    {
        if self.ran || self.closed {
            return Err(SweepError::Closed);
        }
        self.ran = true;

        let space = ParameterSpace::new(self.model_spec.clone())?;
        let first = self.recorder.next_index();
        info!(
            batches = space.len(),
            first_key = %first.key(),
            policy = %self.config.policy,
            max_batches = ?self.config.max_batches,
            "Starting sweep"
        );

        let mut summary = SummaryBuilder::new();
        let mut metrics = BatchMetrics::new();
        let mut stopped_early = false;

        for (i, assignment) in space.iter().enumerate() {
            if self.config.stop_requested(i) {
                info!(attempted = i, remaining = space.len() - i, "Stopping sweep early");
                stopped_early = true;
                break;
            }

            let index = BatchIndex(i);
            let key = BatchIndex(first.0 + i).key();
            let description = descr_func(&assignment, i);
            debug!(%index, %key, %assignment, "Batch starting");

            let started = Instant::now();
            let outcome = self.run_batch(key, &assignment, &description);
            let elapsed = started.elapsed();
            metrics.record(elapsed, outcome.is_ok());

            match outcome {
                Ok(result) => {
                    summary.push(BatchOutcome {
                        index,
                        key,
                        assignment,
                        description: description.clone(),
                        status: BatchStatus::Succeeded,
                        elapsed,
                    });
                    notify(&mut after_func, i, &description, &result);
                }
                Err(err) => {
                    warn!(%index, stage = %err.stage, error = %err.source, "Batch failed");
                    summary.push(BatchOutcome {
                        index,
                        key,
                        assignment,
                        description,
                        status: BatchStatus::Failed {
                            stage: err.stage,
                            error: err.source.to_string(),
                        },
                        elapsed,
                    });

                    if err.source.is_fatal() {
                        error!(%index, "Store unavailable, aborting sweep");
                        metrics.report().log();
                        return Err(SweepError::StoreUnavailable {
                            index,
                            source: err,
                            summary: summary.finish(false),
                        });
                    }
                    if !self.config.policy.continues() {
                        metrics.report().log();
                        return Err(SweepError::BatchFailed {
                            index,
                            source: err,
                            summary: summary.finish(false),
                        });
                    }
                }
            }
        }

        metrics.report().log();
        let summary = summary.finish(stopped_early);
        info!(
            attempted = summary.len(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            stopped_early,
            "Sweep finished"
        );
        Ok(summary)
    }

    fn run_batch(
        &mut self,
        key: BatchKey,
        assignment: &ParameterAssignment,
        description: &str,
    ) -> Result<NormalizedResult, StageError> {
        self.session
            .apply(assignment, &self.run_config)
            .map_err(|e| StageError::new(BatchStage::Apply, e))?;
        let raw = self
            .session
            .execute()
            .map_err(|e| StageError::new(BatchStage::Execute, e))?;
        let result = self
            .processor
            .extract(&raw)
            .map_err(|e| StageError::new(BatchStage::Extract, e))?;
        self.recorder
            .record(key, assignment, description, &result)
            .map_err(|e| StageError::new(BatchStage::Record, e))?;
        Ok(result)
    }

    /// Release the session and close the store.
    ///
    /// Both are attempted even if one fails; the first failure is returned.
    /// Safe to call repeatedly.
    pub fn close(&mut self) -> Result<(), SweepError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let released = self.session.release();
        let closed = self.recorder.close();
        debug!("Runner closed");
        released
            .map_err(|e| SweepError::Close(e.into()))
            .and(closed.map_err(|e| SweepError::Close(e.into())))
    }

    /// Check if [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for BatchRunner {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to close runner on drop");
        }
    }
}

fn notify<A>(after_func: &mut A, index: usize, description: &str, result: &NormalizedResult)
where
    A: FnMut(usize, &str, &NormalizedResult) -> Result<(), HookError>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| after_func(index, description, result))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(index, error = %e, "After-batch hook failed"),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(index, panic = %message, "After-batch hook panicked");
        }
    }
}
