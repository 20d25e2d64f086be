//! Wiring of a sweep from resolved settings.

use crate::args::ProcessorKind;
use crate::settings::SweepSettings;
use simsweep_core::{OutputProcessor, ResultRecorder};
use simsweep_engine::CommandSession;
use simsweep_processors::{OutputPortProcessor, SummaryProcessor};
use simsweep_runner::{BatchRunner, HookError, SweepError};
use simsweep_storage::DirectoryStore;
use simsweep_types::{NormalizedResult, ParameterAssignment, RunSummary};
use tracing::info;

/// Description stored with every batch.
pub fn describe_batch(assignment: &ParameterAssignment, _index: usize) -> String {
    format!("Simulation batch with arguments: {}", assignment)
}

/// Log each finished batch.
pub fn log_batch(index: usize, description: &str, _result: &NormalizedResult) -> Result<(), HookError> {
    info!("Running batch {}: {}", index, description);
    Ok(())
}

/// Build the configured output processor.
pub fn build_processor(settings: &SweepSettings) -> Box<dyn OutputProcessor> {
    let selectors = settings.channels.clone();
    match settings.processor {
        ProcessorKind::Ports => Box::new(OutputPortProcessor::new(selectors)),
        ProcessorKind::Summary => Box::new(SummaryProcessor::new(selectors)),
    }
}

/// Run a sweep end to end and close everything afterwards.
pub fn run_sweep(settings: &SweepSettings) -> Result<RunSummary, Box<dyn std::error::Error>> {
    info!(
        model = %settings.model,
        output = %settings.output.display(),
        engine = %settings.engine.program,
        "Preparing sweep"
    );

    let recorder = DirectoryStore::open(&settings.output, settings.open_mode)?;
    let session = CommandSession::new(settings.engine.clone());
    let mut runner = BatchRunner::new(
        Box::new(session),
        &settings.model,
        settings.model_spec.clone(),
        settings.run_config.clone(),
        build_processor(settings),
        Box::new(recorder),
        settings.runner_config(),
    )?;

    let result = runner.run(describe_batch, log_batch);
    let closed = runner.close();
    let summary = result?;
    closed?;
    Ok(summary)
}

/// Turn a sweep result into the process outcome, printing the summary.
pub fn report(result: Result<RunSummary, Box<dyn std::error::Error>>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(summary) => {
            print!("{}", summary);
            if summary.failed() > 0 {
                return Err(format!("{} of {} batches failed", summary.failed(), summary.len()).into());
            }
            Ok(())
        }
        Err(e) => {
            if let Some(summary) = e.downcast_ref::<SweepError>().and_then(SweepError::summary) {
                print!("{}", summary);
            }
            Err(e)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::args::Cli;
    use crate::config::FileConfig;
    use clap::Parser;
    use simsweep_storage::StoreReader;
    use std::fs;

    const ENGINE: &str = r#"
request=$(cat)
case "$request" in
  *'"gain":"3"'*) echo "gain out of range" >&2; exit 1 ;;
esac
echo '{"traces":[{"name":"y","port":1,"time":[0,1],"values":[1,2]}],"scalars":{"energy":3.0}}'
"#;

    fn settings(dir: &std::path::Path, extra: &[&str]) -> SweepSettings {
        fs::write(dir.join("plant.sh"), ENGINE).unwrap();
        let output = dir.join("sims_{}");
        let mut argv = vec![
            "simsweep",
            "plant.sh",
            "-p",
            dir.to_str().unwrap(),
            "--engine",
            "sh",
            "-o",
            output.to_str().unwrap(),
            "-s",
            "StopTime=10",
        ];
        argv.extend_from_slice(extra);
        SweepSettings::resolve(Cli::try_parse_from(argv).unwrap(), FileConfig::default()).unwrap()
    }

    #[test]
    fn test_end_to_end_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &["-m", "gain=1 2", "len=4"]);

        let summary = run_sweep(&settings).unwrap();
        assert_eq!(summary.len(), 2);
        assert!(summary.is_complete_success());

        let reader = StoreReader::open(dir.path().join("sims_plant")).unwrap();
        let stored = reader.read_all().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(
            stored[1].attributes.description,
            "Simulation batch with arguments: gain=2, len=4"
        );
        assert_eq!(stored[0].result.channel_names().collect::<Vec<_>>(), vec!["y", "energy"]);
        assert!(report(Ok(summary)).is_ok());
    }

    #[test]
    fn test_failed_batches_fail_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(
            dir.path(),
            &["-m", "gain=1 3 2", "-e", "--processor", "summary", "--channel", "y"],
        );

        let summary = run_sweep(&settings).unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.failed(), 1);
        assert!(report(Ok(summary)).is_err());

        let halted = self::settings(dir.path(), &["-m", "gain=3 1"]);
        let err = run_sweep(&halted).unwrap_err();
        let summary = err.downcast_ref::<SweepError>().and_then(SweepError::summary).unwrap();
        assert_eq!(summary.len(), 1);
    }

    #[test]
    fn test_append_adds_to_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        run_sweep(&settings(dir.path(), &["-m", "gain=1 2"])).unwrap();
        let summary = run_sweep(&settings(dir.path(), &["-m", "gain=4 5", "--append"])).unwrap();
        assert!(summary.is_complete_success());

        let stored = StoreReader::open(dir.path().join("sims_plant"))
            .unwrap()
            .read_all()
            .unwrap();
        let descriptions: Vec<_> = stored
            .iter()
            .map(|s| s.attributes.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "Simulation batch with arguments: gain=1",
                "Simulation batch with arguments: gain=2",
                "Simulation batch with arguments: gain=4",
                "Simulation batch with arguments: gain=5",
            ]
        );
    }
}
