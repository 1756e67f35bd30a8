//! Command pipelines
//!
//! `run`: validate the executable, run every fixture, then parse the
//! reports it produced. `parse`: summarize reports already on disk.
//! Both end in a [`RunState`] that the caller renders.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use autotest_results::{parse_report, ReportError};

use crate::config::HarnessConfig;
use crate::reports::discover_reports;
use crate::runner::{Executable, Runner, RunnerError};
use crate::state::RunState;

/// Errors that abort a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: ReportError,
    },
}

/// Fold the reports at `paths` into `state`, in order.
///
/// Unreadable or malformed reports are recorded and skipped; only an
/// unrecoverable report error stops the fold.
pub fn ingest_reports(state: &mut RunState, paths: &[PathBuf]) -> Result<(), PipelineError> {
    for path in paths {
        match parse_report(path) {
            Ok(report) => state.ingest(&report),
            Err(e) if e.is_recoverable() => state.record_parse_failure(path, &e),
            Err(source) => {
                return Err(PipelineError::Report {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
    Ok(())
}

/// Run every fixture under `roots` with `executable` and aggregate the results.
pub fn run_tests(
    config: &HarnessConfig,
    executable: &Path,
    roots: &[PathBuf],
) -> Result<RunState, PipelineError> {
    let executable = Executable::validate(executable)?;
    let runner = Runner::new(executable, config);
    let invocations = runner.run(roots)?;

    info!("parsing results...");
    let mut seen = HashSet::new();
    let reports: Vec<PathBuf> = invocations
        .into_iter()
        .map(|i| i.report)
        .filter(|report| seen.insert(report.clone()))
        .collect();
    let mut state = RunState::new();
    ingest_reports(&mut state, &reports)?;
    Ok(state)
}

/// Aggregate existing reports: files as given, directories walked for `.xml`.
pub fn parse_results(inputs: &[PathBuf]) -> Result<RunState, PipelineError> {
    let reports = discover_reports(inputs)?;
    let mut state = RunState::new();
    ingest_reports(&mut state, &reports)?;
    Ok(state)
}
