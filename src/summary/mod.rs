//! Run summary rendering
//!
//! The plain-text summary is printed and persisted identically; the JSON
//! form ([`RunSummary`]) is an optional machine-readable companion.

mod run_summary;

pub use run_summary::{
    FailedQuery, FileFailures, RunSummary, Timing, RUN_SUMMARY_SCHEMA_ID, RUN_SUMMARY_SCHEMA_VERSION,
};

use std::fs;
use std::io;
use std::path::Path;

use crate::state::RunState;

/// The human-readable run summary, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    lines: Vec<String>,
}

impl Summary {
    /// Render the overall line followed by one block per file with listed failures.
    pub fn from_state(state: &RunState, report_prefix: &str) -> Self {
        let passed = state.num_passed();
        let mut lines = vec![format!(
            "{}/{} ({:.1}%) test{} passed, {} failed",
            passed,
            state.total(),
            state.pass_rate(),
            if passed == 1 { "" } else { "s" },
            state.num_failed()
        )];

        for file in state.files_with_failures() {
            lines.push(format!("test {}:", display_report_path(&file.path, report_prefix)));
            for query in &file.failed {
                lines.push(format!("    {} - {}", query.id, query.name));
            }
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Print to stdout and, if given, overwrite the summary file with the same text.
    pub fn emit(&self, persist_to: Option<&Path>) -> io::Result<()> {
        print!("{}", self.render());
        if let Some(path) = persist_to {
            fs::write(path, self.render())?;
        }
        Ok(())
    }
}

/// Report path with the generated-file prefix dropped from its file name.
pub fn display_report_path(path: &Path, report_prefix: &str) -> String {
    let stripped = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix(report_prefix))
        .filter(|n| !n.is_empty());
    match stripped {
        Some(name) => path.with_file_name(name).display().to_string(),
        None => path.display().to_string(),
    }
}

/// Process exit code: the failed-query count, saturated to what a process can report.
///
/// Quiet mode always reports success.
pub fn exit_code(state: &RunState, quiet: bool) -> u8 {
    if quiet {
        return 0;
    }
    u8::try_from(state.num_failed()).unwrap_or(u8::MAX)
}
