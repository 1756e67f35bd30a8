//! Run-wide accumulation of query verdicts.
//!
//! A `RunState` is owned by the command driving the run and mutated only
//! through [`RunState::ingest`] and [`RunState::record_parse_failure`], one
//! report at a time, in discovery order.

use autotest_results::{Report, ReportError, Verdict};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A query as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRef {
    pub id: String,
    pub name: String,
}

/// Passed and failed queries of one report, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileResults {
    pub path: PathBuf,
    pub passed: Vec<QueryRef>,
    pub failed: Vec<QueryRef>,
}

/// Something about a fixture worth telling the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Exception { file: PathBuf, query: QueryRef },
    Timeout { file: PathBuf, query: QueryRef },
    Ambiguous { file: PathBuf, query: QueryRef, reason: &'static str },
    DuplicateAnswers { file: PathBuf, query: QueryRef, tokens: BTreeSet<String> },
    UnreadableReport { file: PathBuf, error: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Exception { file, query } => {
                write!(f, "{}/{} - {} threw exception", file.display(), query.id, query.name)
            }
            Diagnostic::Timeout { file, query } => {
                write!(f, "{}/{} - {} timed out", file.display(), query.id, query.name)
            }
            Diagnostic::Ambiguous { file, query, reason } => {
                write!(f, "{}/{} - {} {}", file.display(), query.id, query.name, reason)
            }
            Diagnostic::DuplicateAnswers { file, query, tokens } => {
                let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
                write!(
                    f,
                    "duplicate answers for {}/{} - {}:\n    {{{}}}",
                    file.display(),
                    query.id,
                    query.name,
                    tokens.join(", ")
                )
            }
            Diagnostic::UnreadableReport { file, error } => {
                write!(f, "skipping report {}: {}", file.display(), error)
            }
        }
    }
}

/// Summary statistics over the recorded query durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingStats {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub max: f64,
}

/// Accumulated verdicts of every report processed in one invocation.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    files: Vec<FileResults>,
    num_passed: usize,
    num_failed: usize,
    timing_samples: Vec<f64>,
    skipped_reports: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed report into the run.
    pub fn ingest(&mut self, report: &Report) {
        let mut results = FileResults {
            path: report.path.clone(),
            ..FileResults::default()
        };

        for query in &report.queries {
            let query_ref = QueryRef {
                id: query.id.clone(),
                name: query.name.clone(),
            };

            if query.verdict.counts_as_pass() {
                self.num_passed += 1;
                results.passed.push(query_ref.clone());
            }
            if query.verdict.counts_as_failure() {
                self.num_failed += 1;
            }
            if query.verdict.listed_as_failure() {
                results.failed.push(query_ref.clone());
            }
            if let Some(seconds) = query.time_taken {
                self.timing_samples.push(seconds);
            }

            match query.verdict {
                Verdict::Exception => self.diagnose(Diagnostic::Exception {
                    file: report.path.clone(),
                    query: query_ref.clone(),
                }),
                Verdict::Timeout => self.diagnose(Diagnostic::Timeout {
                    file: report.path.clone(),
                    query: query_ref.clone(),
                }),
                Verdict::Ambiguous(reason) => self.diagnose(Diagnostic::Ambiguous {
                    file: report.path.clone(),
                    query: query_ref.clone(),
                    reason: reason.describe(),
                }),
                Verdict::Passed | Verdict::Failed => {}
            }

            if !query.duplicate_answers.is_empty() {
                self.diagnose(Diagnostic::DuplicateAnswers {
                    file: report.path.clone(),
                    query: query_ref,
                    tokens: query.duplicate_answers.clone(),
                });
            }
        }

        self.files.push(results);
    }

    /// Note a report that contributed nothing because it could not be read.
    pub fn record_parse_failure(&mut self, path: &Path, error: &ReportError) {
        self.skipped_reports.push(path.to_path_buf());
        self.diagnose(Diagnostic::UnreadableReport {
            file: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn num_passed(&self) -> usize {
        self.num_passed
    }

    pub fn num_failed(&self) -> usize {
        self.num_failed
    }

    pub fn total(&self) -> usize {
        self.num_passed + self.num_failed
    }

    /// Percentage of counted queries that passed; 0 for an empty run.
    pub fn pass_rate(&self) -> f64 {
        100.0 * self.num_passed as f64 / self.total().max(1) as f64
    }

    /// Per-report results in ingest order.
    pub fn files(&self) -> &[FileResults] {
        &self.files
    }

    pub fn files_with_failures(&self) -> impl Iterator<Item = &FileResults> {
        self.files.iter().filter(|f| !f.failed.is_empty())
    }

    pub fn timing_samples(&self) -> &[f64] {
        &self.timing_samples
    }

    pub fn timing_stats(&self) -> Option<TimingStats> {
        if self.timing_samples.is_empty() {
            return None;
        }
        let count = self.timing_samples.len();
        let total: f64 = self.timing_samples.iter().sum();
        let max = self.timing_samples.iter().copied().fold(f64::MIN, f64::max);
        Some(TimingStats {
            count,
            total,
            mean: total / count as f64,
            max,
        })
    }

    pub fn skipped_reports(&self) -> &[PathBuf] {
        &self.skipped_reports
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autotest_results::AmbiguityReason;

    fn report(xml: &str) -> Report {
        Report::from_str("dir/output-q.xml", xml).unwrap()
    }

    fn ids(list: &[QueryRef]) -> Vec<&str> {
        list.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_empty_report_contributes_nothing() {
        let mut state = RunState::new();
        state.ingest(&report("<root/>"));

        assert_eq!(state.num_passed(), 0);
        assert_eq!(state.num_failed(), 0);
        assert_eq!(state.files().len(), 1);
        assert!(state.files()[0].passed.is_empty());
        assert!(state.files()[0].failed.is_empty());
        assert_eq!(state.files_with_failures().count(), 0);
    }

    #[test]
    fn test_passed_queries_keep_document_order() {
        let mut state = RunState::new();
        state.ingest(&report(
            r#"<root>
<query><id comment="third">3</id><correct>1</correct><passed/></query>
<query><id comment="first">1</id><correct>1</correct><passed/></query>
<query><id comment="second">2</id><correct>1</correct><passed/></query>
</root>"#,
        ));

        assert_eq!(state.num_passed(), 3);
        assert_eq!(ids(&state.files()[0].passed), vec!["3", "1", "2"]);
        assert_eq!(state.files()[0].passed[0].name, "third");
    }

    #[test]
    fn test_exception_is_listed_timeout_is_not() {
        let mut state = RunState::new();
        state.ingest(&report(
            r#"<root>
<query><id comment="boom">1</id><exception/></query>
<query><id comment="slow">2</id><timeout/></query>
</root>"#,
        ));

        assert_eq!(state.num_failed(), 2);
        assert_eq!(state.num_passed(), 0);
        assert_eq!(ids(&state.files()[0].failed), vec!["1"]);
        assert!(matches!(state.diagnostics()[0], Diagnostic::Exception { .. }));
        assert!(matches!(state.diagnostics()[1], Diagnostic::Timeout { .. }));
    }

    #[test]
    fn test_ambiguous_queries_only_warn() {
        let mut state = RunState::new();
        state.ingest(&report(
            r#"<root>
<query><id comment="nothing">1</id></query>
<query><id comment="undecided">2</id><correct>1</correct></query>
</root>"#,
        ));

        assert_eq!(state.total(), 0);
        assert_eq!(state.diagnostics().len(), 2);
        assert_eq!(
            state.diagnostics()[0],
            Diagnostic::Ambiguous {
                file: PathBuf::from("dir/output-q.xml"),
                query: QueryRef {
                    id: "1".to_string(),
                    name: "nothing".to_string()
                },
                reason: AmbiguityReason::NoCorrectResult.describe(),
            }
        );
    }

    #[test]
    fn test_duplicate_answers_are_warnings_only() {
        let mut state = RunState::new();
        state.ingest(&report(
            r#"<root><query><id comment="dup">5</id><correct>a,b,a,c</correct><passed/></query></root>"#,
        ));

        assert_eq!(state.num_passed(), 1);
        assert_eq!(state.num_failed(), 0);
        match &state.diagnostics()[..] {
            [Diagnostic::DuplicateAnswers { tokens, query, .. }] => {
                assert_eq!(tokens, &BTreeSet::from(["a".to_string()]));
                assert_eq!(query.id, "5");
            }
            other => panic!("unexpected diagnostics: {:?}", other),
        }
    }

    #[test]
    fn test_timing_samples_and_stats() {
        let mut state = RunState::new();
        assert!(state.timing_stats().is_none());

        state.ingest(&report(
            r#"<root>
<query><id comment="a">1</id><correct>1</correct><time_taken>1.5</time_taken><passed/></query>
<query><id comment="b">2</id><correct>1</correct><time_taken>4.5</time_taken><failed/></query>
<query><id comment="c">3</id><correct>1</correct><passed/></query>
</root>"#,
        ));

        assert_eq!(state.timing_samples(), &[1.5, 4.5]);
        let stats = state.timing_stats().unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total, 6.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.max, 4.5);
    }

    #[test]
    fn test_parse_failure_leaves_counters_untouched() {
        let mut state = RunState::new();
        let err = Report::from_str("bad.xml", "<root>").unwrap_err();
        state.record_parse_failure(Path::new("bad.xml"), &err);

        assert_eq!(state.total(), 0);
        assert!(state.files().is_empty());
        assert_eq!(state.skipped_reports(), &[PathBuf::from("bad.xml")]);
    }

    #[test]
    fn test_pass_rate() {
        let mut state = RunState::new();
        assert_eq!(state.pass_rate(), 0.0);

        state.ingest(&report(
            r#"<root>
<query><id comment="a">1</id><correct>1</correct><passed/></query>
<query><id comment="b">2</id><correct>1</correct><failed/></query>
</root>"#,
        ));
        assert_eq!(state.pass_rate(), 50.0);
    }
}
