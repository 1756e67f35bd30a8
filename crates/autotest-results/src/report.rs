//! Parsed reports.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::parser::{parse_document, RawQuery};
use crate::verdict::{classify, Verdict};
use crate::ReportError;

/// One evaluated query within a report.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Report-local identifier.
    pub id: String,
    /// Human-readable label taken from the `comment` attribute.
    pub name: String,
    pub verdict: Verdict,
    /// Expected answer tokens. `None` when no expectation was recorded.
    pub expected_answers: Option<Vec<String>>,
    /// Seconds spent on the query, recorded only alongside a `correct` element.
    pub time_taken: Option<f64>,
    /// Expected answer tokens that occur more than once.
    pub duplicate_answers: BTreeSet<String>,
}

impl Query {
    /// Classify a raw query and derive its answer diagnostics.
    pub fn from_raw(raw: &RawQuery) -> Result<Self, ReportError> {
        let verdict = classify(raw);

        let time_taken = match (&raw.correct, &raw.time_taken) {
            (Some(_), Some(text)) => Some(parse_seconds(&raw.id, text)?),
            _ => None,
        };

        let (expected_answers, duplicate_answers) = match raw.correct.as_deref() {
            Some(text) if !text.is_empty() => (
                Some(text.split(',').map(str::to_string).collect()),
                duplicate_answers(text),
            ),
            _ => (None, BTreeSet::new()),
        };

        Ok(Self {
            id: raw.id.clone(),
            name: raw.comment.clone().unwrap_or_default(),
            verdict,
            expected_answers,
            time_taken,
            duplicate_answers,
        })
    }
}

fn parse_seconds(id: &str, text: &str) -> Result<f64, ReportError> {
    let invalid = || ReportError::InvalidTimeTaken {
        id: id.to_string(),
        text: text.to_string(),
    };
    let seconds: f64 = text.trim().parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }
    Ok(seconds)
}

/// Tokens of a comma-separated answer list that appear more than once.
///
/// Tokens are compared exactly, without trimming.
pub fn duplicate_answers(answers: &str) -> BTreeSet<String> {
    let mut seen = HashSet::new();
    let mut dupes = BTreeSet::new();
    for token in answers.split(',') {
        if !seen.insert(token) {
            dupes.insert(token.to_string());
        }
    }
    dupes
}

/// One parsed XML report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub path: PathBuf,
    /// Queries in document order.
    pub queries: Vec<Query>,
}

impl Report {
    /// Parse report text that was read from `path`.
    pub fn from_str(path: impl Into<PathBuf>, xml: &str) -> Result<Self, ReportError> {
        let queries = parse_document(xml)?
            .iter()
            .map(Query::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            path: path.into(),
            queries,
        })
    }
}

/// Read and parse the report at `path`.
pub fn parse_report(path: &Path) -> Result<Report, ReportError> {
    let xml = fs::read_to_string(path)?;
    Report::from_str(path, &xml)
}
