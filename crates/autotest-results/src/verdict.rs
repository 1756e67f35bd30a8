//! Per-query verdict classification.

use serde::{Deserialize, Serialize};

use crate::parser::RawQuery;

/// Why a query could not be given a definite outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityReason {
    /// No `correct` element and no `exception`/`timeout` marker.
    NoCorrectResult,
    /// A `correct` element but neither `passed` nor `failed`.
    NeitherPassedNorFailed,
}

impl AmbiguityReason {
    pub fn describe(&self) -> &'static str {
        match self {
            AmbiguityReason::NoCorrectResult => "has no correct result",
            AmbiguityReason::NeitherPassedNorFailed => "neither passed nor failed",
        }
    }
}

/// Outcome of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
    Exception,
    Timeout,
    Ambiguous(AmbiguityReason),
}

impl Verdict {
    /// Counted toward the run's passed total.
    pub fn counts_as_pass(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    /// Counted toward the run's failed total.
    pub fn counts_as_failure(&self) -> bool {
        matches!(self, Verdict::Failed | Verdict::Exception | Verdict::Timeout)
    }

    /// Listed under its file in the failure summary.
    ///
    /// Timeouts are counted as failures but not listed.
    pub fn listed_as_failure(&self) -> bool {
        matches!(self, Verdict::Failed | Verdict::Exception)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Passed => "passed",
            Verdict::Failed => "failed",
            Verdict::Exception => "exception",
            Verdict::Timeout => "timeout",
            Verdict::Ambiguous(_) => "ambiguous",
        }
    }
}

/// Decide the verdict of a query from the markers it carries.
///
/// Without a `correct` element: `exception` wins over `timeout`.
/// With one: `failed` wins over `passed`.
pub fn classify(query: &RawQuery) -> Verdict {
    match (query.correct.is_some(), query) {
        (false, RawQuery { exception: true, .. }) => Verdict::Exception,
        (false, RawQuery { timeout: true, .. }) => Verdict::Timeout,
        (false, _) => Verdict::Ambiguous(AmbiguityReason::NoCorrectResult),
        (true, RawQuery { failed: true, .. }) => Verdict::Failed,
        (true, RawQuery { passed: true, .. }) => Verdict::Passed,
        (true, _) => Verdict::Ambiguous(AmbiguityReason::NeitherPassedNorFailed),
    }
}
