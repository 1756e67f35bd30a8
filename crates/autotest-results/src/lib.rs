//! Parser and verdict classifier for autotester XML reports.
//!
//! A report is read in two passes: the streaming [`parser`] pulls the raw
//! shape of every `query` element out of the document, then [`verdict`]
//! decides each query's outcome from the markers it carries. Neither layer
//! logs; callers decide how to surface warnings.

mod parser;
mod report;
mod verdict;

pub use parser::{parse_document, RawQuery};
pub use report::{duplicate_answers, parse_report, Query, Report};
pub use verdict::{classify, AmbiguityReason, Verdict};

use std::io;
use thiserror::Error;

/// Errors produced while reading a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed report: {0}")]
    Malformed(String),

    #[error("invalid time_taken {text:?} for query {id}")]
    InvalidTimeTaken { id: String, text: String },
}

impl ReportError {
    /// Whether the run can skip the offending report and carry on.
    ///
    /// Everything except a bad `time_taken` value is scoped to one file.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ReportError::InvalidTimeTaken { .. })
    }
}

impl From<quick_xml::events::attributes::AttrError> for ReportError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ReportError::Xml(quick_xml::Error::from(e))
    }
}
