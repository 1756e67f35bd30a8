//! Machine-readable run summary (autotester_summary.json)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::state::{QueryRef, RunState, TimingStats};

/// Schema version for the JSON run summary
pub const RUN_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for the JSON run summary
pub const RUN_SUMMARY_SCHEMA_ID: &str = "spa-autotest/run_summary@1";

/// Failed queries listed under one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailures {
    pub report: PathBuf,
    pub failed: Vec<FailedQuery>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedQuery {
    pub id: String,
    pub name: String,
}

impl From<&QueryRef> for FailedQuery {
    fn from(q: &QueryRef) -> Self {
        Self {
            id: q.id.clone(),
            name: q.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub samples: usize,
    pub total_seconds: f64,
    pub mean_seconds: f64,
    pub max_seconds: f64,
}

impl From<TimingStats> for Timing {
    fn from(stats: TimingStats) -> Self {
        Self {
            samples: stats.count,
            total_seconds: stats.total,
            mean_seconds: stats.mean,
            max_seconds: stats.max,
        }
    }
}

/// Run summary (autotester_summary.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When the summary was created
    pub created_at: DateTime<Utc>,

    pub passed: usize,
    pub failed: usize,
    pub total: usize,

    /// Reports that could not be read and contributed nothing
    #[serde(default)]
    pub skipped_reports: Vec<PathBuf>,

    /// Present only when at least one query recorded its duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,

    /// Files with listed failures, in discovery order
    #[serde(default)]
    pub failures: Vec<FileFailures>,

    /// Same text as the plain summary's first line
    pub human_summary: String,
}

impl RunSummary {
    pub fn from_state(state: &RunState, human_summary: String) -> Self {
        Self {
            schema_version: RUN_SUMMARY_SCHEMA_VERSION,
            schema_id: RUN_SUMMARY_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            passed: state.num_passed(),
            failed: state.num_failed(),
            total: state.total(),
            skipped_reports: state.skipped_reports().to_vec(),
            timing: state.timing_stats().map(Timing::from),
            failures: state
                .files_with_failures()
                .map(|f| FileFailures {
                    report: f.path.clone(),
                    failed: f.failed.iter().map(FailedQuery::from).collect(),
                })
                .collect(),
            human_summary,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }
}
