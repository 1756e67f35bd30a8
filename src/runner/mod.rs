//! Autotester orchestration
//!
//! Discovers leaf test directories, pairs their files, and runs the
//! autotester once per pair, strictly one invocation at a time. Each
//! invocation writes `<dir>/<prefix><query stem>.xml`, or
//! `<dir>/<prefix><query file name>.xml` when another query in the same
//! directory already claimed that stem.

mod executable;
mod layout;

pub use executable::Executable;
pub use layout::{has_subdirectory, leaf_directories};

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::pairing::{self, PairingRules, TestPair};

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("'{path}' is not a valid autotester executable: {reason}")]
    InvalidExecutable { path: PathBuf, reason: String },

    #[error("'{path}' has subdirectories, but fixtures must sit {depth} level(s) below their root")]
    NestedFixture { path: PathBuf, depth: usize },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One completed autotester invocation.
#[derive(Debug)]
pub struct Invocation {
    pub pair: TestPair,
    /// Where the report was expected to be written.
    pub report: PathBuf,
    /// `None` when the process could not be started.
    pub status: Option<ExitStatus>,
}

impl Invocation {
    pub fn succeeded(&self) -> bool {
        self.status.map(|s| s.success()).unwrap_or(false)
    }
}

/// Runs every fixture under a set of roots.
#[derive(Debug)]
pub struct Runner {
    executable: Executable,
    rules: PairingRules,
    fixture_depth: usize,
    report_prefix: String,
}

impl Runner {
    pub fn new(executable: Executable, config: &HarnessConfig) -> Self {
        Self {
            executable,
            rules: config.pairing.clone(),
            fixture_depth: config.layout.fixture_depth,
            report_prefix: config.output.report_prefix.clone(),
        }
    }

    /// Report path for a query file: its stem, prefixed, as XML, beside the query.
    pub fn report_path(&self, query: &Path) -> PathBuf {
        let stem = query
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.prefixed(query, &stem)
    }

    /// Report path built from the whole query file name, used when the stem is taken.
    fn full_name_report_path(&self, query: &Path) -> PathBuf {
        self.prefixed(query, &file_name(query))
    }

    fn prefixed(&self, query: &Path, base: &str) -> PathBuf {
        let name = format!("{}{}.xml", self.report_prefix, base);
        match query.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Pick a report path no earlier query in the directory has claimed.
    fn assign_report(
        &self,
        query: &Path,
        assigned: &HashMap<PathBuf, PathBuf>,
    ) -> Option<PathBuf> {
        let primary = self.report_path(query);
        let owner = match assigned.get(&primary) {
            None => return Some(primary),
            Some(owner) => owner,
        };

        let fallback = self.full_name_report_path(query);
        if assigned.contains_key(&fallback) {
            warn!(
                "'{}' and '{}' both map to report '{}', skipping '{}'",
                owner.display(),
                query.display(),
                primary.display(),
                file_name(query)
            );
            return None;
        }
        warn!(
            "'{}' and '{}' both map to report '{}', writing '{}' instead",
            owner.display(),
            query.display(),
            primary.display(),
            fallback.display()
        );
        Some(fallback)
    }

    /// Run all fixtures. Layout errors surface before anything is executed.
    pub fn run(&self, roots: &[PathBuf]) -> Result<Vec<Invocation>, RunnerError> {
        let leaves = leaf_directories(roots, self.fixture_depth)?;

        let mut invocations = Vec::new();
        for dir in &leaves {
            invocations.extend(self.run_directory(dir));
        }
        Ok(invocations)
    }

    /// Run one leaf directory. An unreadable directory is skipped.
    fn run_directory(&self, dir: &Path) -> Vec<Invocation> {
        let resolution = match pairing::resolve(dir, &self.rules) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "could not read test set '{}', skipping", dir.display());
                return Vec::new();
            }
        };
        if !resolution.is_test_directory() {
            return Vec::new();
        }

        info!("test set {}:", dir.display());
        let mut assigned = HashMap::new();
        let mut invocations = Vec::new();
        for pair in resolution.pairs {
            let Some(report) = self.assign_report(&pair.query, &assigned) else {
                continue;
            };
            assigned.insert(report.clone(), pair.query.clone());
            invocations.push(self.execute(pair, report));
        }
        invocations
    }

    fn execute(&self, pair: TestPair, report: PathBuf) -> Invocation {
        // A report left over from an earlier run must not stand in for this one.
        match fs::remove_file(&report) {
            Ok(()) => debug!("removed stale report '{}'", report.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "could not remove stale report '{}'", report.display()),
        }

        info!(
            "    running '{} - {}'",
            file_name(&pair.query),
            file_name(&pair.source)
        );

        let status = match self.executable.invoke(&pair, &report) {
            Ok(status) => {
                if !status.success() {
                    warn!(
                        query = %pair.query.display(),
                        %status,
                        "autotester exited unsuccessfully"
                    );
                }
                Some(status)
            }
            Err(e) => {
                warn!(
                    query = %pair.query.display(),
                    error = %e,
                    "failed to launch autotester"
                );
                None
            }
        };

        Invocation {
            pair,
            report,
            status,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
