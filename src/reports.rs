//! Locating report files on disk.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

fn is_xml(path: &Path) -> bool {
    path.extension().map(|e| e == "xml").unwrap_or(false)
}

/// Every report named by `inputs`, in input order.
///
/// Directories are walked recursively for `.xml` files, sorted by name;
/// any other input is taken as a report path as given. Each path appears once.
pub fn discover_reports(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut seen = HashSet::new();
    let mut reports = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && is_xml(entry.path()) {
                    let path = entry.into_path();
                    if seen.insert(path.clone()) {
                        reports.push(path);
                    }
                }
            }
        } else if seen.insert(input.clone()) {
            reports.push(input.clone());
        }
    }

    Ok(reports)
}

/// Reports previously generated under `root`, identified by `prefix`.
pub fn generated_reports(root: &Path, prefix: &str) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut reports = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let generated = entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with(prefix))
            .unwrap_or(false);
        if entry.file_type().is_file() && generated && is_xml(entry.path()) {
            reports.push(entry.into_path());
        }
    }
    Ok(reports)
}

/// Errors from removing generated reports
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to remove '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Delete every generated report under `root`, returning what was removed.
pub fn clean_reports(root: &Path, prefix: &str) -> Result<Vec<PathBuf>, CleanError> {
    let reports = generated_reports(root, prefix)?;
    for path in &reports {
        info!("removing '{}'", path.display());
        fs::remove_file(path).map_err(|source| CleanError::Remove {
            path: path.clone(),
            source,
        })?;
    }
    Ok(reports)
}
