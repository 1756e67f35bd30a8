//! Leaf test directory discovery.
//!
//! A root without subdirectories is itself a fixture. Otherwise fixtures
//! are the directories exactly `fixture_depth` levels below it, and a
//! fixture that has subdirectories of its own is rejected.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::RunnerError;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RunnerError + '_ {
    move |source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Whether `dir` directly contains a directory. Symlinks are not followed.
pub fn has_subdirectory(dir: &Path) -> Result<bool, RunnerError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        if entry.file_type().map_err(io_error(dir))?.is_dir() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn leaves_under(root: &Path, fixture_depth: usize) -> Result<Vec<PathBuf>, RunnerError> {
    if !has_subdirectory(root)? {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut leaves = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(fixture_depth)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();

        if entry.depth() < fixture_depth {
            if !has_subdirectory(path)? {
                debug!("'{}' sits above the fixture depth, skipping", path.display());
            }
            continue;
        }

        if has_subdirectory(path)? {
            return Err(RunnerError::NestedFixture {
                path: path.to_path_buf(),
                depth: fixture_depth,
            });
        }
        leaves.push(path.to_path_buf());
    }
    Ok(leaves)
}

/// Leaf test directories of every root, in root order then name order.
///
/// Roots that are not directories are skipped. A directory reachable from
/// several roots is returned once.
pub fn leaf_directories(
    roots: &[PathBuf],
    fixture_depth: usize,
) -> Result<Vec<PathBuf>, RunnerError> {
    let mut seen = HashSet::new();
    let mut leaves = Vec::new();

    for root in roots {
        if !root.is_dir() {
            warn!("'{}' is not a folder, skipping...", root.display());
            continue;
        }
        for leaf in leaves_under(root, fixture_depth)? {
            let key = fs::canonicalize(&leaf).map_err(io_error(&leaf))?;
            if seen.insert(key) {
                leaves.push(leaf);
            } else {
                debug!("'{}' already visited", leaf.display());
            }
        }
    }

    Ok(leaves)
}
