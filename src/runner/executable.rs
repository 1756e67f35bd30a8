//! The external autotester binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use super::RunnerError;
use crate::pairing::TestPair;

/// A validated autotester executable.
#[derive(Debug, Clone)]
pub struct Executable {
    path: PathBuf,
}

impl Executable {
    /// Check that `path` names an executable regular file.
    ///
    /// The stored path is canonical so a bare file name is never looked up on `PATH`.
    pub fn validate(path: &Path) -> Result<Self, RunnerError> {
        let invalid = |reason: String| RunnerError::InvalidExecutable {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
        if !metadata.is_file() {
            return Err(invalid("not a regular file".to_string()));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(invalid("file is not executable".to_string()));
            }
        }

        let path = fs::canonicalize(path).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `<exe> <source> <query> <report>` to completion.
    ///
    /// Standard output is discarded; standard error goes to the operator.
    pub fn invoke(&self, pair: &TestPair, report: &Path) -> io::Result<ExitStatus> {
        Command::new(&self.path)
            .arg(&pair.source)
            .arg(&pair.query)
            .arg(report)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
    }
}
