//! Harness configuration (autotest.toml)
//!
//! Every section is optional; missing keys fall back to the built-in
//! fixture conventions. Precedence: built-in defaults → config file → CLI flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::pairing::PairingRules;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "autotest.toml";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Where fixtures sit below each root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Depth of leaf test directories below a root that has subdirectories.
    pub fixture_depth: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { fixture_depth: 1 }
    }
}

/// Names of generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix of every report file written next to its query file.
    pub report_prefix: String,

    /// Plain-text run summary, overwritten on each run.
    pub summary_path: PathBuf,

    /// Machine-readable run summary, written with `--json`.
    pub json_summary_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_prefix: "output-".to_string(),
            summary_path: PathBuf::from("autotester_summary.txt"),
            json_summary_path: PathBuf::from("autotester_summary.json"),
        }
    }
}

/// Full harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub pairing: PairingRules,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

impl HarnessConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&contents)
    }

    /// Parse config from a TOML string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: HarnessConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, or `autotest.toml` if it exists, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pairing = &self.pairing;

        if pairing.source_suffixes.iter().all(|s| s.is_empty()) {
            return Err(ConfigError::ValidationError(
                "At least one non-empty suffix must be defined in 'pairing.source_suffixes'"
                    .to_string(),
            ));
        }

        if pairing.query_suffixes.is_empty() && pairing.text_suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "Either 'pairing.query_suffixes' or 'pairing.text_suffix' must be set".to_string(),
            ));
        }

        for sub in &pairing.substitutions {
            if sub.query.is_empty() || sub.source.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid substitution '{}' -> '{}': both suffixes must be non-empty",
                    sub.query, sub.source
                )));
            }
        }

        if self.layout.fixture_depth == 0 {
            return Err(ConfigError::ValidationError(
                "'layout.fixture_depth' must be at least 1".to_string(),
            ));
        }

        if self.output.report_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "'output.report_prefix' must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = HarnessConfig::from_str("").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.layout.fixture_depth, 1);
        assert_eq!(config.output.report_prefix, "output-");
        assert!(config.pairing.source_suffixes.contains(&".simple".to_string()));
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
[pairing]
excluded_marker = "aux"

[output]
summary_path = "out/summary.txt"
"#;
        let config = HarnessConfig::from_str(toml).unwrap();
        assert_eq!(config.pairing.excluded_marker, "aux");
        // Untouched keys keep their defaults.
        assert_eq!(config.pairing.text_suffix, ".txt");
        assert_eq!(config.output.summary_path, PathBuf::from("out/summary.txt"));
        assert_eq!(config.output.report_prefix, "output-");
    }

    #[test]
    fn test_substitutions_from_toml() {
        let toml = r#"
[pairing]
substitutions = [{ query = ".pql", source = ".src" }]
"#;
        let config = HarnessConfig::from_str(toml).unwrap();
        assert_eq!(config.pairing.substitutions.len(), 1);
        assert_eq!(config.pairing.derived_source("a.pql").as_deref(), Some("a.src"));
    }

    #[test]
    fn test_validation_errors() {
        let zero_depth = "[layout]\nfixture_depth = 0\n";
        assert!(matches!(
            HarnessConfig::from_str(zero_depth),
            Err(ConfigError::ValidationError(_))
        ));

        let no_sources = "[pairing]\nsource_suffixes = []\n";
        assert!(HarnessConfig::from_str(no_sources).is_err());

        let empty_prefix = "[output]\nreport_prefix = \"\"\n";
        assert!(HarnessConfig::from_str(empty_prefix).is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            HarnessConfig::from_str("[layout\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = HarnessConfig::load(Some(Path::new("/nonexistent/autotest.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
