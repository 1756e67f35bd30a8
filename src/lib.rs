//! SPA autotest harness
//!
//! Drives an external autotester binary across a tree of test fixtures,
//! one (source, query file) pair at a time, and rolls the XML reports it
//! writes into a pass/fail summary.

pub mod config;
pub mod pairing;
pub mod pipeline;
pub mod reports;
pub mod runner;
pub mod state;
pub mod summary;

pub use autotest_results::{Query, Report, ReportError, Verdict};
pub use config::{ConfigError, HarnessConfig};
pub use pairing::{PairingRules, Resolution, TestPair};
pub use pipeline::{parse_results, run_tests, PipelineError};
pub use runner::{Executable, Runner, RunnerError};
pub use state::RunState;
pub use summary::{exit_code, RunSummary, Summary};
