//! SPA autotest CLI
//!
//! Entry point for the `autotest` command-line tool.

use clap::{Parser, Subcommand};
use spa_autotest::reports::clean_reports;
use spa_autotest::{exit_code, parse_results, run_tests, HarnessConfig, RunState, RunSummary, Summary};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autotest")]
#[command(about = "Run autotester fixtures and summarize their results", version)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Path to harness config file (default: autotest.toml if present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the autotester over every fixture, then summarize
    Run {
        /// Exit successfully even when queries failed
        #[arg(long, short = 'q')]
        quiet: bool,

        /// Also write the machine-readable JSON summary
        #[arg(long)]
        json: bool,

        /// Summary file to write (overrides the config)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Path to the autotester executable
        executable: PathBuf,

        /// Fixture root directories
        #[arg(required = true)]
        folders: Vec<PathBuf>,
    },

    /// Summarize existing reports without running anything
    Parse {
        /// Exit successfully even when queries failed
        #[arg(long, short = 'q')]
        quiet: bool,

        /// Also write the machine-readable JSON summary
        #[arg(long)]
        json: bool,

        /// Also persist the summary to this file
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Report files or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Remove generated reports below a directory
    Clean {
        /// Directory to clean
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match HarnessConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run {
            quiet,
            json,
            summary,
            executable,
            folders,
        } => {
            let summary_path = summary.unwrap_or_else(|| config.output.summary_path.clone());
            match run_tests(&config, &executable, &folders) {
                Ok(state) => report(&config, &state, Some(&summary_path), json, quiet),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Parse {
            quiet,
            json,
            summary,
            inputs,
        } => match parse_results(&inputs) {
            Ok(state) => report(&config, &state, summary.as_deref(), json, quiet),
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Clean { root } => match clean_reports(&root, &config.output.report_prefix) {
            Ok(removed) => {
                println!("removed {} report(s)", removed.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn report(
    config: &HarnessConfig,
    state: &RunState,
    summary_path: Option<&Path>,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let summary = Summary::from_state(state, &config.output.report_prefix);
    if let Err(e) = summary.emit(summary_path) {
        eprintln!("Error writing summary: {}", e);
        return ExitCode::FAILURE;
    }

    if json {
        let headline = summary.lines().first().cloned().unwrap_or_default();
        let run_summary = RunSummary::from_state(state, headline);
        if let Err(e) = run_summary.write_to_file(&config.output.json_summary_path) {
            eprintln!("Error writing JSON summary: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::from(exit_code(state, quiet))
}
