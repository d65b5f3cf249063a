//! # QBF Certify CLI
//!
//! Command-line entry point.
//!
//! - Argument and configuration resolution
//! - Dependency preflight and pipeline orchestration
//! - Signal-driven cancellation with a single teardown path
//!
//! Exit status: 0 certified, 1 proved true, 2-11 failing stage, 255 signal
//! abort, 64-78 precondition errors.

mod args;
mod cli;
mod commands;
mod error;
mod pipeline;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use cli::Cli;
use commands::run_certify;
use contracts::EXIT_USAGE;
use error::EXIT_SOFTWARE;
use observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                exit_status(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_observability(&cli) {
        eprintln!("error: {e:#}");
        return exit_status(EXIT_SOFTWARE);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "QBF Certify starting");

    match run_certify(&cli).await {
        Ok(status) => exit_status(status),
        Err(e) => {
            error!(error = %e, "Certification aborted");
            eprintln!("error: {e}");
            exit_status(e.exit_code())
        }
    }
}

/// Initialize logging (stderr) and the optional metrics endpoint
fn init_observability(cli: &Cli) -> anyhow::Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: observability::log_level(cli.verbose, cli.quiet).to_string(),
    })
}

/// Truncate to a process status; -1 becomes 255
fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}
