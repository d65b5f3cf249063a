//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use contracts::CleanupPolicy;
use std::path::PathBuf;

/// QBF Certify - solve a QBF and certify the winning strategy
#[derive(Parser, Debug)]
#[command(
    name = "qbf-certify",
    author,
    version,
    about = "QBF solving and strategy certification pipeline",
    long_about = "Runs the QBF solver on a formula. A true formula ends the run \
                  (exit status 1). Otherwise the refutation is checked, turned into a \n\
                  winning strategy, and that strategy is independently certified and \n\
                  written (gzipped) to OUTPUT (exit status 0)."
)]
pub struct Cli {
    /// Input formula (QDIMACS)
    pub input: PathBuf,

    /// Output path of the strategy certificate
    pub output: PathBuf,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "QBF_CERTIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the tool manifest is resolved against
    #[arg(long, env = "QBF_CERTIFY_TOOL_ROOT")]
    pub tool_root: Option<PathBuf>,

    /// Parent directory of the per-process workspace
    #[arg(long, env = "QBF_CERTIFY_WORKSPACE_ROOT")]
    pub workspace_root: Option<PathBuf>,

    /// Delete intermediate artifacts as soon as no later stage needs them
    #[arg(long, env = "QBF_CERTIFY_TRIM")]
    pub trim: bool,

    /// When to remove the workspace at the end of the run
    #[arg(long, value_enum, env = "QBF_CERTIFY_CLEANUP")]
    pub cleanup: Option<CleanupArg>,

    /// Kill a stage after this many seconds (0 = no timeout)
    #[arg(long, env = "QBF_CERTIFY_STAGE_TIMEOUT")]
    pub stage_timeout: Option<u64>,

    /// Keep the certificate uncompressed
    #[arg(long, env = "QBF_CERTIFY_NO_COMPRESS")]
    pub no_compress: bool,

    /// Resolve paths, check dependencies and print the plan without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "QBF_CERTIFY_VERBOSE")]
    pub verbose: u8,

    /// Only log warnings and errors, and skip the run summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        env = "QBF_CERTIFY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "QBF_CERTIFY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Workspace cleanup policy
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CleanupArg {
    /// Always keep the workspace
    Never,
    /// Remove it when the formula was certified or proved true
    OnSuccess,
    /// Remove it whatever the outcome
    Always,
}

impl From<CleanupArg> for CleanupPolicy {
    fn from(arg: CleanupArg) -> Self {
        match arg {
            CleanupArg::Never => CleanupPolicy::Never,
            CleanupArg::OnSuccess => CleanupPolicy::OnSuccess,
            CleanupArg::Always => CleanupPolicy::Always,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
