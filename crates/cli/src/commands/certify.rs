//! Certification command: resolve, preflight, run, report.

use std::future::Future;

use contracts::EXIT_CANCELLED;
use stage_engine::{cancel_pair, CancelHandle};
use tokio::task::JoinHandle;
use toolchain::ProcessRunner;
use tracing::{info, warn};

use crate::args::{RunRequest, Settings};
use crate::cli::Cli;
use crate::error::Result;
use crate::pipeline::{Orchestrator, RunSummary};

/// Execute the certification and return the process exit status
pub async fn run_certify(cli: &Cli) -> Result<i32> {
    let request = RunRequest::resolve(&cli.input, &cli.output)?;
    let settings = Settings::resolve(cli)?;
    info!(
        formula = %request.base_name,
        tool_root = %settings.tool_root.display(),
        workspace_root = %settings.workspace_root.display(),
        cleanup = ?settings.cleanup,
        "Configuration resolved"
    );

    let orchestrator = Orchestrator::new(ProcessRunner::new(), settings)?;

    if cli.dry_run {
        orchestrator.dry_run(&request)?;
        info!("Dry run - no tool was executed");
        return Ok(0);
    }

    let (handle, signal) = cancel_pair();
    let listener = spawn_signal_listener(handle);

    // Handlers stay installed until the status is decided.
    let status = orchestrator.certify(&request, &signal).await.map(|run| {
        info!(teardown = ?run.teardown, "Workspace teardown complete");
        if !cli.quiet {
            RunSummary::new(&run.report, run.duration).print_summary();
        }
        final_status(run.report.outcome.exit_code(), signal.reason().as_deref())
    });
    listener.abort();
    status
}

/// A received termination signal overrides whatever the run concluded
fn final_status(outcome_status: i32, signal: Option<&str>) -> i32 {
    match signal {
        Some(name) => {
            if outcome_status != EXIT_CANCELLED {
                warn!(signal = name, outcome_status, "Signal arrived after the last stage");
            }
            EXIT_CANCELLED
        }
        None => outcome_status,
    }
}

/// Forward SIGINT / SIGTERM into the run's cancel signal.
///
/// Handlers are registered before this returns.
fn spawn_signal_listener(handle: CancelHandle) -> JoinHandle<()> {
    let received = termination_signal();
    tokio::spawn(async move {
        let name = received.await;
        println!("{name} signal handler called. Clean exit.");
        warn!(signal = name, "Received termination signal, cancelling run");
        handle.cancel(name);
    })
}

/// Resolves with the name of the first termination signal.
///
/// A source that cannot be installed is logged and never fires.
#[cfg(unix)]
fn termination_signal() -> impl Future<Output = &'static str> + Send {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = installed(signal(SignalKind::interrupt()), "SIGINT");
    let terminate = installed(signal(SignalKind::terminate()), "SIGTERM");
    async move {
        tokio::select! {
            name = next_signal(interrupt, "SIGINT") => name,
            name = next_signal(terminate, "SIGTERM") => name,
        }
    }
}

#[cfg(unix)]
fn installed(
    stream: std::io::Result<tokio::signal::unix::Signal>,
    name: &'static str,
) -> Option<tokio::signal::unix::Signal> {
    stream
        .inspect_err(|e| warn!(signal = name, error = %e, "Failed to install signal handler"))
        .ok()
}

#[cfg(unix)]
async fn next_signal(
    stream: Option<tokio::signal::unix::Signal>,
    name: &'static str,
) -> &'static str {
    if let Some(mut stream) = stream {
        if stream.recv().await.is_some() {
            return name;
        }
    }
    std::future::pending().await
}

#[cfg(not(unix))]
fn termination_signal() -> impl Future<Output = &'static str> + Send {
    async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending().await
            }
        }
    }
}
