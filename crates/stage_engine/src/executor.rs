//! Stage executor
//!
//! Runs the plan strictly in order, one tool process at a time. Each stage
//! is gated on its predecessor's `Continue`; the first other decision ends
//! the run with exactly one [`RunOutcome`].

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use contracts::{
    FailureCause, RunOutcome, StageDecision, StageFailure, StageId, StageSpec, StdoutMode,
    ToolExit, ToolManifest,
};
use toolchain::{StdoutTarget, ToolInvocation, ToolRun, ToolRunner, ToolchainError};
use tracing::{debug, error, info, instrument, warn};

use crate::cancel::CancelSignal;
use crate::compress;
use crate::plan::Plan;
use crate::verdict::judge;
use crate::workspace::RunPaths;

/// Per-run executor settings
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Delete predecessor artifacts once they are no longer needed
    pub trim: bool,
    pub stage_timeout: Option<Duration>,
    /// Gzip the certificate after a successful run
    pub compress_output: bool,
    /// Print the `<banner> ... DONE` status lines on stdout
    pub announce: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            trim: false,
            stage_timeout: None,
            compress_output: true,
            announce: true,
        }
    }
}

/// One executed (or skipped-on-input) stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: StageId,
    pub decision: StageDecision,
    pub exit: Option<ToolExit>,
    pub elapsed: Duration,
}

/// Everything a run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stages: Vec<StageRecord>,
    /// Final certificate location (compressed when enabled)
    pub certificate: Option<PathBuf>,
}

enum StageStep {
    Finished {
        decision: StageDecision,
        exit: Option<ToolExit>,
        detail: Option<String>,
    },
    Cancelled(String),
}

/// Interprets a [`Plan`] against a [`ToolRunner`]
pub struct StageExecutor<R> {
    runner: R,
    manifest: ToolManifest,
    plan: Plan,
    options: ExecutorOptions,
}

impl<R: ToolRunner> StageExecutor<R> {
    /// Executor for the certification plan
    pub fn new(runner: R, manifest: ToolManifest, options: ExecutorOptions) -> Self {
        Self {
            runner,
            manifest,
            plan: Plan::certification(),
            options,
        }
    }

    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = plan;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Fully rendered tool call for a stage
    pub fn invocation(&self, spec: &StageSpec, paths: &RunPaths) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(spec.tool, self.manifest.path(spec.tool));
        invocation.args = spec.args.iter().map(|arg| paths.render(arg)).collect();
        invocation.stdout = match spec.stdout {
            StdoutMode::Inherit => StdoutTarget::Inherit,
            StdoutMode::Discard => StdoutTarget::Discard,
            StdoutMode::Capture => StdoutTarget::Capture,
            StdoutMode::Redirect(kind) => StdoutTarget::File(paths.artifact(kind)),
        };
        invocation.timeout = self.options.stage_timeout;
        invocation.outputs = spec
            .outputs
            .iter()
            .filter(|kind| !matches!(spec.stdout, StdoutMode::Redirect(r) if r == **kind))
            .map(|kind| paths.artifact(*kind))
            .collect();
        invocation
    }

    /// Every stage's invocation, without running anything
    pub fn describe(&self, paths: &RunPaths) -> Vec<(StageId, ToolInvocation)> {
        self.plan
            .stages()
            .iter()
            .map(|spec| (spec.id, self.invocation(spec, paths)))
            .collect()
    }

    /// Run the plan to its single outcome
    #[instrument(
        name = "stage_executor_run",
        skip(self, paths, cancel),
        fields(formula = %paths.formula.display(), workspace = %paths.workspace.display())
    )]
    pub async fn run(&self, paths: &RunPaths, cancel: &CancelSignal) -> RunReport {
        let mut cancel = cancel.clone();
        let mut records = Vec::with_capacity(self.plan.len());
        let last = self.plan.stages().last().map(|spec| spec.id);

        for spec in self.plan.stages() {
            if let Some(signal) = cancel.reason() {
                info!(stage = %spec.id, signal = %signal, "cancelled before stage");
                return self.report(RunOutcome::Cancelled { signal }, records, None);
            }

            self.announce_start(spec.id);
            let started = Instant::now();
            let step = self.run_stage(spec, paths, &mut cancel).await;
            let elapsed = started.elapsed();

            let (decision, exit, detail) = match step {
                StageStep::Cancelled(signal) => {
                    self.announce("FAILED");
                    warn!(stage = %spec.id, signal = %signal, "stage interrupted");
                    return self.report(RunOutcome::Cancelled { signal }, records, None);
                }
                StageStep::Finished {
                    decision,
                    exit,
                    detail,
                } => (decision, exit, detail),
            };

            // A terminal signal can kill the tool before the listener flips
            // the cancel signal; the signal wins over the resulting failure.
            if matches!(decision, StageDecision::Fail(_)) {
                tokio::task::yield_now().await;
                if let Some(signal) = cancel.reason() {
                    self.announce("FAILED");
                    warn!(stage = %spec.id, signal = %signal, exit = ?exit, "tool died while cancelling");
                    return self.report(RunOutcome::Cancelled { signal }, records, None);
                }
            }

            observability::record_stage(spec.id, decision.label(), elapsed);
            records.push(StageRecord {
                stage: spec.id,
                decision: decision.clone(),
                exit,
                elapsed,
            });

            match decision {
                StageDecision::Continue => {
                    self.announce(if Some(spec.id) == last { "SUCCESS" } else { "DONE" });
                    debug!(stage = %spec.id, ?elapsed, "stage passed");
                    if self.options.trim {
                        self.trim(spec, paths);
                    }
                }
                StageDecision::ProvedTrue => {
                    self.announce("DONE");
                    self.announce("The given formula is TRUE.");
                    info!(stage = %spec.id, "formula proved true");
                    return self.report(RunOutcome::ProvedTrue, records, None);
                }
                StageDecision::Fail(cause) => {
                    let mut failure = StageFailure::new(spec.id, cause);
                    if let Some(exit) = exit {
                        failure = failure.with_exit(exit);
                    }
                    if let Some(detail) = detail {
                        failure = failure.with_detail(detail);
                    }
                    self.announce("FAILED");
                    self.announce(&failure.to_string());
                    if let Some(detail) = &failure.detail {
                        self.announce(detail);
                    }
                    error!(
                        stage = %spec.id,
                        cause = %failure.cause,
                        exit = ?failure.exit,
                        status = failure.exit_code(),
                        "stage failed"
                    );
                    return self.report(RunOutcome::StageFailed(failure), records, None);
                }
            }
        }

        let certificate = self.finish_certificate(paths);
        self.report(RunOutcome::Certified, records, certificate)
    }

    #[instrument(name = "stage", skip(self, spec, paths, cancel), fields(stage = %spec.id, tool = %spec.tool))]
    async fn run_stage(
        &self,
        spec: &StageSpec,
        paths: &RunPaths,
        cancel: &mut CancelSignal,
    ) -> StageStep {
        if let Some(&missing) = spec
            .inputs
            .iter()
            .find(|kind| !paths.artifact(**kind).is_file())
        {
            return StageStep::Finished {
                decision: StageDecision::Fail(FailureCause::MissingInput(missing)),
                exit: None,
                detail: Some(paths.artifact(missing).display().to_string()),
            };
        }

        let invocation = self.invocation(spec, paths);
        debug!(command = %invocation.command_line(), "invoking tool");

        // Dropping the runner future on cancellation kills the tool.
        let result = tokio::select! {
            biased;
            signal = cancel.cancelled() => return StageStep::Cancelled(signal),
            result = self.runner.run(&invocation) => result,
        };

        match result {
            Ok(run) => Self::finished(spec, run),
            Err(err) => {
                let cause = match err {
                    ToolchainError::Launch { .. } | ToolchainError::Redirect { .. } => {
                        FailureCause::LaunchFailed
                    }
                    ToolchainError::Wait { .. } => FailureCause::ToolError,
                };
                StageStep::Finished {
                    decision: StageDecision::Fail(cause),
                    exit: None,
                    detail: Some(err.to_string()),
                }
            }
        }
    }

    fn finished(spec: &StageSpec, run: ToolRun) -> StageStep {
        let decision = judge(&spec.verdict, &run);
        let detail = match (&decision, spec.stdout) {
            (StageDecision::Fail(_), StdoutMode::Capture) if !run.stdout.is_empty() => {
                Some(String::from_utf8_lossy(&run.stdout).trim().to_string())
            }
            _ => None,
        };
        StageStep::Finished {
            decision,
            exit: Some(run.exit),
            detail,
        }
    }

    fn trim(&self, spec: &StageSpec, paths: &RunPaths) {
        for &kind in &spec.trim_after {
            match paths.remove_artifact(kind) {
                Ok(true) => debug!(artifact = %kind, "trimmed"),
                Ok(false) => {}
                Err(e) => warn!(artifact = %kind, error = %e, "failed to trim artifact"),
            }
        }
    }

    /// Compress the certificate; failure to do so is only a warning
    fn finish_certificate(&self, paths: &RunPaths) -> Option<PathBuf> {
        if !self.options.compress_output {
            return Some(paths.output.clone());
        }
        match compress::gzip_in_place(&paths.output) {
            Ok(gz) => {
                info!(certificate = %gz.display(), "certificate compressed");
                Some(gz)
            }
            Err(e) => {
                warn!(output = %paths.output.display(), error = %e, "failed to compress certificate");
                Some(paths.output.clone())
            }
        }
    }

    fn report(
        &self,
        outcome: RunOutcome,
        stages: Vec<StageRecord>,
        certificate: Option<PathBuf>,
    ) -> RunReport {
        RunReport {
            outcome,
            stages,
            certificate,
        }
    }

    fn announce_start(&self, stage: StageId) {
        if self.options.announce {
            let mut stdout = std::io::stdout().lock();
            let _ = write!(stdout, "{} ... ", stage.banner());
            let _ = stdout.flush();
        }
    }

    fn announce(&self, text: &str) {
        if self.options.announce {
            println!("{text}");
        }
    }
}
