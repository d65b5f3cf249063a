//! Pipeline orchestrator - preflight, workspace, stage execution, teardown.
//!
//! Generic over the tool runner so the whole run can be driven by the mock
//! runner in tests.

use std::time::{Duration, Instant};

use stage_engine::{CancelSignal, Plan, RunPaths, RunReport, StageExecutor, Teardown, Workspace};
use toolchain::{check_dependencies, DependencyReport, ToolRunner};
use tracing::{info, instrument, warn};

use crate::args::{RunRequest, Settings};
use crate::error::Result;

/// Result of a certification run that reached the executor
#[derive(Debug)]
pub struct CertifyRun {
    pub report: RunReport,
    pub teardown: Teardown,
    pub duration: Duration,
}

/// Main pipeline orchestrator
pub struct Orchestrator<R> {
    settings: Settings,
    executor: StageExecutor<R>,
}

impl<R: ToolRunner> Orchestrator<R> {
    /// Create an orchestrator running the certification plan
    pub fn new(runner: R, settings: Settings) -> Result<Self> {
        let plan = Plan::certification();
        plan.validate()?;
        let executor = StageExecutor::new(runner, settings.manifest.clone(), settings.executor.clone())
            .with_plan(plan);
        Ok(Self { settings, executor })
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    fn announce(&self, line: &str) {
        if self.settings.executor.announce {
            println!("{line}");
        }
    }

    /// Check every tool; fails with the full list of missing paths
    pub fn preflight(&self) -> Result<DependencyReport> {
        self.announce(&format!("Tool root is at {}", self.settings.tool_root.display()));
        self.announce(&format!(
            "Workspace root is at {}",
            self.settings.workspace_root.display()
        ));

        let report = check_dependencies(&self.settings.manifest);
        for line in report.lines() {
            self.announce(&line);
        }
        observability::record_preflight(report.checks.len(), report.missing().len());
        Ok(report.into_result()?)
    }

    /// Preflight, then print the rendered plan without running anything
    pub fn dry_run(&self, request: &RunRequest) -> Result<()> {
        self.preflight()?;

        let workspace = Workspace::path_for(&self.settings.workspace_root, std::process::id());
        let paths = RunPaths::new(&request.input, &request.output, &workspace);
        println!("\nPlan for {} (workspace {}):", request.base_name, workspace.display());
        for (spec, (_, invocation)) in self
            .executor
            .plan()
            .stages()
            .iter()
            .zip(self.executor.describe(&paths))
        {
            println!("  [{}] {} - {}", spec.id.ordinal(), spec.id, spec.id.banner());
            println!("      $ {}", invocation.command_line());
            println!("      stdout: {:?}", invocation.stdout);
            if !spec.inputs.is_empty() {
                println!("      inputs: {}", join_labels(&spec.inputs));
            }
            if !spec.outputs.is_empty() {
                println!("      outputs: {}", join_labels(&spec.outputs));
            }
            if self.settings.executor.trim && !spec.trim_after.is_empty() {
                println!("      trims: {}", join_labels(&spec.trim_after));
            }
        }
        Ok(())
    }

    /// Run the whole pipeline.
    ///
    /// Once the workspace exists, teardown runs whatever the outcome.
    #[instrument(name = "certify", skip(self, request, cancel), fields(formula = %request.base_name))]
    pub async fn certify(&self, request: &RunRequest, cancel: &CancelSignal) -> Result<CertifyRun> {
        let started = Instant::now();
        self.preflight()?;

        let workspace = Workspace::create(&self.settings.workspace_root, self.settings.cleanup)?;
        self.announce(&format!("Workspace is at {}", workspace.dir().display()));
        let paths = RunPaths::new(&request.input, &request.output, workspace.dir());

        info!(
            input = %request.input.display(),
            output = %request.output.display(),
            trim = self.settings.executor.trim,
            "Starting certification"
        );
        let report = self.executor.run(&paths, cancel).await;

        let teardown = workspace.finish(&report.outcome);
        if teardown == Teardown::RemovalFailed {
            warn!("workspace could not be removed");
        }

        let duration = started.elapsed();
        observability::record_run_outcome(&report.outcome, duration);
        info!(
            outcome = report.outcome.label(),
            status = report.outcome.exit_code(),
            ?duration,
            "Certification finished"
        );

        Ok(CertifyRun {
            report,
            teardown,
            duration,
        })
    }
}

fn join_labels(kinds: &[contracts::ArtifactKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
