//! Run outcomes and their process exit statuses.

use std::fmt;

use crate::{FailureCause, StageId, ToolExit};

/// Exit status of a validated certificate
pub const EXIT_CERTIFIED: i32 = 0;

/// Exit status when the formula was proven true (no certificate)
pub const EXIT_PROVED_TRUE: i32 = 1;

/// Exit status of a signal-triggered abort (255 as a process status)
pub const EXIT_CANCELLED: i32 = -1;

/// Details of the stage that aborted the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: StageId,
    pub cause: FailureCause,
    /// How the tool ended, if it ran at all
    pub exit: Option<ToolExit>,
    /// Captured output or launch diagnostics, surfaced verbatim
    pub detail: Option<String>,
}

impl StageFailure {
    pub fn new(stage: StageId, cause: FailureCause) -> Self {
        Self {
            stage,
            cause,
            exit: None,
            detail: None,
        }
    }

    pub fn with_exit(mut self, exit: ToolExit) -> Self {
        self.exit = Some(exit);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Stage-specific process exit status
    pub fn exit_code(&self) -> i32 {
        stage_failure_exit_code(self.stage, &self.cause)
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({}) failed: {}", self.stage.ordinal(), self.stage, self.cause)?;
        if let Some(exit) = &self.exit {
            write!(f, " [{exit}]")?;
        }
        Ok(())
    }
}

/// Exit status for a failing stage.
///
/// Every stage owns a contiguous range and the ranges increase through the
/// pipeline; the two solver checks distinguish "satisfiable" from other errors.
pub fn stage_failure_exit_code(stage: StageId, cause: &FailureCause) -> i32 {
    let sat = matches!(cause, FailureCause::UnexpectedSat);
    match stage {
        StageId::Solve => 2,
        StageId::ExpandCheck if sat => 3,
        StageId::ExpandCheck => 4,
        StageId::ProofCheck => 5,
        StageId::TraceMerge => 6,
        StageId::TraceValidate => 7,
        StageId::StrategyExtract => 8,
        StageId::Recombine => 9,
        StageId::Certify if sat => 10,
        StageId::Certify => 11,
    }
}

/// Exactly one per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage passed; the strategy is certified
    Certified,
    /// The QBF solver proved the formula true
    ProvedTrue,
    StageFailed(StageFailure),
    /// Aborted by a termination signal
    Cancelled { signal: String },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Certified => EXIT_CERTIFIED,
            RunOutcome::ProvedTrue => EXIT_PROVED_TRUE,
            RunOutcome::StageFailed(failure) => failure.exit_code(),
            RunOutcome::Cancelled { .. } => EXIT_CANCELLED,
        }
    }

    /// Certified or proved true
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Certified | RunOutcome::ProvedTrue)
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Certified => "certified",
            RunOutcome::ProvedTrue => "proved_true",
            RunOutcome::StageFailed(_) => "stage_failed",
            RunOutcome::Cancelled { .. } => "cancelled",
        }
    }
}
