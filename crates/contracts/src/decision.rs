//! Exit-code contracts as data.
//!
//! Every stage owns a [`Verdict`]; judging a finished tool run always yields
//! exactly one [`StageDecision`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ArtifactKind;

/// Conventional "satisfiable" / "true" status of decision procedures
pub const EXIT_SATISFIABLE: i32 = 10;

/// Conventional "unsatisfiable" / "false" status of decision procedures
pub const EXIT_UNSATISFIABLE: i32 = 20;

/// Literal the trace checker prints for a valid refutation
pub const TRACE_CHECK_SUCCESS: &str = "resolved 1 root and 1 empty clause";

/// What a finished stage means for the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageDecision {
    /// Proceed to the next stage
    Continue,
    /// The formula is true; stop successfully without a certificate
    ProvedTrue,
    /// Abort the run
    Fail(FailureCause),
}

/// Why a stage failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// A formula that must be unsatisfiable was found satisfiable
    UnexpectedSat,
    /// Any exit status outside the stage's contract
    ToolError,
    /// Captured output differs from the expected literal
    UnexpectedOutput,
    /// The stage exceeded its timeout and was killed
    TimedOut,
    /// The tool process could not be started
    LaunchFailed,
    /// A declared input artifact did not exist
    MissingInput(ArtifactKind),
}

impl StageDecision {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            StageDecision::Continue => "continue",
            StageDecision::ProvedTrue => "proved_true",
            StageDecision::Fail(cause) => cause.label(),
        }
    }
}

impl FailureCause {
    pub fn label(&self) -> &'static str {
        match self {
            FailureCause::UnexpectedSat => "unexpected_sat",
            FailureCause::ToolError => "tool_error",
            FailureCause::UnexpectedOutput => "unexpected_output",
            FailureCause::TimedOut => "timed_out",
            FailureCause::LaunchFailed => "launch_failed",
            FailureCause::MissingInput(_) => "missing_input",
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::UnexpectedSat => f.write_str("formula unexpectedly satisfiable"),
            FailureCause::ToolError => f.write_str("tool execution error"),
            FailureCause::UnexpectedOutput => f.write_str("unexpected tool output"),
            FailureCause::TimedOut => f.write_str("tool timed out"),
            FailureCause::LaunchFailed => f.write_str("tool could not be launched"),
            FailureCause::MissingInput(kind) => write!(f, "missing input artifact: {kind}"),
        }
    }
}

/// Integer -> decision mapping, total thanks to the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitCodeTable {
    rules: Vec<(i32, StageDecision)>,
    fallback: StageDecision,
}

impl ExitCodeTable {
    /// Table that maps every code to `fallback`
    pub fn new(fallback: StageDecision) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Add a rule; a later rule for the same code replaces the earlier one
    pub fn on(mut self, code: i32, decision: StageDecision) -> Self {
        self.rules.retain(|(c, _)| *c != code);
        self.rules.push((code, decision));
        self
    }

    /// 0 continues, anything else is a tool error
    pub fn zero_is_success() -> Self {
        Self::new(StageDecision::Fail(FailureCause::ToolError)).on(0, StageDecision::Continue)
    }

    /// 10 proves the formula true, 20 continues
    pub fn qbf_solver() -> Self {
        Self::new(StageDecision::Fail(FailureCause::ToolError))
            .on(EXIT_SATISFIABLE, StageDecision::ProvedTrue)
            .on(EXIT_UNSATISFIABLE, StageDecision::Continue)
    }

    /// 20 continues, 10 is an inconsistency
    pub fn expect_unsat() -> Self {
        Self::new(StageDecision::Fail(FailureCause::ToolError))
            .on(
                EXIT_SATISFIABLE,
                StageDecision::Fail(FailureCause::UnexpectedSat),
            )
            .on(EXIT_UNSATISFIABLE, StageDecision::Continue)
    }

    pub fn decide(&self, code: i32) -> StageDecision {
        self.rules
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, decision)| decision.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Codes with an explicit rule
    pub fn explicit_codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.rules.iter().map(|(c, _)| *c)
    }
}

/// Success predicate of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Decided by the exit status alone
    ExitCodes(ExitCodeTable),
    /// Zero exit status and trimmed stdout equal to the literal
    StdoutEquals(&'static str),
}

/// How a tool process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    /// Normal exit with a status code
    Code(i32),
    /// Killed by a signal, no status code
    Terminated,
    /// Killed after exceeding the stage timeout
    TimedOut,
}

impl fmt::Display for ToolExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolExit::Code(code) => write!(f, "exit code {code}"),
            ToolExit::Terminated => f.write_str("terminated by signal"),
            ToolExit::TimedOut => f.write_str("timed out"),
        }
    }
}
