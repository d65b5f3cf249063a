//! Stage descriptions.
//!
//! A stage is pure data: which tool to call, how to render its arguments, what
//! it reads and writes, how to judge it and what it may trim afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ArtifactKind, ToolId, Verdict};

/// The eight pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Solve,
    ExpandCheck,
    ProofCheck,
    TraceMerge,
    TraceValidate,
    StrategyExtract,
    Recombine,
    Certify,
}

impl StageId {
    pub const ALL: [StageId; 8] = [
        StageId::Solve,
        StageId::ExpandCheck,
        StageId::ProofCheck,
        StageId::TraceMerge,
        StageId::TraceValidate,
        StageId::StrategyExtract,
        StageId::Recombine,
        StageId::Certify,
    ];

    /// 1-based position in the pipeline
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            StageId::Solve => "solve",
            StageId::ExpandCheck => "expand_check",
            StageId::ProofCheck => "proof_check",
            StageId::TraceMerge => "trace_merge",
            StageId::TraceValidate => "trace_validate",
            StageId::StrategyExtract => "strategy_extract",
            StageId::Recombine => "recombine",
            StageId::Certify => "certify",
        }
    }

    /// Operator-facing "in progress" text
    pub fn banner(self) -> &'static str {
        match self {
            StageId::Solve => "Calling QBF solver",
            StageId::ExpandCheck => "Calling SAT solver",
            StageId::ProofCheck => "Checking unsat proof",
            StageId::TraceMerge => "Producing FERP trace",
            StageId::TraceValidate => "Checking FERP trace",
            StageId::StrategyExtract => "Extracting strategy",
            StageId::Recombine => "Producing CNF",
            StageId::Certify => "Check validity of certificate",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One command-line argument, rendered against the run's paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgTemplate {
    Literal(&'static str),
    /// The input formula
    Formula,
    /// The caller-specified output path
    Output,
    /// The workspace directory, with a trailing separator
    Workspace,
    /// Path of an artifact
    Artifact(ArtifactKind),
    /// `prefix` immediately followed by the rendered inner argument
    Joined(&'static str, Box<ArgTemplate>),
}

impl ArgTemplate {
    pub fn joined(prefix: &'static str, inner: ArgTemplate) -> Self {
        Self::Joined(prefix, Box::new(inner))
    }
}

/// What happens to the tool's standard streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutMode {
    /// Shared with the operator's terminal
    Inherit,
    /// stdout and stderr go to the null device
    Discard,
    /// stdout is captured for the verdict
    Capture,
    /// stdout is written into a workspace artifact
    Redirect(ArtifactKind),
}

/// A single stage of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub id: StageId,
    pub tool: ToolId,
    pub args: Vec<ArgTemplate>,
    /// Artifacts that must exist before the tool starts
    pub inputs: Vec<ArtifactKind>,
    /// Artifacts this stage is the single producer of
    pub outputs: Vec<ArtifactKind>,
    pub stdout: StdoutMode,
    pub verdict: Verdict,
    /// Predecessor artifacts deleted after success when trimming is on
    pub trim_after: Vec<ArtifactKind>,
}

impl StageSpec {
    pub fn new(id: StageId, tool: ToolId, verdict: Verdict) -> Self {
        Self {
            id,
            tool,
            args: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            stdout: StdoutMode::Inherit,
            verdict,
            trim_after: Vec::new(),
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = ArgTemplate>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    pub fn inputs(mut self, inputs: impl IntoIterator<Item = ArtifactKind>) -> Self {
        self.inputs = inputs.into_iter().collect();
        self
    }

    pub fn outputs(mut self, outputs: impl IntoIterator<Item = ArtifactKind>) -> Self {
        self.outputs = outputs.into_iter().collect();
        self
    }

    pub fn stdout(mut self, mode: StdoutMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn trim_after(mut self, artifacts: impl IntoIterator<Item = ArtifactKind>) -> Self {
        self.trim_after = artifacts.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_follow_order() {
        let ordinals: Vec<_> = StageId::ALL.iter().map(|s| s.ordinal()).collect();
        assert_eq!(ordinals, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_stage_names_serialize_snake_case() {
        let json = serde_json::to_string(&StageId::StrategyExtract).unwrap();
        assert_eq!(json, "\"strategy_extract\"");
    }
}
