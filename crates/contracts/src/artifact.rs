//! Artifacts - files produced by one stage and consumed by later ones.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type tag of a pipeline artifact.
///
/// The tag only drives naming and human-readable messages, never dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Propositional expansion logged by the QBF solver
    ExpandedCnf,
    /// Extended resolution trace from the SAT solver
    RawProof,
    /// Binary resolution proof extracted by the trace checker
    BinaryProof,
    /// FERP trace linking the proof back to the quantifier prefix
    FerpTrace,
    /// Winning strategy circuit (the primary output)
    StrategyCircuit,
    /// Formula combined with the strategy, ready for a SAT check
    MergedCnf,
}

/// Where an artifact lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// File with a fixed name inside the run workspace
    Workspace(&'static str),
    /// The caller-specified output path
    Output,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::ExpandedCnf,
        ArtifactKind::RawProof,
        ArtifactKind::BinaryProof,
        ArtifactKind::FerpTrace,
        ArtifactKind::StrategyCircuit,
        ArtifactKind::MergedCnf,
    ];

    pub fn location(self) -> ArtifactLocation {
        match self {
            ArtifactKind::ExpandedCnf => ArtifactLocation::Workspace("tmp.cnf"),
            ArtifactKind::RawProof => ArtifactLocation::Workspace("tmp.proof"),
            ArtifactKind::BinaryProof => ArtifactLocation::Workspace("tmp.proof2"),
            ArtifactKind::FerpTrace => ArtifactLocation::Workspace("tmp.ferp"),
            ArtifactKind::StrategyCircuit => ArtifactLocation::Output,
            ArtifactKind::MergedCnf => ArtifactLocation::Workspace("tmp.cnf2"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::ExpandedCnf => "expanded CNF",
            ArtifactKind::RawProof => "raw proof",
            ArtifactKind::BinaryProof => "binary resolution proof",
            ArtifactKind::FerpTrace => "FERP trace",
            ArtifactKind::StrategyCircuit => "strategy circuit",
            ArtifactKind::MergedCnf => "merged CNF",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
