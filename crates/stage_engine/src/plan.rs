//! The certification plan
//!
//! Eight stages as data: tool, argument template, artifact flow, stdout
//! handling and verdict. The executor interprets it without any per-stage
//! branching.

use std::collections::BTreeMap;

use contracts::{
    ArgTemplate, ArtifactKind, ExitCodeTable, StageId, StageSpec, StdoutMode, ToolId, Verdict,
    TRACE_CHECK_SUCCESS,
};
use thiserror::Error;

use contracts::ArgTemplate::{Artifact, Formula, Output};
use contracts::ArtifactKind::{
    BinaryProof, ExpandedCnf, FerpTrace, MergedCnf, RawProof, StrategyCircuit,
};

/// Structural problems in a plan
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("stage {stage} consumes {artifact}, which no earlier stage produces")]
    UnproducedInput {
        stage: StageId,
        artifact: ArtifactKind,
    },

    #[error("{artifact} is produced by both {first} and {second}")]
    DuplicateProducer {
        artifact: ArtifactKind,
        first: StageId,
        second: StageId,
    },

    #[error("stage {stage} trims {artifact}, which {consumer} still needs")]
    TrimmedTooEarly {
        stage: StageId,
        artifact: ArtifactKind,
        consumer: StageId,
    },

    #[error("stage {stage} trims {artifact}, which is not an intermediate artifact")]
    TrimsNonIntermediate {
        stage: StageId,
        artifact: ArtifactKind,
    },
}

/// Ordered stage list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    stages: Vec<StageSpec>,
}

impl Plan {
    pub fn new(stages: Vec<StageSpec>) -> Self {
        Self { stages }
    }

    /// The eight-stage QBF certification pipeline
    pub fn certification() -> Self {
        let stages = vec![
            StageSpec::new(
                StageId::Solve,
                ToolId::QbfSolver,
                Verdict::ExitCodes(ExitCodeTable::qbf_solver()),
            )
            .args([
                ArgTemplate::Literal("--wit_per_call=-1"),
                ArgTemplate::Literal("--cex_per_call=-1"),
                ArgTemplate::joined("--tmp_dir=", ArgTemplate::Workspace),
                ArgTemplate::joined("--log_phi=", Artifact(ExpandedCnf)),
                Formula,
            ])
            .outputs([ExpandedCnf]),
            StageSpec::new(
                StageId::ExpandCheck,
                ToolId::ProofSatSolver,
                Verdict::ExitCodes(ExitCodeTable::expect_unsat()),
            )
            .args([
                ArgTemplate::Literal("-T"),
                Artifact(RawProof),
                Artifact(ExpandedCnf),
            ])
            .inputs([ExpandedCnf])
            .outputs([RawProof]),
            StageSpec::new(
                StageId::ProofCheck,
                ToolId::TraceChecker,
                Verdict::StdoutEquals(TRACE_CHECK_SUCCESS),
            )
            .args([
                ArgTemplate::Literal("-B"),
                Artifact(BinaryProof),
                ArgTemplate::Literal("-c"),
                Artifact(ExpandedCnf),
                Artifact(RawProof),
            ])
            .inputs([ExpandedCnf, RawProof])
            .outputs([BinaryProof])
            .stdout(StdoutMode::Capture)
            .trim_after([RawProof]),
            StageSpec::new(
                StageId::TraceMerge,
                ToolId::TraceMerger,
                Verdict::ExitCodes(ExitCodeTable::zero_is_success()),
            )
            .args([Artifact(ExpandedCnf), Artifact(BinaryProof), Artifact(FerpTrace)])
            .inputs([ExpandedCnf, BinaryProof])
            .outputs([FerpTrace])
            .trim_after([ExpandedCnf, BinaryProof]),
            StageSpec::new(
                StageId::TraceValidate,
                ToolId::FerpChecker,
                Verdict::ExitCodes(ExitCodeTable::zero_is_success()),
            )
            .args([Formula, Artifact(FerpTrace)])
            .inputs([FerpTrace]),
            StageSpec::new(
                StageId::StrategyExtract,
                ToolId::StrategyExtractor,
                Verdict::ExitCodes(ExitCodeTable::zero_is_success()),
            )
            .args([Formula, Artifact(FerpTrace), Output])
            .inputs([FerpTrace])
            .outputs([StrategyCircuit])
            .trim_after([FerpTrace]),
            StageSpec::new(
                StageId::Recombine,
                ToolId::CertificateMerger,
                Verdict::ExitCodes(ExitCodeTable::zero_is_success()),
            )
            .args([Formula, Output])
            .inputs([StrategyCircuit])
            .outputs([MergedCnf])
            .stdout(StdoutMode::Redirect(MergedCnf)),
            StageSpec::new(
                StageId::Certify,
                ToolId::CertificateSatSolver,
                Verdict::ExitCodes(ExitCodeTable::expect_unsat()),
            )
            .args([Artifact(MergedCnf)])
            .inputs([MergedCnf])
            .stdout(StdoutMode::Discard),
        ];
        Self::new(stages)
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Check the artifact flow.
    ///
    /// Every input has an earlier producer, each artifact has one producer,
    /// and nothing is trimmed while a later stage still reads it. The
    /// strategy circuit is the run's output and may never be trimmed.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut producers: BTreeMap<ArtifactKind, StageId> = BTreeMap::new();

        for (index, spec) in self.stages.iter().enumerate() {
            for &artifact in &spec.inputs {
                if !producers.contains_key(&artifact) {
                    return Err(PlanError::UnproducedInput {
                        stage: spec.id,
                        artifact,
                    });
                }
            }

            for &artifact in &spec.outputs {
                if let Some(&first) = producers.get(&artifact) {
                    return Err(PlanError::DuplicateProducer {
                        artifact,
                        first,
                        second: spec.id,
                    });
                }
                producers.insert(artifact, spec.id);
            }

            for &artifact in &spec.trim_after {
                if artifact == StrategyCircuit {
                    return Err(PlanError::TrimsNonIntermediate {
                        stage: spec.id,
                        artifact,
                    });
                }
                if let Some(consumer) = self.stages[index + 1..]
                    .iter()
                    .find(|later| later.inputs.contains(&artifact))
                {
                    return Err(PlanError::TrimmedTooEarly {
                        stage: spec.id,
                        artifact,
                        consumer: consumer.id,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::certification()
    }
}
