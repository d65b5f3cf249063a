//! External tool identities and the ordered dependency manifest.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One of the eight opaque binaries the pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// Expansion-based QBF solver, logs the expanded CNF
    QbfSolver,
    /// SAT solver with resolution trace output
    ProofSatSolver,
    /// Trace checker, extracts a binary resolution proof
    TraceChecker,
    /// Merges CNF annotations with the binary proof into a FERP trace
    TraceMerger,
    /// FERP trace consistency checker
    FerpChecker,
    /// Strategy circuit extractor
    StrategyExtractor,
    /// Combines the formula with the strategy circuit into CNF
    CertificateMerger,
    /// SAT solver that certifies the merged CNF
    CertificateSatSolver,
}

impl ToolId {
    /// Manifest order
    pub const ALL: [ToolId; 8] = [
        ToolId::QbfSolver,
        ToolId::ProofSatSolver,
        ToolId::TraceChecker,
        ToolId::TraceMerger,
        ToolId::FerpChecker,
        ToolId::StrategyExtractor,
        ToolId::CertificateMerger,
        ToolId::CertificateSatSolver,
    ];

    /// Key used in configuration files
    pub fn key(self) -> &'static str {
        match self {
            ToolId::QbfSolver => "qbf_solver",
            ToolId::ProofSatSolver => "proof_sat_solver",
            ToolId::TraceChecker => "trace_checker",
            ToolId::TraceMerger => "trace_merger",
            ToolId::FerpChecker => "ferp_checker",
            ToolId::StrategyExtractor => "strategy_extractor",
            ToolId::CertificateMerger => "certificate_merger",
            ToolId::CertificateSatSolver => "certificate_sat_solver",
        }
    }

    /// Parse a configuration key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }

    /// Location of the binary relative to the install root
    pub fn default_relative_path(self) -> &'static str {
        match self {
            ToolId::QbfSolver => "ijtihad/ijtihad",
            ToolId::ProofSatSolver => "picosat-965/picosat",
            ToolId::TraceChecker => "booleforce-1.2/tracecheck",
            ToolId::TraceMerger => "toferp/toferp",
            ToolId::FerpChecker => "ferpcert/ferpcheck",
            ToolId::StrategyExtractor => "ferpcert2/ferpcert",
            ToolId::CertificateMerger => "certcheck-1.0.1/certcheck",
            ToolId::CertificateSatSolver => "cadical/build/cadical",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A resolved tool location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub id: ToolId,
    pub path: PathBuf,
}

/// Ordered collection of every tool the pipeline will invoke.
///
/// Always holds exactly one descriptor per [`ToolId`], in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolManifest {
    tools: Vec<ToolDescriptor>,
}

impl ToolManifest {
    /// Resolve every tool against `root`.
    ///
    /// Overrides replace the default location; relative overrides are joined onto `root`.
    pub fn resolve(root: &Path, overrides: &BTreeMap<ToolId, PathBuf>) -> Self {
        let tools = ToolId::ALL
            .into_iter()
            .map(|id| {
                let path = match overrides.get(&id) {
                    Some(custom) if custom.is_absolute() => custom.clone(),
                    Some(custom) => root.join(custom),
                    None => root.join(id.default_relative_path()),
                };
                ToolDescriptor { id, path }
            })
            .collect();
        Self { tools }
    }

    /// Path of a tool
    pub fn path(&self, id: ToolId) -> &Path {
        // `tools` is indexed by manifest order by construction.
        &self.tools[id as usize].path
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
