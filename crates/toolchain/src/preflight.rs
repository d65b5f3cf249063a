//! Dependency preflight
//!
//! Every tool in the manifest must exist before any stage runs.

use std::path::{Path, PathBuf};

use contracts::{ContractError, ToolId, ToolManifest};
use tracing::{debug, warn};

/// Presence of one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheck {
    pub tool: ToolId,
    pub path: PathBuf,
    pub present: bool,
}

impl DependencyCheck {
    /// `Checking dependency: <path> ... OK`, with the path padded to `width`
    pub fn line(&self, width: usize) -> String {
        let path = self.path.display().to_string();
        let pad = width.saturating_sub(path.chars().count());
        let status = if self.present { "OK" } else { "MISSING" };
        format!("Checking dependency: {path}{:pad$} ... {status}", "")
    }
}

/// Result of checking the whole manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub checks: Vec<DependencyCheck>,
}

impl DependencyReport {
    pub fn missing(&self) -> Vec<&Path> {
        self.checks
            .iter()
            .filter(|check| !check.present)
            .map(|check| check.path.as_path())
            .collect()
    }

    pub fn all_present(&self) -> bool {
        self.checks.iter().all(|check| check.present)
    }

    /// One line per tool, statuses aligned on the longest path
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        let width = self
            .checks
            .iter()
            .map(|check| check.path.display().to_string().chars().count())
            .max()
            .unwrap_or(0);
        self.checks.iter().map(move |check| check.line(width))
    }

    /// # Errors
    /// [`ContractError::MissingDependencies`] listing every absent tool
    pub fn into_result(self) -> Result<Self, ContractError> {
        if self.all_present() {
            Ok(self)
        } else {
            let missing = self.missing().into_iter().map(Path::to_path_buf).collect();
            Err(ContractError::MissingDependencies { missing })
        }
    }
}

/// Check that each tool path names an existing file.
///
/// All tools are checked, so the report lists every missing one at once.
pub fn check_dependencies(manifest: &ToolManifest) -> DependencyReport {
    let checks = manifest
        .iter()
        .map(|descriptor| {
            let present = descriptor.path.is_file();
            if present {
                debug!(tool = %descriptor.id, path = %descriptor.path.display(), "dependency found");
            } else {
                warn!(tool = %descriptor.id, path = %descriptor.path.display(), "dependency missing");
            }
            DependencyCheck {
                tool: descriptor.id,
                path: descriptor.path.clone(),
                present,
            }
        })
        .collect();
    DependencyReport { checks }
}
