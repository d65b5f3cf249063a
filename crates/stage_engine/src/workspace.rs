//! Run workspace and path resolution
//!
//! Intermediate artifacts live in `<root>/tmp-<pid>`, so concurrent runs
//! never share a directory. Teardown is reached from every exit path: the
//! explicit [`Workspace::finish`] call or, failing that, `Drop`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use contracts::{ArgTemplate, ArtifactKind, ArtifactLocation, CleanupPolicy, ContractError, RunOutcome};
use tracing::{debug, info, warn};

/// What teardown did with the workspace directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    Kept,
    Removed,
    /// Removal was attempted and failed (logged)
    RemovalFailed,
}

/// The per-process workspace directory
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    policy: CleanupPolicy,
    finished: bool,
}

impl Workspace {
    /// Directory name for a process id
    pub fn path_for(root: &Path, pid: u32) -> PathBuf {
        root.join(format!("tmp-{pid}"))
    }

    /// Create the workspace of the current process
    pub fn create(root: &Path, policy: CleanupPolicy) -> Result<Self, ContractError> {
        Self::create_at(Self::path_for(root, std::process::id()), policy)
    }

    /// Create (or reuse) `dir`; an existing directory is not an error
    pub fn create_at(dir: PathBuf, policy: CleanupPolicy) -> Result<Self, ContractError> {
        std::fs::create_dir_all(&dir)
            .map_err(|source| ContractError::directory_creation(&dir, source))?;
        debug!(workspace = %dir.display(), ?policy, "workspace ready");
        Ok(Self {
            dir,
            policy,
            finished: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    /// Apply the cleanup policy for the run's outcome
    pub fn finish(mut self, outcome: &RunOutcome) -> Teardown {
        self.teardown(outcome.is_success())
    }

    fn teardown(&mut self, success: bool) -> Teardown {
        self.finished = true;
        if !self.policy.should_remove(success) {
            debug!(workspace = %self.dir.display(), "keeping workspace");
            return Teardown::Kept;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                info!(workspace = %self.dir.display(), "workspace removed");
                Teardown::Removed
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Teardown::Removed,
            Err(e) => {
                warn!(workspace = %self.dir.display(), error = %e, "failed to remove workspace");
                Teardown::RemovalFailed
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.finished {
            self.teardown(false);
        }
    }
}

/// Every path a stage argument can refer to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub formula: PathBuf,
    pub output: PathBuf,
    pub workspace: PathBuf,
}

impl RunPaths {
    pub fn new(
        formula: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            formula: formula.into(),
            output: output.into(),
            workspace: workspace.into(),
        }
    }

    pub fn artifact(&self, kind: ArtifactKind) -> PathBuf {
        match kind.location() {
            ArtifactLocation::Workspace(name) => self.workspace.join(name),
            ArtifactLocation::Output => self.output.clone(),
        }
    }

    pub fn render(&self, template: &ArgTemplate) -> OsString {
        match template {
            ArgTemplate::Literal(text) => OsString::from(text),
            ArgTemplate::Formula => self.formula.clone().into_os_string(),
            ArgTemplate::Output => self.output.clone().into_os_string(),
            ArgTemplate::Workspace => {
                let mut dir = self.workspace.clone().into_os_string();
                dir.push(MAIN_SEPARATOR.to_string());
                dir
            }
            ArgTemplate::Artifact(kind) => self.artifact(*kind).into_os_string(),
            ArgTemplate::Joined(prefix, inner) => {
                let mut joined = OsString::from(prefix);
                joined.push(self.render(inner));
                joined
            }
        }
    }

    /// Delete an intermediate artifact; a missing file is fine
    pub fn remove_artifact(&self, kind: ArtifactKind) -> io::Result<bool> {
        match std::fs::remove_file(self.artifact(kind)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
