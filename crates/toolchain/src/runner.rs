//! Tool runner abstraction
//!
//! Every external tool is started through [`ToolRunner`], so the pipeline can
//! drive real binaries or scripted mocks through the same executor.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use contracts::{ToolExit, ToolId};

use crate::error::Result;

/// Where the tool's stdout (and possibly stderr) goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutTarget {
    Inherit,
    /// stdout and stderr to the null device
    Discard,
    /// stdout piped back in [`ToolRun::stdout`]
    Capture,
    /// stdout written into a freshly created file
    File(PathBuf),
}

/// A fully rendered tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: ToolId,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stdout: StdoutTarget,
    /// Kill the tool once this elapses
    pub timeout: Option<Duration>,
    /// Files the tool is expected to write
    pub outputs: Vec<PathBuf>,
}

impl ToolInvocation {
    pub fn new(tool: ToolId, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            stdout: StdoutTarget::Inherit,
            timeout: None,
            outputs: Vec::new(),
        }
    }

    /// Shell-like rendering for logs and dry runs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished tool process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub exit: ToolExit,
    /// Captured stdout, empty unless [`StdoutTarget::Capture`]
    pub stdout: Vec<u8>,
    pub elapsed: Duration,
}

/// Starts a tool and waits for it.
///
/// Dropping the returned future must stop the tool; this is how cancellation
/// reaches a running process.
#[trait_variant::make(ToolRunner: Send)]
pub trait LocalToolRunner {
    /// Run the invocation to completion (or timeout)
    ///
    /// # Errors
    /// Only when the process cannot be started or awaited; exit statuses are
    /// reported in [`ToolRun::exit`].
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun>;
}
