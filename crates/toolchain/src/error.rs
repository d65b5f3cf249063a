//! Toolchain error types

use std::path::PathBuf;

use contracts::ToolId;
use thiserror::Error;

/// Failures around a tool process, as opposed to the tool's own verdict
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The process could not be spawned
    #[error("failed to launch {tool} ({}): {source}", .program.display())]
    Launch {
        tool: ToolId,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stdout redirection target could not be created
    #[error("failed to open {} for {tool} output: {source}", .path.display())]
    Redirect {
        tool: ToolId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the process failed
    #[error("failed to wait for {tool}: {source}")]
    Wait {
        tool: ToolId,
        #[source]
        source: std::io::Error,
    },
}

impl ToolchainError {
    pub fn launch(tool: ToolId, program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Launch {
            tool,
            program: program.into(),
            source,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ToolchainError>;
