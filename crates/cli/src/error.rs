//! Error types for CLI operations.

use contracts::{ContractError, EXIT_USAGE};
use stage_engine::PlanError;
use thiserror::Error;

/// Internal software error (sysexits `EX_SOFTWARE`)
pub const EXIT_SOFTWARE: i32 = 70;

/// Errors that end the run before (or outside of) stage execution
#[derive(Error, Debug)]
pub enum CliError {
    /// Bad command line
    #[error("{0}")]
    Usage(String),

    /// Precondition or configuration failure
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The stage plan is inconsistent
    #[error("invalid stage plan: {0}")]
    Plan(#[from] PlanError),

    /// Observability setup or other edge failures
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Process exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Contract(e) => e.exit_code(),
            Self::Plan(_) | Self::Other(_) => EXIT_SOFTWARE,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_precondition_statuses_pass_through() {
        let err = CliError::from(ContractError::InputNotFound {
            path: PathBuf::from("/nope.qdimacs"),
        });
        assert_eq!(err.exit_code(), contracts::EXIT_NO_INPUT);
        assert_eq!(CliError::usage("bad").exit_code(), EXIT_USAGE);
    }
}
