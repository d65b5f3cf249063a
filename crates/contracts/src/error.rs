//! Layered error definitions
//!
//! Categorized by source: config / precondition / workspace / io

use std::path::PathBuf;

use thiserror::Error;

/// Exit status for command-line usage errors
pub const EXIT_USAGE: i32 = 64;
/// Exit status for a missing input formula
pub const EXIT_NO_INPUT: i32 = 66;
/// Exit status for missing dependency binaries
pub const EXIT_UNAVAILABLE: i32 = 69;
/// Exit status for I/O failures outside the other categories
pub const EXIT_IO: i32 = 74;
/// Exit status for directory creation failures
pub const EXIT_CANT_CREATE: i32 = 73;
/// Exit status for configuration errors
pub const EXIT_CONFIG: i32 = 78;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Precondition Errors =====
    /// Input formula does not exist
    #[error("input file {} does not exist", .path.display())]
    InputNotFound { path: PathBuf },

    /// One or more dependency binaries are missing
    #[error("one or more dependencies are missing: {}", display_paths(.missing))]
    MissingDependencies { missing: Vec<PathBuf> },

    /// A required directory could not be created
    #[error("cannot create directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create directory creation error
    pub fn directory_creation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreation {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } => EXIT_CONFIG,
            Self::InputNotFound { .. } => EXIT_NO_INPUT,
            Self::MissingDependencies { .. } => EXIT_UNAVAILABLE,
            Self::DirectoryCreation { .. } => EXIT_CANT_CREATE,
            Self::Io(_) => EXIT_IO,
            Self::Other(_) => EXIT_USAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependencies_lists_paths() {
        let err = ContractError::MissingDependencies {
            missing: vec![PathBuf::from("/a/picosat"), PathBuf::from("/b/cadical")],
        };
        let text = err.to_string();
        assert!(text.contains("/a/picosat, /b/cadical"), "got: {text}");
        assert_eq!(err.exit_code(), EXIT_UNAVAILABLE);
    }

    #[test]
    fn test_io_failure_is_not_a_usage_error() {
        let err = ContractError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(err.exit_code(), EXIT_IO);
        assert_ne!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn test_precondition_codes_avoid_stage_range() {
        let errors = [
            ContractError::config_parse("x"),
            ContractError::InputNotFound {
                path: PathBuf::from("f.qdimacs"),
            },
            ContractError::directory_creation(
                "/nope",
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ),
            ContractError::Other("x".into()),
        ];
        for err in errors {
            assert!(err.exit_code() > 11, "{err} collides with a stage status");
        }
    }
}
