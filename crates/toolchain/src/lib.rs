//! External tool execution
//!
//! The [`ToolRunner`] seam with a process-backed implementation, a scripted
//! mock for tests, and dependency preflight.

pub mod error;
pub mod mock;
pub mod preflight;
pub mod process;
pub mod runner;

pub use error::{Result, ToolchainError};
pub use mock::{MockBehavior, MockToolRunner};
pub use preflight::{check_dependencies, DependencyCheck, DependencyReport};
pub use process::ProcessRunner;
pub use runner::{LocalToolRunner, StdoutTarget, ToolInvocation, ToolRun, ToolRunner};
