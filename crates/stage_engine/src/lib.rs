//! # Stage Engine
//!
//! The certification pipeline state machine.
//!
//! - [`Plan`]: the eight stages as data (tools, arguments, artifact flow, verdicts)
//! - [`judge`] / [`stdout_matches`]: pure success predicates
//! - [`Workspace`] / [`RunPaths`]: per-process workspace and path rendering
//! - [`StageExecutor`]: sequential execution with trim, timeout and cancellation
//!
//! ## Example
//!
//! ```ignore
//! let workspace = Workspace::create(&workspace_root, CleanupPolicy::Never)?;
//! let paths = RunPaths::new(formula, output, workspace.dir());
//! let executor = StageExecutor::new(ProcessRunner::new(), manifest, ExecutorOptions::default());
//! let report = executor.run(&paths, &cancel).await;
//! workspace.finish(&report.outcome);
//! ```

mod cancel;
mod compress;
mod executor;
mod plan;
mod verdict;
mod workspace;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use compress::{compressed_path, gzip_in_place};
pub use executor::{ExecutorOptions, RunReport, StageExecutor, StageRecord};
pub use plan::{Plan, PlanError};
pub use verdict::{judge, stdout_matches};
pub use workspace::{RunPaths, Teardown, Workspace};
