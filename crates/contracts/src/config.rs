//! RunConfig - Config Loader output
//!
//! Everything about a run that is not one of the two positional arguments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// When the per-run workspace is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Keep intermediate artifacts for inspection
    #[default]
    Never,
    /// Remove only after a successful run (certified or proved true)
    OnSuccess,
    /// Remove on every exit path
    Always,
}

impl CleanupPolicy {
    pub fn should_remove(self, success: bool) -> bool {
        match self {
            CleanupPolicy::Never => false,
            CleanupPolicy::OnSuccess => success,
            CleanupPolicy::Always => true,
        }
    }
}

/// Run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Install root the tool manifest is resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_root: Option<PathBuf>,

    /// Parent directory of per-process workspaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Delete intermediate artifacts once no later stage needs them
    #[serde(default)]
    pub trim: bool,

    #[serde(default)]
    pub cleanup: CleanupPolicy,

    /// Per-stage timeout in seconds (None = wait indefinitely)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,

    /// Gzip the certificate after it has been validated
    #[serde(default = "default_compress_output")]
    pub compress_output: bool,

    /// Per-tool path overrides, keyed by tool key
    #[serde(default)]
    pub tools: BTreeMap<String, PathBuf>,
}

fn default_compress_output() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tool_root: None,
            workspace_root: None,
            trim: false,
            cleanup: CleanupPolicy::default(),
            stage_timeout_secs: None,
            compress_output: default_compress_output(),
            tools: BTreeMap::new(),
        }
    }
}
