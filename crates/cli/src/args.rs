//! Argument resolution: request paths and effective run settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{CleanupPolicy, ContractError, RunConfig, ToolManifest};
use stage_engine::ExecutorOptions;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// The two positional paths, made absolute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Input file name without directory and final extension (logging only)
    pub base_name: String,
}

impl RunRequest {
    /// Resolve both paths, require the input, create the output's parent
    pub fn resolve(input: &Path, output: &Path) -> Result<Self> {
        let input = absolute(input)?;
        let output = absolute(output)?;

        if !input.exists() {
            return Err(ContractError::InputNotFound { path: input }.into());
        }
        if input == output {
            return Err(CliError::usage(format!(
                "output {} would overwrite the input formula",
                output.display()
            )));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| ContractError::directory_creation(parent, source))?;
        }

        Ok(Self {
            base_name: base_name(&input),
            input,
            output,
        })
    }
}

pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| CliError::from(ContractError::Io(e)))
}

/// Configuration after file, env and flags have been merged
#[derive(Debug, Clone)]
pub struct Settings {
    pub tool_root: PathBuf,
    pub workspace_root: PathBuf,
    pub manifest: ToolManifest,
    pub cleanup: CleanupPolicy,
    pub executor: ExecutorOptions,
}

impl Settings {
    /// Config file first, then command-line overrides
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => {
                info!(config = %path.display(), "Loading configuration");
                ConfigLoader::load_from_path(path)?
            }
            None => RunConfig::default(),
        };
        apply_overrides(&mut config, cli);
        ConfigLoader::validate(&config)?;

        let default_root = || -> Result<PathBuf> {
            let exe = std::env::current_exe().map_err(ContractError::Io)?;
            Ok(exe.parent().map(Path::to_path_buf).unwrap_or_default())
        };
        let tool_root = match config.tool_root.clone() {
            Some(root) => absolute(&root)?,
            None => default_root()?,
        };
        Self::from_config(&config, tool_root, !cli.quiet)
    }

    /// Build settings from a validated config and a resolved tool root
    pub fn from_config(config: &RunConfig, tool_root: PathBuf, announce: bool) -> Result<Self> {
        let workspace_root = match &config.workspace_root {
            Some(root) => absolute(root)?,
            None => tool_root.join("tmp"),
        };
        let overrides = ConfigLoader::tool_overrides(config)?;
        let manifest = ToolManifest::resolve(&tool_root, &overrides);
        debug!(tool_root = %tool_root.display(), overrides = overrides.len(), "tool manifest resolved");

        Ok(Self {
            tool_root,
            workspace_root,
            manifest,
            cleanup: config.cleanup,
            executor: ExecutorOptions {
                trim: config.trim,
                stage_timeout: config.stage_timeout_secs.map(Duration::from_secs),
                compress_output: config.compress_output,
                announce,
            },
        })
    }
}

fn apply_overrides(config: &mut RunConfig, cli: &Cli) {
    if let Some(root) = &cli.tool_root {
        config.tool_root = Some(root.clone());
    }
    if let Some(root) = &cli.workspace_root {
        config.workspace_root = Some(root.clone());
    }
    if cli.trim {
        config.trim = true;
    }
    if let Some(cleanup) = cli.cleanup {
        config.cleanup = cleanup.into();
    }
    match cli.stage_timeout {
        Some(0) => config.stage_timeout_secs = None,
        Some(secs) => config.stage_timeout_secs = Some(secs),
        None => {}
    }
    if cli.no_compress {
        config.compress_output = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use contracts::ToolId;
    use std::ffi::OsString;

    #[test]
    fn test_base_name_strips_dir_and_last_extension() {
        assert_eq!(base_name(Path::new("/data/bench/adder-4.qdimacs")), "adder-4");
        assert_eq!(base_name(Path::new("f.qdimacs.gz")), "f.qdimacs");
        assert_eq!(base_name(Path::new("plain")), "plain");
    }

    #[test]
    fn test_missing_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunRequest::resolve(&dir.path().join("absent.qdimacs"), &dir.path().join("o"))
            .unwrap_err();
        assert_eq!(err.exit_code(), contracts::EXIT_NO_INPUT);
    }

    #[test]
    fn test_output_parent_created() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("f.qdimacs");
        std::fs::write(&input, "p cnf 1 1\n").unwrap();
        let output = dir.path().join("nested/deeper/f.aag");

        let request = RunRequest::resolve(&input, &output).unwrap();
        assert!(output.parent().unwrap().is_dir());
        assert_eq!(request.base_name, "f");
        assert!(request.output.is_absolute());
    }

    #[test]
    fn test_output_equal_to_input_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("f.qdimacs");
        std::fs::write(&input, "").unwrap();
        let err = RunRequest::resolve(&input, &input).unwrap_err();
        assert_eq!(err.exit_code(), contracts::EXIT_USAGE);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("run.toml");
        std::fs::write(
            &config,
            "trim = false\ncompress_output = true\nstage_timeout_secs = 60\n\n[tools]\ncertificate_sat_solver = \"/usr/bin/cadical\"\n",
        )
        .unwrap();

        let args: Vec<OsString> = vec![
            "qbf-certify".into(),
            "in".into(),
            "out".into(),
            "--config".into(),
            config.clone().into_os_string(),
            "--tool-root".into(),
            dir.path().as_os_str().to_os_string(),
            "--trim".into(),
            "--no-compress".into(),
            "--stage-timeout".into(),
            "0".into(),
            "--cleanup".into(),
            "always".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let settings = Settings::resolve(&cli).unwrap();

        assert!(settings.executor.trim);
        assert!(!settings.executor.compress_output);
        assert_eq!(settings.executor.stage_timeout, None);
        assert_eq!(settings.cleanup, CleanupPolicy::Always);
        assert_eq!(settings.workspace_root, dir.path().join("tmp"));
        assert_eq!(
            settings.manifest.path(ToolId::CertificateSatSolver),
            Path::new("/usr/bin/cadical")
        );
        assert_eq!(
            settings.manifest.path(ToolId::QbfSolver),
            dir.path().join("ijtihad/ijtihad")
        );
    }

    #[test]
    fn test_unknown_tool_key_is_config_error() {
        let config = RunConfig {
            tools: [("sat".to_string(), PathBuf::from("/x"))].into_iter().collect(),
            ..RunConfig::default()
        };
        let err = Settings::from_config(&config, PathBuf::from("/opt"), false).unwrap_err();
        assert_eq!(err.exit_code(), contracts::EXIT_CONFIG);
    }
}
