//! Configuration validation
//!
//! Rules:
//! - tool override keys name a known tool
//! - no path is empty
//! - a stage timeout, when set, is > 0

use contracts::{ContractError, RunConfig, ToolId};

/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &RunConfig) -> Result<(), ContractError> {
    validate_tools(config)?;
    validate_paths(config)?;
    validate_timeout(config)?;
    Ok(())
}

fn validate_tools(config: &RunConfig) -> Result<(), ContractError> {
    for (key, path) in &config.tools {
        if ToolId::from_key(key).is_none() {
            let known: Vec<_> = ToolId::ALL.iter().map(|id| id.key()).collect();
            return Err(ContractError::config_validation(
                format!("tools.{key}"),
                format!("unknown tool, expected one of: {}", known.join(", ")),
            ));
        }
        if path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                format!("tools.{key}"),
                "tool path cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_paths(config: &RunConfig) -> Result<(), ContractError> {
    let optional = [
        ("tool_root", &config.tool_root),
        ("workspace_root", &config.workspace_root),
    ];
    for (field, path) in optional {
        if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ContractError::config_validation(
                field,
                "path cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_timeout(config: &RunConfig) -> Result<(), ContractError> {
    if config.stage_timeout_secs == Some(0) {
        return Err(ContractError::config_validation(
            "stage_timeout_secs",
            "stage_timeout_secs must be > 0, omit it to disable timeouts",
        ));
    }
    Ok(())
}
