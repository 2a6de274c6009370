//! Batch validation of generated client sources.

use super::{ExternalTool, ToolError};
use serde::Serialize;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

pub const TSCONFIG_FILE: &str = "tsconfig.json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    pub include: Vec<String>,
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilerOptions {
    pub declaration: bool,
}

impl TsConfig {
    /// Emits declarations for every file matching `include`.
    pub fn declarations(include: Vec<String>) -> Self {
        Self {
            include,
            compiler_options: CompilerOptions { declaration: true },
        }
    }
}

/// Writes `config` into a scratch directory and runs the validator on it.
/// The scratch directory is removed when this returns.
pub async fn validate(tool: &dyn ExternalTool, config: &TsConfig) -> Result<(), ToolError> {
    let scratch = TempDir::new().map_err(|source| ToolError::Io {
        tool: tool.name().to_string(),
        path: std::env::temp_dir(),
        source,
    })?;
    let config_path = scratch.path().join(TSCONFIG_FILE);

    let content = serde_json::to_vec_pretty(config).map_err(|e| ToolError::Io {
        tool: tool.name().to_string(),
        path: config_path.clone(),
        source: e.into(),
    })?;
    tokio::fs::write(&config_path, content)
        .await
        .map_err(|source| ToolError::Io {
            tool: tool.name().to_string(),
            path: config_path.clone(),
            source,
        })?;

    debug!(include = ?config.include, "Validating generated sources");
    tool.invoke(
        &["-p".to_string(), config_path.display().to_string()],
        scratch.path(),
    )
    .await?;
    Ok(())
}
