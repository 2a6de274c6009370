//! External black-box tools behind one narrow interface.

pub mod openapi;
pub mod protoc;
pub mod tsc;

use crate::config::ModgenConfig;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to launch {tool}: {source}")]
    Spawn { tool: String, source: io::Error },

    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to prepare {path} for {tool}: {source}")]
    Io {
        tool: String,
        path: PathBuf,
        source: io::Error,
    },
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait ExternalTool: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the tool with `args` from `work_dir`. A non-zero exit is an error.
    async fn invoke(&self, args: &[String], work_dir: &Path) -> Result<ToolOutput, ToolError>;
}

/// An [`ExternalTool`] backed by a program on disk or on `PATH`.
#[derive(Debug, Clone)]
pub struct CommandTool {
    name: String,
    program: PathBuf,
}

impl CommandTool {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl ExternalTool for CommandTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, args: &[String], work_dir: &Path) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        debug!(tool = %self.name, ?args, work_dir = %work_dir.display(), "Invoking external tool");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                tool: self.name.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        debug!(
            tool = %self.name,
            status = %output.status,
            duration_ms = start.elapsed().as_millis() as u64,
            "External tool finished"
        );

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: self.name.clone(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

/// The set of tools the generation pipeline drives.
#[derive(Clone)]
pub struct Toolchain {
    /// Schema compiler.
    pub protoc: Arc<dyn ExternalTool>,
    /// OpenAPI description to REST client converter.
    pub converter: Arc<dyn ExternalTool>,
    /// Batch validator and transpiler for generated client sources.
    pub validator: Arc<dyn ExternalTool>,
    /// Bindings plugin handed to the schema compiler.
    pub ts_proto_plugin: PathBuf,
}

impl Toolchain {
    pub fn from_config(config: &ModgenConfig) -> Self {
        Self {
            protoc: Arc::new(CommandTool::new("protoc", &config.protoc)),
            converter: Arc::new(CommandTool::new("openapi-converter", &config.openapi_converter)),
            validator: Arc::new(CommandTool::new("tsc", &config.tsc)),
            ts_proto_plugin: config.ts_proto_plugin.clone(),
        }
    }
}
