//! Client generation: native bindings, per-module web clients and the store
//! loader, run in that order.

mod client;
mod include;
mod loader;
mod native;
mod options;
mod scope;
mod templates;

pub use client::{MODULE_FILE, REST_FILE, STORE_FILE, TYPES_DIR};
pub use include::IncludeResolver;
pub use loader::{scan_markers, LoaderEntry, LOADER_FILE, STORE_MARKER};
pub use options::{GenerateOptions, OutputResolver};
pub use scope::Scope;

use crate::config::ModgenConfig;
use crate::discovery::{Discoverer, DiscoveryError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::manifest::{Dependency, GoModule, ManifestError, ModuleCache};
use crate::schema::SchemaError;
use crate::tools::{ToolError, Toolchain};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Generation cancelled")]
    Cancelled,

    #[error("Generation deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid dependency manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Module discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to index schema packages: {0}")]
    Schema(#[from] SchemaError),

    #[error("go.mod has missing schema modules: {}", .0.join(", "))]
    MissingSchemaDependencies(Vec<String>),

    #[error("{stage} stage failed for {target}: {source}")]
    Tool {
        stage: &'static str,
        target: String,
        #[source]
        source: ToolError,
    },

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to render {template}: {message}")]
    Render {
        template: &'static str,
        message: String,
    },

    #[error("Generation task failed: {0}")]
    Task(String),
}

impl GenerateError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Read-only state shared by every task of one `generate` call.
pub(crate) struct GenerationContext {
    pub(crate) project_path: PathBuf,
    pub(crate) schema_dir: PathBuf,
    pub(crate) options: GenerateOptions,
    pub(crate) toolchain: Toolchain,
    pub(crate) discoverer: Discoverer,
    pub(crate) includes: IncludeResolver,
    pub(crate) deps: Vec<Dependency>,
    pub(crate) module_cache: ModuleCache,
}

/// Entry point of the generation pipeline.
pub struct Generator {
    config: ModgenConfig,
    toolchain: Toolchain,
    discoverer: Discoverer,
    fs: Arc<dyn FileSystem>,
}

impl Generator {
    pub fn new(config: ModgenConfig) -> Self {
        Self {
            toolchain: Toolchain::from_config(&config),
            discoverer: Discoverer::with_defaults(),
            fs: Arc::new(RealFileSystem::new()),
            config,
        }
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_discoverer(mut self, discoverer: Discoverer) -> Self {
        self.discoverer = discoverer;
        self
    }

    pub fn config(&self) -> &ModgenConfig {
        &self.config
    }

    /// Runs every enabled mode for the project at `project_path`, whose
    /// schema files live in `schema_dir` (relative to the project).
    ///
    /// Native bindings always finish before web clients start, since module
    /// discovery needs the generated Go types. The loader only runs after
    /// every module task succeeded. Cancelling `token` stops the run at the
    /// next stage boundary.
    pub async fn generate(
        &self,
        project_path: &Path,
        schema_dir: &Path,
        options: GenerateOptions,
        token: CancellationToken,
    ) -> Result<(), GenerateError> {
        let start = Instant::now();
        let scope = Scope::new(token.child_token(), options.deadline);
        scope.check()?;

        if options.is_noop() {
            debug!("No generation mode enabled");
            return Ok(());
        }

        let manifest = GoModule::parse_at(self.fs.as_ref(), project_path)?;
        let deps = manifest.resolved_dependencies();
        let includes = IncludeResolver::new(
            schema_dir,
            &options.include_dirs,
            &self.config.include_dirs,
            &deps,
            &self.config.schema_dependencies,
            &self.config.module_cache,
            project_path,
        )?;

        let ctx = Arc::new(GenerationContext {
            project_path: project_path.to_path_buf(),
            schema_dir: schema_dir.to_path_buf(),
            options,
            toolchain: self.toolchain.clone(),
            discoverer: self.discoverer.clone(),
            includes,
            deps,
            module_cache: self.config.module_cache.clone(),
        });

        if let Some(import_path) = ctx.options.native_import_path.as_deref() {
            info!(import_path, "Generating native bindings");
            native::generate(&ctx, import_path, &scope).await?;
        }

        if let Some(web) = ctx.options.web_client.clone() {
            client::generate_all(ctx.clone(), web, &scope).await?;

            if let Some(store_root) = ctx.options.store_root.as_deref() {
                loader::generate(store_root, ctx.toolchain.validator.as_ref(), &scope).await?;
            }
        }

        info!(
            project = %project_path.display(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(())
    }
}
