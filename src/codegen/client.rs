//! Per-module client pipeline, fanned out over source paths and modules.

use super::options::WebClientOptions;
use super::scope::{join_all, Scope};
use super::{templates, GenerateError, GenerationContext};
use crate::discovery::Module;
use crate::tools::openapi::{converter_args, STRIP_NAMESPACE};
use crate::tools::protoc::{ProtocArgs, OPENAPI_FILE, OPENAPI_OUT, TS_PROTO_OUT};
use crate::tools::tsc::{self, TsConfig};
use crate::tools::ToolError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tokio::task::JoinSet;
use tracing::{debug, info};

pub const TYPES_DIR: &str = "types";
pub const REST_FILE: &str = "rest.ts";
pub const MODULE_FILE: &str = "index.ts";
pub const STORE_FILE: &str = "index.ts";
const TS_PROTO_PLUGIN_NAME: &str = "protoc-gen-ts_proto";

/// Source roots to discover modules in: the project, then (optionally)
/// every resolved dependency located in the module cache.
pub(crate) fn source_paths(
    ctx: &GenerationContext,
    include_third_party: bool,
) -> Result<Vec<PathBuf>, GenerateError> {
    let mut paths = vec![ctx.project_path.clone()];
    if include_third_party {
        for dep in &ctx.deps {
            paths.push(ctx.module_cache.locate(dep, &ctx.project_path)?);
        }
    }
    Ok(paths)
}

/// Generates every module of every source path. Returns once all tasks are
/// drained; the first error cancels the rest.
pub(crate) async fn generate_all(
    ctx: Arc<GenerationContext>,
    web: WebClientOptions,
    scope: &Scope,
) -> Result<(), GenerateError> {
    let paths = source_paths(&ctx, web.include_third_party)?;
    info!(source_paths = paths.len(), "Generating module clients");

    let mut set = JoinSet::new();
    for source_path in paths {
        let ctx = ctx.clone();
        let web = web.clone();
        let scope = scope.child();
        set.spawn(async move { generate_source_path(ctx, web, source_path, scope).await });
    }
    join_all(&mut set, scope).await
}

async fn generate_source_path(
    ctx: Arc<GenerationContext>,
    web: WebClientOptions,
    source_path: PathBuf,
    scope: Scope,
) -> Result<(), GenerateError> {
    scope.check()?;

    let discoverer = ctx.discoverer.clone();
    let root = source_path.clone();
    let modules = tokio::task::spawn_blocking(move || discoverer.discover(&root))
        .await
        .map_err(|e| GenerateError::Task(e.to_string()))??;

    let schema_root = source_path.join(&ctx.schema_dir);
    let modules: Vec<Module> = modules
        .into_iter()
        .filter(|m| m.schema_dir().starts_with(&schema_root))
        .collect();
    debug!(source = %source_path.display(), modules = modules.len(), "Discovered modules for source path");

    let includes: Arc<[PathBuf]> = ctx.includes.resolve(&source_path).into();
    let mut set = JoinSet::new();
    for module in modules {
        let task = ModuleTask {
            ctx: ctx.clone(),
            out: (web.out)(&module),
            schema_root: schema_root.clone(),
            includes: includes.clone(),
            module,
        };
        let scope = scope.clone();
        set.spawn(async move { task.run(&scope).await });
    }
    join_all(&mut set, &scope).await
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> GenerateError {
    let path = path.to_path_buf();
    move |source| GenerateError::Io {
        action,
        path,
        source,
    }
}

/// One module's strictly ordered stage sequence.
struct ModuleTask {
    ctx: Arc<GenerationContext>,
    module: Module,
    out: PathBuf,
    schema_root: PathBuf,
    includes: Arc<[PathBuf]>,
}

impl ModuleTask {
    fn tool_error(&self, stage: &'static str) -> impl FnOnce(ToolError) -> GenerateError {
        let target = self.module.package_name().to_string();
        move |source| GenerateError::Tool {
            stage,
            target,
            source,
        }
    }

    fn store_dir(&self) -> PathBuf {
        self.out
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.out.clone())
    }

    async fn run(&self, scope: &Scope) -> Result<(), GenerateError> {
        let start = Instant::now();
        let types_out = self.out.join(TYPES_DIR);

        scope.check()?;
        debug!(module = %self.module.name, stage = "recreate", out = %self.out.display(), "Recreating output directory");
        match tokio::fs::remove_dir_all(&self.out).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(io_error("remove", &self.out)(e));
            }
            _ => {}
        }
        tokio::fs::create_dir_all(&types_out)
            .await
            .map_err(io_error("create", &types_out))?;

        scope.check()?;
        debug!(module = %self.module.name, stage = "bindings", "Compiling typed bindings");
        let args = ProtocArgs::new()
            .includes(self.includes.iter())
            .plugin(TS_PROTO_PLUGIN_NAME, &self.ctx.toolchain.ts_proto_plugin)
            .output(TS_PROTO_OUT)
            .files(&self.module.package.files)
            .build();
        self.ctx
            .toolchain
            .protoc
            .invoke(&args, &types_out)
            .await
            .map_err(self.tool_error("bindings"))?;

        scope.check()?;
        self.generate_rest_client(scope).await?;

        scope.check()?;
        debug!(module = %self.module.name, stage = "render", "Rendering client wrappers");
        self.render_wrappers().await?;

        scope.check()?;
        debug!(module = %self.module.name, stage = "validate", "Validating generated sources");
        let include = format!("{}/**/*.ts", self.store_dir().display());
        tsc::validate(
            self.ctx.toolchain.validator.as_ref(),
            &TsConfig::declarations(vec![include]),
        )
        .await
        .map_err(self.tool_error("validate"))?;

        info!(
            module = %self.module.name,
            package = %self.module.package_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generated module client"
        );
        Ok(())
    }

    /// OpenAPI description into a scratch dir, then the REST client. The
    /// scratch dir is removed on every exit path.
    async fn generate_rest_client(&self, scope: &Scope) -> Result<(), GenerateError> {
        debug!(module = %self.module.name, stage = "openapi", "Compiling OpenAPI description");
        let scratch = TempDir::new().map_err(io_error("create", &std::env::temp_dir()))?;
        let args = ProtocArgs::new()
            .includes(self.includes.iter())
            .output(OPENAPI_OUT)
            .files(&self.module.package.files)
            .build();
        self.ctx
            .toolchain
            .protoc
            .invoke(&args, scratch.path())
            .await
            .map_err(self.tool_error("openapi"))?;

        scope.check()?;
        debug!(module = %self.module.name, stage = "rest", "Converting OpenAPI description");
        let args = converter_args(
            &scratch.path().join(OPENAPI_FILE),
            &self.out.join(REST_FILE),
            STRIP_NAMESPACE,
        );
        self.ctx
            .toolchain
            .converter
            .invoke(&args, &self.out)
            .await
            .map_err(self.tool_error("rest"))?;
        Ok(())
    }

    async fn render_wrappers(&self) -> Result<(), GenerateError> {
        let client = templates::module_client(&self.module, &self.schema_root)?;
        let client_path = self.out.join(MODULE_FILE);
        tokio::fs::write(&client_path, client)
            .await
            .map_err(io_error("write", &client_path))?;

        if self.ctx.options.store_root.is_none() {
            return Ok(());
        }

        let store_dir = self.store_dir();
        let module_dir = self
            .out
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let store = templates::store_module(&self.module, &self.schema_root, &module_dir)?;
        let store_path = store_dir.join(STORE_FILE);
        tokio::fs::write(&store_path, store)
            .await
            .map_err(io_error("write", &store_path))?;

        let marker = store_dir.join(super::loader::STORE_MARKER);
        tokio::fs::write(&marker, "")
            .await
            .map_err(io_error("write", &marker))?;
        Ok(())
    }
}
