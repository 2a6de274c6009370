//! Native (Go) binding generation into the project tree.

use super::scope::Scope;
use super::{GenerateError, GenerationContext};
use crate::schema::{PackageIndex, ProtoPackageIndex};
use crate::tools::protoc::{ProtocArgs, GOCOSMOS_OUT, GRPC_GATEWAY_OUT};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Compiles every schema package under the project's schema directory into
/// a scratch tree, then copies the `<import_path>` subtree over the project.
pub(crate) async fn generate(
    ctx: &GenerationContext,
    import_path: &str,
    scope: &Scope,
) -> Result<(), GenerateError> {
    let start = Instant::now();
    scope.check()?;

    let schema_root = ctx.project_path.join(&ctx.schema_dir);
    let packages = tokio::task::spawn_blocking(move || ProtoPackageIndex::new().packages(&schema_root))
        .await
        .map_err(|e| GenerateError::Task(e.to_string()))??;

    let scratch = TempDir::new().map_err(|source| GenerateError::Io {
        action: "create",
        path: std::env::temp_dir(),
        source,
    })?;
    let includes = ctx.includes.resolve(&ctx.project_path);

    for package in &packages {
        scope.check()?;
        debug!(package = %package.name, stage = "native", "Compiling native bindings");
        let args = ProtocArgs::new()
            .includes(&includes)
            .output(GOCOSMOS_OUT)
            .output(GRPC_GATEWAY_OUT)
            .files(&package.files)
            .build();
        ctx.toolchain
            .protoc
            .invoke(&args, scratch.path())
            .await
            .map_err(|source| GenerateError::Tool {
                stage: "native",
                target: package.name.clone(),
                source,
            })?;
    }

    scope.check()?;
    let generated = scratch.path().join(import_path);
    let project = ctx.project_path.clone();
    let copied = tokio::task::spawn_blocking(move || copy_tree(&generated, &project))
        .await
        .map_err(|e| GenerateError::Task(e.to_string()))??;

    info!(
        packages = packages.len(),
        files = copied,
        duration_ms = start.elapsed().as_millis() as u64,
        "Generated native bindings"
    );
    Ok(())
}

/// Copies every file below `from` to the same relative location below `to`.
/// A missing `from` copies nothing.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> Result<usize, GenerateError> {
    if !from.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| GenerateError::Io {
            action: "scan",
            path: from.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| GenerateError::Io {
                action: "create",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(entry.path(), &target).map_err(|source| GenerateError::Io {
            action: "copy",
            path: target.clone(),
            source,
        })?;
        copied += 1;
    }
    Ok(copied)
}
