//! Schema include path resolution.

use super::GenerateError;
use crate::config::SchemaDependency;
use crate::manifest::{Dependency, ModuleCache};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Include paths shared by every source path, resolved once per run, plus
/// the per-source-path relative directories.
#[derive(Debug, Clone, Default)]
pub struct IncludeResolver {
    schema_dir: PathBuf,
    extra_dirs: Vec<PathBuf>,
    shared: Vec<PathBuf>,
}

impl IncludeResolver {
    /// Global include dirs come first, then each schema dependency's dirs
    /// inside the module cache. Every schema dependency must be required by
    /// the project's manifest.
    pub fn new(
        schema_dir: &Path,
        extra_dirs: &[PathBuf],
        global: &[PathBuf],
        deps: &[Dependency],
        schema_deps: &[SchemaDependency],
        cache: &ModuleCache,
        manifest_dir: &Path,
    ) -> Result<Self, GenerateError> {
        let wanted: Vec<&str> = schema_deps.iter().map(|d| d.import_path.as_str()).collect();
        let found = ModuleCache::filter_versions(deps, &wanted);

        if found.len() != schema_deps.len() {
            let missing = schema_deps
                .iter()
                .filter(|s| !found.iter().any(|d| d.path == s.import_path))
                .map(|s| s.import_path.clone())
                .collect();
            return Err(GenerateError::MissingSchemaDependencies(missing));
        }

        let mut shared = global.to_vec();
        for (dep, schema_dep) in found.into_iter().zip(schema_deps) {
            let root = cache.locate(dep, manifest_dir)?;
            shared.extend(schema_dep.schema_dirs.iter().map(|d| root.join(d)));
        }
        debug!(includes = ?shared, "Resolved shared schema include paths");

        Ok(Self {
            schema_dir: schema_dir.to_path_buf(),
            extra_dirs: extra_dirs.to_vec(),
            shared,
        })
    }

    /// Include paths for one source path: its schema dir, its extra dirs,
    /// then the shared paths.
    pub fn resolve(&self, source_path: &Path) -> Vec<PathBuf> {
        let mut paths = vec![source_path.join(&self.schema_dir)];
        paths.extend(self.extra_dirs.iter().map(|d| source_path.join(d)));
        paths.extend(self.shared.iter().cloned());
        paths
    }
}
