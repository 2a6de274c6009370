//! Root loader generation over the store markers left by module tasks.

use super::scope::Scope;
use super::templates;
use super::GenerateError;
use crate::tools::tsc::{self, TsConfig};
use crate::tools::ExternalTool;
use heck::ToUpperCamelCase;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Fixed marker written next to every generated store wrapper.
pub const STORE_MARKER: &str = "vuex-root";
pub const LOADER_FILE: &str = "index.ts";

/// One store module as seen from the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderEntry {
    /// Camel-cased directory name, e.g. `Blog`.
    pub name: String,
    /// Directory name, e.g. `blog`.
    pub path: String,
    /// Camel-cased relative path, e.g. `AlicePlanetBlog`.
    pub full_name: String,
    /// Directory relative to the store root, `/`-separated.
    pub full_path: String,
}

impl LoaderEntry {
    fn from_relative(dir: &Path) -> Self {
        let full_path = dir
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let path = full_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            name: loader_ident(&path),
            full_name: loader_ident(&full_path.replace('/', "_")),
            path,
            full_path,
        }
    }
}

/// Upper camel case where a digit run also ends a word, so `v1beta1`
/// becomes `V1Beta1`.
fn loader_ident(s: &str) -> String {
    let mut split = String::with_capacity(s.len() + 4);
    let mut after_digit = false;
    for c in s.chars() {
        if after_digit && c.is_alphabetic() {
            split.push('_');
        }
        split.push(c);
        after_digit = c.is_ascii_digit();
    }
    split.to_upper_camel_case()
}

/// Finds every marker below `store_root`, sorted by path.
pub fn scan_markers(store_root: &Path) -> Result<Vec<LoaderEntry>, GenerateError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(store_root).sort_by_file_name() {
        let entry = entry.map_err(|e| GenerateError::Io {
            action: "scan",
            path: store_root.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() || entry.file_name() != STORE_MARKER {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        if let Ok(relative) = dir.strip_prefix(store_root) {
            if relative.as_os_str().is_empty() {
                continue;
            }
            entries.push(LoaderEntry::from_relative(relative));
        }
    }
    Ok(entries)
}

/// Writes `<store_root>/index.ts` enumerating every marked module and
/// validates it.
pub(crate) async fn generate(
    store_root: &Path,
    validator: &dyn ExternalTool,
    scope: &Scope,
) -> Result<PathBuf, GenerateError> {
    scope.check()?;
    tokio::fs::create_dir_all(store_root)
        .await
        .map_err(|source| GenerateError::Io {
            action: "create",
            path: store_root.to_path_buf(),
            source,
        })?;

    let root = store_root.to_path_buf();
    let entries = tokio::task::spawn_blocking(move || scan_markers(&root))
        .await
        .map_err(|e| GenerateError::Task(e.to_string()))??;

    let loader_path = store_root.join(LOADER_FILE);
    let content = templates::store_root(&entries)?;
    tokio::fs::write(&loader_path, content)
        .await
        .map_err(|source| GenerateError::Io {
            action: "write",
            path: loader_path.clone(),
            source,
        })?;

    scope.check()?;
    tsc::validate(
        validator,
        &TsConfig::declarations(vec![loader_path.display().to_string()]),
    )
    .await
    .map_err(|source| GenerateError::Tool {
        stage: "validate",
        target: "store loader".to_string(),
        source,
    })?;

    info!(modules = entries.len(), path = %loader_path.display(), "Generated store loader");
    Ok(loader_path)
}
