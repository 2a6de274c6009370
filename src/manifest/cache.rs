use super::{Dependency, ManifestError, Replacement};
use std::env;
use std::path::{Path, PathBuf};

/// The Go module download cache (`$GOMODCACHE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCache {
    root: PathBuf,
}

impl ModuleCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the cache root the same way the go tool does:
    /// `GOMODCACHE`, then the first `GOPATH` entry plus `pkg/mod`, then
    /// `$HOME/go/pkg/mod`.
    pub fn from_env() -> Self {
        if let Some(cache) = env::var_os("GOMODCACHE").filter(|v| !v.is_empty()) {
            return Self::new(PathBuf::from(cache));
        }

        let gopath = env::var_os("GOPATH")
            .filter(|v| !v.is_empty())
            .and_then(|v| env::split_paths(&v).next())
            .or_else(|| dirs::home_dir().map(|home| home.join("go")))
            .unwrap_or_else(|| PathBuf::from("go"));

        Self::new(gopath.join("pkg").join("mod"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a module version is extracted to inside the cache.
    pub fn module_dir(&self, path: &str, version: &str) -> PathBuf {
        self.root.join(format!(
            "{}@{}",
            escape_module_path(path),
            escape_module_path(version)
        ))
    }

    /// Source root of a dependency. Local replacements resolve relative to
    /// `manifest_dir`; everything else must already be downloaded.
    pub fn locate(&self, dep: &Dependency, manifest_dir: &Path) -> Result<PathBuf, ManifestError> {
        let (path, version) = match &dep.replacement {
            Some(Replacement::Local(local)) => {
                return Ok(if local.is_absolute() {
                    local.clone()
                } else {
                    manifest_dir.join(local)
                });
            }
            Some(Replacement::Module { path, version }) => (path.as_str(), version.as_str()),
            None => (dep.path.as_str(), dep.version.as_str()),
        };

        let dir = self.module_dir(path, version);
        if !dir.is_dir() {
            return Err(ManifestError::NotInCache {
                path: path.to_string(),
                version: version.to_string(),
                dir,
            });
        }
        Ok(dir)
    }

    /// Picks the dependencies whose import path is listed, in the order of
    /// `import_paths`. Paths missing from `deps` are skipped.
    pub fn filter_versions<'a>(deps: &'a [Dependency], import_paths: &[&str]) -> Vec<&'a Dependency> {
        import_paths
            .iter()
            .filter_map(|wanted| deps.iter().find(|d| d.path == *wanted))
            .collect()
    }
}

/// Case-encodes a module path or version for use as a cache directory name:
/// every upper-case letter becomes `!` followed by its lower-case form.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
