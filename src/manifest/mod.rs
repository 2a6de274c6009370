//! Go dependency manifest (`go.mod`) support.
//!
//! Discovery needs the project's base import path to tell local schema
//! packages from third-party ones, and the generator needs the resolved
//! dependency list to locate schema include directories and third-party
//! source roots inside the module cache.

mod cache;

pub use cache::{escape_module_path, ModuleCache};

use crate::fs::FileSystem;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the manifest inside a source root.
pub const MANIFEST_FILE: &str = "go.mod";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No go.mod found at {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("{0} has no module directive")]
    MissingModulePath(PathBuf),
    #[error("Malformed go.mod at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Dependency {path}@{version} is not present in the module cache at {dir}")]
    NotInCache {
        path: String,
        version: String,
        dir: PathBuf,
    },
}

/// Where a replaced requirement actually lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Filesystem path, relative to the manifest directory unless absolute.
    Local(PathBuf),
    /// Another module version fetched through the module cache.
    Module { path: String, version: String },
}

/// A `require` entry, with any matching `replace` directive applied by
/// [`GoModule::resolved_dependencies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub path: String,
    pub version: String,
    pub indirect: bool,
    pub replacement: Option<Replacement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReplaceDirective {
    old_path: String,
    old_version: Option<String>,
    target: Replacement,
}

/// Parsed `go.mod`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoModule {
    pub module_path: String,
    pub go_version: Option<String>,
    pub requires: Vec<Dependency>,
    replaces: Vec<ReplaceDirective>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Require,
    Replace,
    Other,
}

impl GoModule {
    /// Reads and parses `<dir>/go.mod`.
    pub fn parse_at(fs: &dyn FileSystem, dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(MANIFEST_FILE);
        let content = fs.read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ManifestError::NotFound(dir.to_path_buf())
            } else {
                ManifestError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let module = Self::parse(&content)?;
        if module.module_path.is_empty() {
            return Err(ManifestError::MissingModulePath(path));
        }
        Ok(module)
    }

    /// Parses manifest text. An absent `module` directive leaves
    /// `module_path` empty; [`GoModule::parse_at`] rejects that.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let mut module = GoModule::default();
        let mut block = Block::None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let (code, comment) = split_comment(raw);
            let indirect = comment.map(|c| c.trim() == "indirect").unwrap_or(false);
            let tokens = tokenize(code);
            if tokens.is_empty() {
                continue;
            }

            if block != Block::None {
                if tokens[0] == ")" {
                    block = Block::None;
                    continue;
                }
                match block {
                    Block::Require => module.push_require(&tokens, indirect, line_no)?,
                    Block::Replace => module.push_replace(&tokens, line_no)?,
                    _ => {}
                }
                continue;
            }

            let opens_block = tokens.len() == 2 && tokens[1] == "(";
            match tokens[0].as_str() {
                "module" => {
                    let path = tokens.get(1).ok_or_else(|| ManifestError::Parse {
                        line: line_no,
                        message: "module directive without a path".to_string(),
                    })?;
                    module.module_path = path.clone();
                }
                "go" => module.go_version = tokens.get(1).cloned(),
                "require" if opens_block => block = Block::Require,
                "require" => module.push_require(&tokens[1..], indirect, line_no)?,
                "replace" if opens_block => block = Block::Replace,
                "replace" => module.push_replace(&tokens[1..], line_no)?,
                _ if opens_block => block = Block::Other,
                _ => {}
            }
        }

        Ok(module)
    }

    fn push_require(
        &mut self,
        tokens: &[String],
        indirect: bool,
        line: usize,
    ) -> Result<(), ManifestError> {
        match tokens {
            [path, version, ..] => {
                self.requires.push(Dependency {
                    path: path.clone(),
                    version: version.clone(),
                    indirect,
                    replacement: None,
                });
                Ok(())
            }
            _ => Err(ManifestError::Parse {
                line,
                message: "require entry needs a path and a version".to_string(),
            }),
        }
    }

    fn push_replace(&mut self, tokens: &[String], line: usize) -> Result<(), ManifestError> {
        let arrow = tokens
            .iter()
            .position(|t| t == "=>")
            .ok_or_else(|| ManifestError::Parse {
                line,
                message: "replace directive without =>".to_string(),
            })?;

        let (old, new) = (&tokens[..arrow], &tokens[arrow + 1..]);
        let target = match new {
            [path] => Replacement::Local(PathBuf::from(path)),
            [path, version] => Replacement::Module {
                path: path.clone(),
                version: version.clone(),
            },
            _ => {
                return Err(ManifestError::Parse {
                    line,
                    message: "replace target must be a path or a path and a version".to_string(),
                })
            }
        };

        match old {
            [path] => self.replaces.push(ReplaceDirective {
                old_path: path.clone(),
                old_version: None,
                target,
            }),
            [path, version] => self.replaces.push(ReplaceDirective {
                old_path: path.clone(),
                old_version: Some(version.clone()),
                target,
            }),
            _ => {
                return Err(ManifestError::Parse {
                    line,
                    message: "replace source must be a path or a path and a version".to_string(),
                })
            }
        }
        Ok(())
    }

    /// Requirements with their `replace` directives applied. A versioned
    /// replace wins over an unversioned one for the same path.
    pub fn resolved_dependencies(&self) -> Vec<Dependency> {
        self.requires
            .iter()
            .map(|req| {
                let exact = self.replaces.iter().find(|r| {
                    r.old_path == req.path && r.old_version.as_deref() == Some(&req.version)
                });
                let any = self
                    .replaces
                    .iter()
                    .find(|r| r.old_path == req.path && r.old_version.is_none());

                Dependency {
                    replacement: exact.or(any).map(|r| r.target.clone()),
                    ..req.clone()
                }
            })
            .collect()
    }
}

fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(idx) => (&line[..idx], Some(&line[idx + 2..])),
        None => (line, None),
    }
}

fn tokenize(code: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = code.trim();

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('"') {
            let end = stripped.find('"').unwrap_or(stripped.len());
            tokens.push(stripped[..end].to_string());
            rest = stripped.get(end + 1..).unwrap_or("").trim_start();
        } else if let Some(stripped) = rest.strip_prefix('(') {
            tokens.push("(".to_string());
            rest = stripped.trim_start();
        } else if let Some(stripped) = rest.strip_prefix(')') {
            tokens.push(")".to_string());
            rest = stripped.trim_start();
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
                .unwrap_or(rest.len());
            tokens.push(rest[..end].to_string());
            rest = rest[end..].trim_start();
        }
    }

    tokens
}
