//! Source inspection: finds the exported Go types of one directory whose
//! method set satisfies the command-message fingerprint.

use super::capability::{CapabilityMatcher, MSG_FINGERPRINT};
use crate::fs::FileSystem;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum InspectError {
    /// Non-fatal: the directory holds no type satisfying the fingerprint.
    #[error("No module found in {0}")]
    NoModule(PathBuf),

    #[error("Directory {dir} declares more than one Go package: {packages:?}")]
    MixedPackages { dir: PathBuf, packages: Vec<String> },

    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

#[cfg_attr(test, mockall::automock)]
pub trait SourceInspector: Send + Sync {
    /// Sorted names of exported types in `dir` that satisfy the fingerprint.
    fn matching_types(&self, dir: &Path) -> Result<Vec<String>, InspectError>;
}

fn package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^package\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"))
}

fn build_constraint_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*//\s*(?:go:build|\+build)\s+(.*)$").expect("valid regex")
    })
}

/// True when a build constraint above the package clause names the `ignore`
/// tag, which keeps the file out of every build.
fn is_build_ignored(content: &str) -> bool {
    let header_end = package_regex()
        .find(content)
        .map(|m| m.start())
        .unwrap_or(content.len());

    build_constraint_regex()
        .captures_iter(&content[..header_end])
        .any(|caps| {
            caps[1]
                .split(|c: char| c.is_whitespace() || "()&|,".contains(c))
                .any(|tag| tag == "ignore")
        })
}

fn method_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^func\s*\(\s*(?:[A-Za-z_][A-Za-z0-9_]*\s+)?\*?\s*([A-Za-z_][A-Za-z0-9_]*)(?:\[[^\]]*\])?\s*\)\s*([A-Za-z_][A-Za-z0-9_]*)\s*[\[(]",
        )
        .expect("valid regex")
    })
}

/// Regex-based reader of Go method declarations.
pub struct GoSourceInspector {
    fs: Arc<dyn FileSystem>,
    matcher: Arc<dyn CapabilityMatcher>,
}

impl GoSourceInspector {
    pub fn new(fs: Arc<dyn FileSystem>, matcher: Arc<dyn CapabilityMatcher>) -> Self {
        Self { fs, matcher }
    }

    fn source_files(&self, dir: &Path) -> Result<Vec<PathBuf>, InspectError> {
        let entries = self.fs.read_dir(dir).map_err(|source| InspectError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(entries
            .into_iter()
            .filter(|e| e.is_file())
            .filter(|e| e.file_name().ends_with(".go") && !e.file_name().ends_with("_test.go"))
            .map(|e| e.path)
            .collect())
    }
}

impl SourceInspector for GoSourceInspector {
    fn matching_types(&self, dir: &Path) -> Result<Vec<String>, InspectError> {
        if !self.fs.is_dir(dir) {
            return Err(InspectError::NoModule(dir.to_path_buf()));
        }

        let files = self.source_files(dir)?;
        if files.is_empty() {
            return Err(InspectError::NoModule(dir.to_path_buf()));
        }

        let mut packages = BTreeSet::new();
        let mut methods: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for file in &files {
            let content = self
                .fs
                .read_to_string(file)
                .map_err(|source| InspectError::Io {
                    path: file.clone(),
                    source,
                })?;

            if is_build_ignored(&content) {
                debug!(file = %file.display(), "Skipping build-ignored source file");
                continue;
            }
            if let Some(caps) = package_regex().captures(&content) {
                packages.insert(caps[1].to_string());
            }
            for caps in method_regex().captures_iter(&content) {
                methods
                    .entry(caps[1].to_string())
                    .or_default()
                    .insert(caps[2].to_string());
            }
        }

        if packages.len() > 1 {
            return Err(InspectError::MixedPackages {
                dir: dir.to_path_buf(),
                packages: packages.into_iter().collect(),
            });
        }

        let matched: Vec<String> = methods
            .into_iter()
            .filter(|(name, _)| name.starts_with(|c: char| c.is_ascii_uppercase()))
            .filter(|(_, declared)| self.matcher.matches(&MSG_FINGERPRINT, declared))
            .map(|(name, _)| name)
            .collect();

        debug!(dir = %dir.display(), files = files.len(), matched = matched.len(), "Inspected source directory");

        if matched.is_empty() {
            return Err(InspectError::NoModule(dir.to_path_buf()));
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::MethodNameMatcher;
    use crate::fs::MockFileSystem;

    const MSG_SOURCE: &str = r#"package types

import sdk "github.com/cosmos/cosmos-sdk/types"

var _ sdk.Msg = &MsgCreatePost{}

func NewMsgCreatePost(creator string) *MsgCreatePost {
	return &MsgCreatePost{Creator: creator}
}

func (msg *MsgCreatePost) Route() string { return RouterKey }
func (msg *MsgCreatePost) Type() string { return "CreatePost" }
func (msg *MsgCreatePost) GetSigners() []sdk.AccAddress { return nil }
func (msg *MsgCreatePost) GetSignBytes() []byte { return nil }
func (msg *MsgCreatePost) ValidateBasic() error { return nil }

func (msg MsgPartial) Route() string { return RouterKey }
func (msg MsgPartial) Type() string { return "Partial" }
"#;

    fn inspector(fs: MockFileSystem) -> GoSourceInspector {
        GoSourceInspector::new(Arc::new(fs), Arc::new(MethodNameMatcher))
    }

    #[test]
    fn test_finds_types_with_full_fingerprint() {
        let fs = MockFileSystem::new();
        fs.add_file("x/blog/types/message_post.go", MSG_SOURCE);
        let dir = fs.root().join("x/blog/types");

        let names = inspector(fs).matching_types(&dir).unwrap();
        assert_eq!(names, vec!["MsgCreatePost"]);
    }

    #[test]
    fn test_methods_split_across_files() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "types/a.go",
            "package types\n\nfunc (m MsgSend) Route() string { return \"\" }\nfunc (m MsgSend) Type() string { return \"\" }\n",
        );
        fs.add_file(
            "types/b.go",
            "package types\n\nfunc (m MsgSend) GetSigners() {}\nfunc (m MsgSend) GetSignBytes() {}\nfunc (m *MsgSend) ValidateBasic() error { return nil }\n",
        );
        let dir = fs.root().join("types");

        assert_eq!(inspector(fs).matching_types(&dir).unwrap(), vec!["MsgSend"]);
    }

    #[test]
    fn test_unexported_types_are_ignored() {
        let fs = MockFileSystem::new();
        fs.add_file("types/msg.go", &MSG_SOURCE.replace("MsgCreatePost", "msgCreatePost"));
        let dir = fs.root().join("types");

        assert!(matches!(
            inspector(fs).matching_types(&dir),
            Err(InspectError::NoModule(_))
        ));
    }

    #[test]
    fn test_test_files_are_ignored() {
        let fs = MockFileSystem::new();
        fs.add_file("types/msg_test.go", MSG_SOURCE);
        let dir = fs.root().join("types");

        assert!(matches!(
            inspector(fs).matching_types(&dir),
            Err(InspectError::NoModule(_))
        ));
    }

    #[test]
    fn test_missing_directory_is_no_module() {
        let fs = MockFileSystem::new();
        let dir = fs.root().join("x/absent/types");
        assert!(matches!(
            inspector(fs).matching_types(&dir),
            Err(InspectError::NoModule(_))
        ));
    }

    #[test]
    fn test_build_ignored_generator_is_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("types/a.go", MSG_SOURCE);
        fs.add_file(
            "types/gen.go",
            "//go:build ignore\n// +build ignore\n\npackage main\n\nfunc main() {}\n",
        );
        let dir = fs.root().join("types");

        assert_eq!(inspector(fs).matching_types(&dir).unwrap(), vec!["MsgCreatePost"]);
    }

    #[test]
    fn test_build_constraint_detection() {
        assert!(is_build_ignored("//go:build ignore\n\npackage main\n"));
        assert!(is_build_ignored("// +build linux,ignore\n\npackage main\n"));
        assert!(!is_build_ignored("//go:build !ignore\n\npackage types\n"));
        assert!(!is_build_ignored("package types\n\n//go:build ignore\n"));
    }

    #[test]
    fn test_mixed_packages_is_fatal() {
        let fs = MockFileSystem::new();
        fs.add_file("types/a.go", MSG_SOURCE);
        fs.add_file("types/b.go", "package other\n");
        let dir = fs.root().join("types");

        match inspector(fs).matching_types(&dir) {
            Err(InspectError::MixedPackages { packages, .. }) => {
                assert_eq!(packages, vec!["other", "types"]);
            }
            other => panic!("expected MixedPackages, got {:?}", other),
        }
    }
}
