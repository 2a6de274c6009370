//! Shared fixtures: throwaway Go projects with protobuf packages, and fake
//! external tools that stand in for protoc, the OpenAPI converter and tsc.

#![allow(dead_code)]

use async_trait::async_trait;
use modgen::tools::protoc::{GOCOSMOS_OUT, OPENAPI_FILE, OPENAPI_OUT, TS_PROTO_OUT};
use modgen::{ExternalTool, ToolError, ToolOutput, Toolchain};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const MODULE_PATH: &str = "github.com/a/b";

/// A Go project rooted in a temporary directory.
pub struct Project {
    dir: TempDir,
    module_path: String,
}

impl Project {
    pub fn new() -> Self {
        Self::with_module_path(MODULE_PATH)
    }

    pub fn with_module_path(module_path: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("go.mod"),
            format!("module {}\n\ngo 1.21\n", module_path),
        )
        .expect("Failed to write go.mod");
        Self {
            dir,
            module_path: module_path.to_string(),
        }
    }

    /// Requires `path` and replaces it with the local directory `dir`.
    pub fn require_local(&self, path: &str, version: &str, dir: &Path) {
        let manifest = self.dir.path().join("go.mod");
        let mut content = fs::read_to_string(&manifest).expect("Failed to read go.mod");
        content.push_str(&format!(
            "\nrequire {path} {version}\n\nreplace {path} => {}\n",
            dir.display()
        ));
        fs::write(&manifest, content).expect("Failed to write go.mod");
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Adds `proto/<name>/tx.proto` for package `alice.planet.<name>`.
    pub fn add_blog_package(&self, name: &str) -> PathBuf {
        self.add_package("alice.planet", name)
    }

    /// Adds `proto/<name>/tx.proto` for package `<prefix>.<name>`, with its
    /// Go package inside this project's module.
    pub fn add_package(&self, prefix: &str, name: &str) -> PathBuf {
        self.write(
            &format!("proto/{}/tx.proto", name),
            &package_proto(prefix, &self.module_path, name),
        )
    }

    /// Adds the Go command-message sources of module `name`.
    pub fn add_msg_sources(&self, name: &str, msgs: &[&str]) -> PathBuf {
        self.write(&format!("x/{}/types/msgs.go", name), &msg_source(msgs))
    }
}

/// A package with one command message, one query, a stored type, the
/// genesis state and RPC request/response types.
pub fn blog_proto(name: &str) -> String {
    package_proto("alice.planet", MODULE_PATH, name)
}

pub fn package_proto(prefix: &str, module: &str, name: &str) -> String {
    format!(
        r#"syntax = "proto3";
package {prefix}.{name};

import "google/api/annotations.proto";

option go_package = "{module}/x/{name}/types";

message GenesisState {{
  repeated Post postList = 1;
}}

message Post {{
  uint64 id = 1;
  string title = 2;
}}

message MsgCreatePost {{
  string creator = 1;
  string title = 2;
}}

message MsgCreatePostResponse {{
  uint64 id = 1;
}}

message QueryGetPostRequest {{
  uint64 id = 1;
}}

message QueryGetPostResponse {{
  Post post = 1;
}}

service Msg {{
  rpc CreatePost(MsgCreatePost) returns (MsgCreatePostResponse);
}}

service Query {{
  rpc Post(QueryGetPostRequest) returns (QueryGetPostResponse) {{
    option (google.api.http).get = "/{name}/post/{{id}}";
  }}
}}
"#,
        prefix = prefix,
        name = name,
        module = module,
    )
}

/// Go source declaring the full command-message method set for each type.
pub fn msg_source(msgs: &[&str]) -> String {
    let mut src = String::from("package types\n\nimport sdk \"github.com/cosmos/cosmos-sdk/types\"\n");
    for msg in msgs {
        src.push_str(&format!(
            r#"
func (msg *{msg}) Route() string {{ return RouterKey }}
func (msg *{msg}) Type() string {{ return "{msg}" }}
func (msg *{msg}) GetSigners() []sdk.AccAddress {{ return nil }}
func (msg *{msg}) GetSignBytes() []byte {{ return nil }}
func (msg *{msg}) ValidateBasic() error {{ return nil }}
"#,
            msg = msg
        ));
    }
    src
}

/// Every file below `root` with its content, keyed by relative path.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read_to_string(e.path()).unwrap_or_default())
        })
        .collect()
}

fn proto_files(args: &[String]) -> Vec<PathBuf> {
    args.iter()
        .filter(|a| a.ends_with(".proto"))
        .map(PathBuf::from)
        .collect()
}

/// Schema compiler fake. Emits a stub file per requested output kind and
/// records every call.
#[derive(Default)]
pub struct FakeProtoc {
    pub calls: Mutex<Vec<Vec<String>>>,
    /// Working directories of the OpenAPI compilations.
    pub openapi_dirs: Mutex<Vec<PathBuf>>,
    /// Module directory names whose binding compilation fails.
    pub failing: Vec<String>,
}

impl FakeProtoc {
    pub fn failing(modules: &[&str]) -> Self {
        Self {
            failing: modules.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls_with(&self, flag: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args.iter().any(|a| a == flag))
            .count()
    }
}

#[async_trait]
impl ExternalTool for FakeProtoc {
    fn name(&self) -> &str {
        "protoc"
    }

    async fn invoke(&self, args: &[String], work_dir: &Path) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(args.to_vec());
        let files = proto_files(args);
        let has = |flag: &str| args.iter().any(|a| a == flag);

        if has(TS_PROTO_OUT) {
            for file in &files {
                let module = file
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if self.failing.contains(&module) {
                    return Err(ToolError::Failed {
                        tool: "protoc".to_string(),
                        status: "exit status: 1".to_string(),
                        stderr: format!("{}: syntax error", file.display()),
                    });
                }
                let stem = file.file_stem().unwrap().to_string_lossy();
                fs::write(work_dir.join(format!("{}.ts", stem)), "export {};\n").unwrap();
            }
        }

        if has(OPENAPI_OUT) {
            self.openapi_dirs.lock().unwrap().push(work_dir.to_path_buf());
            fs::write(work_dir.join(OPENAPI_FILE), "{\"swagger\": \"2.0\"}\n").unwrap();
        }

        if has(GOCOSMOS_OUT) {
            for file in &files {
                let module = file.parent().and_then(Path::file_name).unwrap();
                let types = work_dir
                    .join(MODULE_PATH)
                    .join("x")
                    .join(module)
                    .join("types");
                fs::create_dir_all(&types).unwrap();
                fs::write(types.join("msgs.go"), msg_source(&["MsgCreatePost"])).unwrap();
            }
        }

        Ok(ToolOutput::default())
    }
}

/// Converter fake: writes the requested output file, or fails every call.
#[derive(Default)]
pub struct FakeConverter {
    pub calls: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl FakeConverter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ExternalTool for FakeConverter {
    fn name(&self) -> &str {
        "openapi-converter"
    }

    async fn invoke(&self, args: &[String], _work_dir: &Path) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(args.to_vec());
        if self.fail {
            return Err(ToolError::Failed {
                tool: "openapi-converter".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "invalid swagger document".to_string(),
            });
        }
        let value = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
                .unwrap()
        };
        let out = PathBuf::from(value("--output")).join(value("--name"));
        fs::write(out, "export class Api {}\n").unwrap();
        Ok(ToolOutput::default())
    }
}

/// Validator fake: keeps the content of every tsconfig it is given.
#[derive(Default)]
pub struct FakeTsc {
    pub configs: Mutex<Vec<serde_json::Value>>,
}

impl FakeTsc {
    pub fn includes(&self) -> Vec<String> {
        self.configs
            .lock()
            .unwrap()
            .iter()
            .flat_map(|c| c["include"].as_array().cloned().unwrap_or_default())
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ExternalTool for FakeTsc {
    fn name(&self) -> &str {
        "tsc"
    }

    async fn invoke(&self, args: &[String], _work_dir: &Path) -> Result<ToolOutput, ToolError> {
        let config = fs::read_to_string(&args[1]).unwrap();
        self.configs
            .lock()
            .unwrap()
            .push(serde_json::from_str(&config).unwrap());
        Ok(ToolOutput::default())
    }
}

/// The three fakes, shared so a test can inspect them afterwards.
pub struct FakeTools {
    pub protoc: Arc<FakeProtoc>,
    pub converter: Arc<FakeConverter>,
    pub tsc: Arc<FakeTsc>,
}

impl FakeTools {
    pub fn new(protoc: FakeProtoc) -> Self {
        Self {
            protoc: Arc::new(protoc),
            converter: Arc::new(FakeConverter::default()),
            tsc: Arc::new(FakeTsc::default()),
        }
    }

    pub fn with_converter(mut self, converter: FakeConverter) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            protoc: self.protoc.clone(),
            converter: self.converter.clone(),
            validator: self.tsc.clone(),
            ts_proto_plugin: PathBuf::from("/usr/local/bin/protoc-gen-ts_proto"),
        }
    }
}
