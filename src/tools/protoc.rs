//! Argument building for the schema compiler.

use std::path::{Path, PathBuf};

/// TypeScript bindings, written relative to the working directory.
pub const TS_PROTO_OUT: &str = "--ts_proto_out=.";
/// Merged OpenAPI v2 description (`apidocs.swagger.json`).
pub const OPENAPI_OUT: &str = "--openapiv2_out=logtostderr=true,allow_merge=true:.";
pub const OPENAPI_FILE: &str = "apidocs.swagger.json";
/// Go message types with the interface registry and gRPC services.
pub const GOCOSMOS_OUT: &str = "--gocosmos_out=plugins=interfacetype+grpc,Mgoogle/protobuf/any.proto=github.com/cosmos/cosmos-sdk/codec/types:.";
pub const GRPC_GATEWAY_OUT: &str = "--grpc-gateway_out=logtostderr=true:.";

/// Builder for one schema compiler command line.
#[derive(Debug, Clone, Default)]
pub struct ProtocArgs {
    includes: Vec<PathBuf>,
    plugins: Vec<(String, PathBuf)>,
    outputs: Vec<String>,
    files: Vec<PathBuf>,
}

impl ProtocArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn includes<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.includes
            .extend(dirs.into_iter().map(|d| d.as_ref().to_path_buf()));
        self
    }

    /// Registers a plugin binary. `name` is the full `protoc-gen-*` name.
    pub fn plugin(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.plugins.push((name.into(), path.into()));
        self
    }

    pub fn output(mut self, flag: impl Into<String>) -> Self {
        self.outputs.push(flag.into());
        self
    }

    pub fn files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.files
            .extend(files.into_iter().map(|f| f.as_ref().to_path_buf()));
        self
    }

    pub fn build(self) -> Vec<String> {
        let mut args = Vec::new();
        for dir in &self.includes {
            args.push("-I".to_string());
            args.push(dir.display().to_string());
        }
        for (name, path) in &self.plugins {
            args.push("--plugin".to_string());
            args.push(format!("{}={}", name, path.display()));
        }
        args.extend(self.outputs);
        args.extend(self.files.iter().map(|f| f.display().to_string()));
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_orders_includes_plugins_outputs_files() {
        let args = ProtocArgs::new()
            .includes(["/app/proto", "/sdk/proto"])
            .plugin("protoc-gen-ts_proto", "/bin/ts-proto")
            .output(TS_PROTO_OUT)
            .files(["/app/proto/blog/tx.proto"])
            .build();

        assert_eq!(
            args,
            vec![
                "-I",
                "/app/proto",
                "-I",
                "/sdk/proto",
                "--plugin",
                "protoc-gen-ts_proto=/bin/ts-proto",
                "--ts_proto_out=.",
                "/app/proto/blog/tx.proto",
            ]
        );
    }

    #[test]
    fn test_empty_builder_is_empty() {
        assert!(ProtocArgs::new().build().is_empty());
    }
}
