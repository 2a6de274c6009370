//! Schema Package Index: parsed protobuf packages, read-only input to discovery.

mod proto;

pub use proto::ProtoPackageIndex;

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read schema file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to walk schema tree at {root}: {message}")]
    Walk { root: PathBuf, message: String },
    #[error("Malformed schema file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// One HTTP rule of a `google.api.http` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBinding {
    pub method: String,
    pub path: String,
}

/// REST-binding metadata of an RPC method. Opaque to discovery; the
/// templates use it to build query parameter lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpAnnotations {
    pub bindings: Vec<HttpBinding>,
    /// Path parameters of the primary binding, in order of appearance.
    pub url_params: Vec<String>,
}

impl HttpAnnotations {
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcMethod {
    pub name: String,
    pub request_type: String,
    pub return_type: String,
    pub http_annotations: HttpAnnotations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub rpc_methods: Vec<RpcMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMessage {
    pub name: String,
    pub file_path: PathBuf,
}

/// A protobuf package as found in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaPackage {
    /// Dotted package name, e.g. `alice.planet.blog`.
    pub name: String,
    /// Directory holding the package's schema files.
    pub path: PathBuf,
    /// Go import path from `option go_package`.
    pub import_path: String,
    pub files: Vec<PathBuf>,
    pub messages: Vec<SchemaMessage>,
    pub services: Vec<Service>,
}

impl SchemaPackage {
    pub fn message_by_name(&self, name: &str) -> Option<&SchemaMessage> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Number of RPC methods across every service.
    pub fn rpc_count(&self) -> usize {
        self.services.iter().map(|s| s.rpc_methods.len()).sum()
    }
}

/// Enumerates the schema packages reachable from a source root.
pub trait PackageIndex: Send + Sync {
    fn packages(&self, root: &Path) -> Result<Vec<SchemaPackage>, SchemaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_by_name_and_rpc_count() {
        let pkg = SchemaPackage {
            name: "alice.planet.blog".to_string(),
            path: PathBuf::from("proto/blog"),
            import_path: "github.com/alice/planet/x/blog/types".to_string(),
            files: vec![PathBuf::from("proto/blog/tx.proto")],
            messages: vec![SchemaMessage {
                name: "MsgCreatePost".to_string(),
                file_path: PathBuf::from("proto/blog/tx.proto"),
            }],
            services: vec![
                Service {
                    name: "Msg".to_string(),
                    rpc_methods: vec![],
                },
                Service {
                    name: "Query".to_string(),
                    rpc_methods: vec![RpcMethod {
                        name: "Post".to_string(),
                        request_type: "QueryGetPostRequest".to_string(),
                        return_type: "QueryGetPostResponse".to_string(),
                        http_annotations: HttpAnnotations::default(),
                    }],
                },
            ],
        };

        assert!(pkg.message_by_name("MsgCreatePost").is_some());
        assert!(pkg.message_by_name("Missing").is_none());
        assert_eq!(pkg.rpc_count(), 1);
    }
}
