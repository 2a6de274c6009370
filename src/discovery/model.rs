use crate::schema::{HttpAnnotations, SchemaPackage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A discovered domain component: the command messages, queries and
/// auxiliary types of one schema package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Last dotted segment of the package name.
    pub name: String,
    #[serde(rename = "package")]
    pub package: Arc<SchemaPackage>,
    pub msgs: Vec<Msg>,
    pub queries: Vec<Query>,
    pub types: Vec<Type>,
}

impl Module {
    /// Full dotted package name.
    pub fn package_name(&self) -> &str {
        &self.package.name
    }

    /// Directory holding the package's schema files.
    pub fn schema_dir(&self) -> &Path {
        &self.package.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Msg {
    pub name: String,
    /// Package-qualified name, e.g. `alice.planet.blog.MsgCreatePost`.
    pub uri: String,
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub name: String,
    /// Service name and method name concatenated, e.g. `QueryBalance`.
    pub full_name: String,
    pub http_annotations: HttpAnnotations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Type {
    pub name: String,
    pub file_path: PathBuf,
}
