//! Module discovery: classifies a project's schema packages into modules.

mod capability;
mod inspector;
mod model;

pub use capability::{CapabilityMatcher, MethodNameMatcher, MSG_FINGERPRINT};
#[cfg(test)]
pub use inspector::MockSourceInspector;
pub use inspector::{GoSourceInspector, InspectError, SourceInspector};
pub use model::{Module, Msg, Query, Type};

use crate::fs::{FileSystem, RealFileSystem};
use crate::manifest::{GoModule, ManifestError};
use crate::schema::{PackageIndex, ProtoPackageIndex, SchemaError, SchemaPackage};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Package-level message that is never exposed as a Type.
pub const GENESIS_STATE: &str = "GenesisState";

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid dependency manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Failed to enumerate schema packages: {0}")]
    Schema(#[from] SchemaError),

    #[error("Source inspection failed: {0}")]
    Inspect(#[from] InspectError),
}

/// Converts schema packages and a project tree into [`Module`] records.
#[derive(Clone)]
pub struct Discoverer {
    fs: Arc<dyn FileSystem>,
    index: Arc<dyn PackageIndex>,
    inspector: Arc<dyn SourceInspector>,
}

impl Discoverer {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        index: Arc<dyn PackageIndex>,
        inspector: Arc<dyn SourceInspector>,
    ) -> Self {
        Self {
            fs,
            index,
            inspector,
        }
    }

    /// Discoverer over the real filesystem with the `.proto` index and the
    /// Go source inspector.
    pub fn with_defaults() -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());
        let index = ProtoPackageIndex::with_fs(fs.clone());
        let inspector = GoSourceInspector::new(fs.clone(), Arc::new(MethodNameMatcher));
        Self::new(fs, Arc::new(index), Arc::new(inspector))
    }

    /// Runs discovery against `source_root`. Sequential; any fatal error
    /// aborts with no partial results.
    pub fn discover(&self, source_root: &Path) -> Result<Vec<Module>, DiscoveryError> {
        let manifest = GoModule::parse_at(self.fs.as_ref(), source_root)?;
        let base_import_path = manifest.module_path.as_str();

        let packages = self.index.packages(source_root)?;
        let total = packages.len();

        let mut modules = Vec::new();
        for package in packages {
            let Some(relative) = package.import_path.strip_prefix(base_import_path) else {
                debug!(package = %package.name, import_path = %package.import_path, "Package outside project, skipping");
                continue;
            };

            let dir = source_root.join(relative.trim_start_matches('/'));
            let msg_names = match self.inspector.matching_types(&dir) {
                Ok(names) => names,
                Err(InspectError::NoModule(_)) => {
                    warn!(package = %package.name, dir = %dir.display(), "No module in package, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let module = classify(Arc::new(package), &msg_names);
            debug!(
                module = %module.name,
                msgs = module.msgs.len(),
                queries = module.queries.len(),
                types = module.types.len(),
                "Discovered module"
            );
            modules.push(module);
        }

        info!(
            root = %source_root.display(),
            packages = total,
            modules = modules.len(),
            "Discovery complete"
        );
        Ok(modules)
    }
}

fn is_rpc_type(package: &SchemaPackage, rpc_types: &HashSet<&str>, name: &str) -> bool {
    rpc_types.contains(name) || rpc_types.contains(format!("{}.{}", package.name, name).as_str())
}

/// Builds a module from a package and the names of its source types that
/// satisfy the command-message fingerprint.
pub fn classify(package: Arc<SchemaPackage>, msg_names: &[String]) -> Module {
    let msg_names: HashSet<&str> = msg_names.iter().map(String::as_str).collect();

    let msgs: Vec<Msg> = package
        .messages
        .iter()
        .filter(|m| msg_names.contains(m.name.as_str()))
        .map(|m| Msg {
            name: m.name.clone(),
            uri: format!("{}.{}", package.name, m.name),
            file_path: m.file_path.clone(),
        })
        .collect();

    let rpc_types: HashSet<&str> = package
        .services
        .iter()
        .flat_map(|s| s.rpc_methods.iter())
        .flat_map(|q| [q.request_type.as_str(), q.return_type.as_str()])
        .collect();

    let types = package
        .messages
        .iter()
        .filter(|m| m.name != GENESIS_STATE)
        .filter(|m| !msgs.iter().any(|msg| msg.name == m.name))
        .filter(|m| !is_rpc_type(&package, &rpc_types, &m.name))
        .map(|m| Type {
            name: m.name.clone(),
            file_path: m.file_path.clone(),
        })
        .collect();

    let mut queries = Vec::new();
    for service in &package.services {
        for method in &service.rpc_methods {
            let full_name = format!("{}{}", service.name, method.name);
            if package.message_by_name(&full_name).is_some() {
                debug!(package = %package.name, query = %full_name, "Query name collides with a message, dropping");
                continue;
            }
            queries.push(Query {
                name: method.name.clone(),
                full_name,
                http_annotations: method.http_annotations.clone(),
            });
        }
    }

    let name = package
        .name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_string();

    Module {
        name,
        package,
        msgs,
        queries,
        types,
    }
}
