//! modgen - SDK module discovery and client generation
//!
//! Classifies a Go project's protobuf packages into modules and drives an
//! external toolchain to generate Go bindings, TypeScript clients, store
//! wrappers and a root loader for them.
//!
//! # Core Concepts
//!
//! - **Schema packages**: protobuf packages indexed from the source tree
//! - **Modules**: packages whose Go types implement the command-message
//!   method set, split into Msgs, Queries and Types
//! - **Generation**: native bindings first, then one concurrent client task
//!   per module, then the store loader
//!
//! # Example Usage
//!
//! ```no_run
//! use modgen::{Discoverer, GenerateOptions, Generator, ModgenConfig};
//! use std::path::{Path, PathBuf};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let modules = Discoverer::with_defaults().discover(Path::new("/src/planet"))?;
//! println!("{} modules", modules.len());
//!
//! let options = GenerateOptions::new()
//!     .with_native_binding_generation("github.com/alice/planet")
//!     .with_web_client_generation(false, |m| PathBuf::from("/src/planet/vue").join(&m.name));
//! Generator::new(ModgenConfig::default())
//!     .generate(Path::new("/src/planet"), Path::new("proto"), options, CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod codegen;
pub mod config;
pub mod discovery;
pub mod fs;
pub mod manifest;
pub mod schema;
pub mod tools;
pub mod util;

pub use codegen::{GenerateError, GenerateOptions, Generator};
pub use config::{ConfigError, ModgenConfig};
pub use discovery::{Discoverer, DiscoveryError, Module, Msg, Query, Type};
pub use manifest::{GoModule, ManifestError, ModuleCache};
pub use schema::{PackageIndex, ProtoPackageIndex, SchemaPackage};
pub use tools::{ExternalTool, ToolError, ToolOutput, Toolchain};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "modgen");
    }
}
