//! Configuration management for modgen
//!
//! Settings are loaded from environment variables with defaults and passed
//! explicitly into the generator; nothing here is global state.
//!
//! # Environment Variables
//!
//! - `MODGEN_PROTOC`: schema compiler program - default: "protoc"
//! - `MODGEN_TS_PROTO_PLUGIN`: TypeScript bindings plugin - default: "protoc-gen-ts_proto"
//! - `MODGEN_OPENAPI_CONVERTER`: OpenAPI to REST client converter - default: "swagger-typescript-api"
//! - `MODGEN_TSC`: TypeScript compiler used for validation - default: "tsc"
//! - `MODGEN_INCLUDE_DIRS`: global schema include directories, `:`-separated -
//!   default: "$HOME/local/include:$HOME/.local/include"
//! - `MODGEN_LOG_LEVEL`: Logging level - default: "info"
//! - `GOMODCACHE` / `GOPATH`: Go module cache location - default: "$HOME/go/pkg/mod"
//!
//! # Example
//!
//! ```no_run
//! use modgen::ModgenConfig;
//!
//! let config = ModgenConfig::default();
//! config.validate().expect("Invalid configuration");
//! ```

use crate::manifest::ModuleCache;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PROTOC: &str = "protoc";
const DEFAULT_TS_PROTO_PLUGIN: &str = "protoc-gen-ts_proto";
const DEFAULT_OPENAPI_CONVERTER: &str = "swagger-typescript-api";
const DEFAULT_TSC: &str = "tsc";
const DEFAULT_LOG_LEVEL: &str = "info";

const SDK_IMPORT_PATH: &str = "github.com/cosmos/cosmos-sdk";
const SDK_SCHEMA_DIRS: &[&str] = &["proto", "third_party/proto"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// A Go module that hosts schema directories needed as include paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDependency {
    pub import_path: String,
    /// Directories relative to the module root.
    pub schema_dirs: Vec<PathBuf>,
}

impl SchemaDependency {
    pub fn new(import_path: impl Into<String>, schema_dirs: &[&str]) -> Self {
        Self {
            import_path: import_path.into(),
            schema_dirs: schema_dirs.iter().map(PathBuf::from).collect(),
        }
    }
}

/// Main configuration structure for modgen
#[derive(Debug, Clone)]
pub struct ModgenConfig {
    pub protoc: PathBuf,

    /// Plugin passed to the schema compiler for TypeScript bindings
    pub ts_proto_plugin: PathBuf,

    pub openapi_converter: PathBuf,

    pub tsc: PathBuf,

    /// Include directories added to every schema compilation
    pub include_dirs: Vec<PathBuf>,

    pub module_cache: ModuleCache,

    /// Dependency modules whose schema directories are always included
    pub schema_dependencies: Vec<SchemaDependency>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn program(var: &str, default: &str) -> PathBuf {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn default_include_dirs() -> Vec<PathBuf> {
    match dirs::home_dir() {
        Some(home) => vec![home.join("local/include"), home.join(".local/include")],
        None => Vec::new(),
    }
}

impl Default for ModgenConfig {
    /// Loads `MODGEN_*` variables, falling back to defaults for missing values
    fn default() -> Self {
        let include_dirs = env::var_os("MODGEN_INCLUDE_DIRS")
            .map(|v| env::split_paths(&v).collect())
            .unwrap_or_else(default_include_dirs);

        let log_level = env::var("MODGEN_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            protoc: program("MODGEN_PROTOC", DEFAULT_PROTOC),
            ts_proto_plugin: program("MODGEN_TS_PROTO_PLUGIN", DEFAULT_TS_PROTO_PLUGIN),
            openapi_converter: program("MODGEN_OPENAPI_CONVERTER", DEFAULT_OPENAPI_CONVERTER),
            tsc: program("MODGEN_TSC", DEFAULT_TSC),
            include_dirs,
            module_cache: ModuleCache::from_env(),
            schema_dependencies: vec![SchemaDependency::new(SDK_IMPORT_PATH, SDK_SCHEMA_DIRS)],
            log_level,
        }
    }
}

impl ModgenConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for empty program names, schema dependencies
    /// without directories, or an unknown log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let programs = [
            ("protoc", &self.protoc),
            ("ts_proto_plugin", &self.ts_proto_plugin),
            ("openapi_converter", &self.openapi_converter),
            ("tsc", &self.tsc),
        ];
        for (field, value) in programs {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} program must not be empty",
                    field
                )));
            }
        }

        if let Some(dep) = self
            .schema_dependencies
            .iter()
            .find(|d| d.schema_dirs.is_empty())
        {
            return Err(ConfigError::ValidationFailed(format!(
                "Schema dependency {} has no schema directories",
                dep.import_path
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

impl fmt::Display for ModgenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Modgen Configuration:")?;
        writeln!(f, "  protoc: {}", self.protoc.display())?;
        writeln!(f, "  ts-proto plugin: {}", self.ts_proto_plugin.display())?;
        writeln!(f, "  OpenAPI converter: {}", self.openapi_converter.display())?;
        writeln!(f, "  tsc: {}", self.tsc.display())?;
        for dir in &self.include_dirs {
            writeln!(f, "  Include: {}", dir.display())?;
        }
        writeln!(f, "  Module cache: {}", self.module_cache.root().display())?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
