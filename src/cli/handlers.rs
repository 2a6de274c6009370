//! Command handlers. Each returns the process exit code.

use super::commands::{DiscoverArgs, GenerateArgs};
use super::output::OutputFormatter;
use crate::codegen::{GenerateOptions, Generator};
use crate::config::ModgenConfig;
use crate::discovery::{Discoverer, Module};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub async fn handle_discover(args: &DiscoverArgs) -> i32 {
    exit_code(run_discover(args).await)
}

pub async fn handle_generate(args: &GenerateArgs) -> i32 {
    exit_code(run_generate(args).await)
}

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn resolve_project_path(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => env::current_dir().context("Failed to read current directory")?,
    };
    path.canonicalize()
        .with_context(|| format!("Project path {} does not exist", path.display()))
}

/// Places each module at `<root>/<package name with dots as slashes>/module`.
pub fn module_output_resolver(root: PathBuf) -> impl Fn(&Module) -> PathBuf + Send + Sync + 'static {
    move |module: &Module| {
        let mut dir = root.clone();
        for segment in module.package_name().split('.') {
            dir.push(segment);
        }
        dir.join("module")
    }
}

async fn run_discover(args: &DiscoverArgs) -> Result<()> {
    let path = resolve_project_path(args.project_path.as_deref())?;
    let discoverer = Discoverer::with_defaults();

    let root = path.clone();
    let modules = tokio::task::spawn_blocking(move || discoverer.discover(&root))
        .await
        .context("Discovery task panicked")?
        .with_context(|| format!("Module discovery failed for {}", path.display()))?;

    let output = OutputFormatter::new(args.format.into()).format_modules(&modules)?;
    match &args.output {
        Some(file) => {
            std::fs::write(file, output)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            info!(file = %file.display(), "Wrote discovery output");
        }
        None => println!("{}", output),
    }
    Ok(())
}

fn build_options(args: &GenerateArgs, project: &Path) -> GenerateOptions {
    let mut options = GenerateOptions::new().with_include_dirs(args.include.iter().cloned());

    if let Some(go_module) = &args.go_module {
        options = options.with_native_binding_generation(go_module.clone());
    }

    let absolute = |p: &PathBuf| if p.is_absolute() { p.clone() } else { project.join(p) };
    let js_root = args.js_out.as_ref().or(args.vuex_root.as_ref()).map(absolute);
    if let Some(js_root) = js_root {
        let resolver = module_output_resolver(js_root);
        options = match args.vuex_root.as_ref().map(absolute) {
            Some(store_root) => {
                options.with_state_store_generation(args.third_party, resolver, store_root)
            }
            None => options.with_web_client_generation(args.third_party, resolver),
        };
    }

    if let Some(secs) = args.timeout {
        options = options.with_deadline(Instant::now() + Duration::from_secs(secs));
    }
    options
}

async fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = ModgenConfig::default();
    config.validate().context("Invalid configuration")?;

    let path = resolve_project_path(args.project_path.as_deref())?;
    let options = build_options(args, &path);
    if options.is_noop() {
        warn!("Nothing to generate: pass --go-module, --js-out or --vuex-root");
        return Ok(());
    }

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling at the next stage boundary");
            interrupt.cancel();
        }
    });

    Generator::new(config)
        .generate(&path, &args.proto_dir, options, token)
        .await
        .with_context(|| format!("Code generation failed for {}", path.display()))?;

    info!(project = %path.display(), "Generation finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};
    use crate::schema::SchemaPackage;
    use clap::Parser;
    use std::sync::Arc;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["modgen", "generate"];
        full.extend_from_slice(argv);
        match CliArgs::parse_from(full).command {
            Commands::Generate(args) => args,
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_module_output_resolver() {
        let module = Module {
            name: "blog".to_string(),
            package: Arc::new(SchemaPackage {
                name: "alice.planet.blog".to_string(),
                path: PathBuf::from("/app/proto/blog"),
                import_path: String::new(),
                files: vec![],
                messages: vec![],
                services: vec![],
            }),
            msgs: vec![],
            queries: vec![],
            types: vec![],
        };
        let resolve = module_output_resolver(PathBuf::from("/out"));
        assert_eq!(resolve(&module), PathBuf::from("/out/alice/planet/blog/module"));
    }

    #[test]
    fn test_build_options_without_modes_is_noop() {
        let options = build_options(&generate_args(&[]), Path::new("/app"));
        assert!(options.is_noop());
    }

    #[test]
    fn test_build_options_resolves_store_root_against_project() {
        let options = build_options(
            &generate_args(&["--vuex-root", "vue/src/store"]),
            Path::new("/app"),
        );
        assert_eq!(options.store_root(), Some(Path::new("/app/vue/src/store")));
    }

    #[test]
    fn test_build_options_native_only() {
        let options = build_options(
            &generate_args(&["--go-module", "github.com/alice/planet"]),
            Path::new("/app"),
        );
        assert_eq!(options.native_import_path(), Some("github.com/alice/planet"));
        assert!(options.store_root().is_none());
    }
}
