use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Discovers SDK modules in a Go project and generates their clients
#[derive(Parser, Debug)]
#[command(
    name = "modgen",
    about = "Discover SDK modules and generate their clients",
    version,
    long_about = "modgen classifies a project's protobuf packages into modules by inspecting \
                  the Go types that implement them, then generates Go bindings, TypeScript \
                  clients, state-store wrappers and a root loader."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "List the modules discovered in a project",
        long_about = "Reads go.mod and the project's protobuf packages and prints the modules \
                      found, with their messages, queries and types.\n\n\
                      Examples:\n  \
                      modgen discover\n  \
                      modgen discover /path/to/chain --format json"
    )]
    Discover(DiscoverArgs),

    #[command(
        about = "Generate bindings and clients",
        long_about = "Runs the generation pipeline. Go bindings are generated first when \
                      --go-module is set; TypeScript clients follow when --js-out or \
                      --vuex-root is set.\n\n\
                      Examples:\n  \
                      modgen generate --go-module github.com/alice/planet\n  \
                      modgen generate --vuex-root vue/src/store/generated --third-party"
    )]
    Generate(GenerateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DiscoverArgs {
    #[arg(value_name = "PATH", help = "Project root (defaults to current directory)")]
    pub project_path: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,

    #[arg(short = 'o', long, value_name = "FILE", help = "Write output to file instead of stdout")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(value_name = "PATH", help = "Project root (defaults to current directory)")]
    pub project_path: Option<PathBuf>,

    #[arg(long, value_name = "DIR", default_value = "proto", help = "Schema directory, relative to the project")]
    pub proto_dir: PathBuf,

    #[arg(long, value_name = "IMPORT", help = "Generate Go bindings for this module path")]
    pub go_module: Option<String>,

    #[arg(long, value_name = "DIR", help = "Root directory for generated TypeScript clients")]
    pub js_out: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Generate state-store wrappers and a loader under this root")]
    pub vuex_root: Option<PathBuf>,

    #[arg(long, help = "Also generate clients for modules of Go dependencies")]
    pub third_party: bool,

    #[arg(short = 'I', long = "include", value_name = "DIR", help = "Extra schema search path, relative to each source root")]
    pub include: Vec<PathBuf>,

    #[arg(long, value_name = "SECONDS", help = "Give up at the next stage boundary after this long")]
    pub timeout: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_discover_args() {
        let args = CliArgs::parse_from(["modgen", "discover"]);
        match args.command {
            Commands::Discover(discover) => {
                assert_eq!(discover.format, OutputFormatArg::Human);
                assert!(discover.project_path.is_none());
                assert!(discover.output.is_none());
            }
            _ => panic!("Expected Discover command"),
        }
    }

    #[test]
    fn test_generate_with_options() {
        let args = CliArgs::parse_from([
            "modgen",
            "generate",
            "/tmp/chain",
            "--go-module",
            "github.com/alice/planet",
            "--vuex-root",
            "vue/src/store",
            "--third-party",
            "-I",
            "third_party/proto",
            "--timeout",
            "300",
        ]);

        match args.command {
            Commands::Generate(generate) => {
                assert_eq!(generate.project_path, Some(PathBuf::from("/tmp/chain")));
                assert_eq!(generate.proto_dir, PathBuf::from("proto"));
                assert_eq!(generate.go_module.as_deref(), Some("github.com/alice/planet"));
                assert_eq!(generate.vuex_root, Some(PathBuf::from("vue/src/store")));
                assert!(generate.third_party);
                assert_eq!(generate.include, vec![PathBuf::from("third_party/proto")]);
                assert_eq!(generate.timeout, Some(300));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["modgen", "-v", "discover"]);
        assert!(args.verbose);
        let args = CliArgs::parse_from(["modgen", "--log-level", "debug", "discover"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["modgen", "-v", "-q", "discover"]).is_err());
    }
}
