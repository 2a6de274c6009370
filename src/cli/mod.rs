pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, DiscoverArgs, GenerateArgs};
pub use output::{OutputFormat, OutputFormatter};
