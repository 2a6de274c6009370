//! Output formatting for discovered modules

use crate::discovery::Module;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_modules(&self, modules: &[Module]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(modules)
                .context("Failed to serialize modules to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(modules).context("Failed to serialize modules to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(modules)),
        }
    }

    fn format_human(&self, modules: &[Module]) -> String {
        let mut output = format!("Discovered {} module(s)\n", modules.len());

        for module in modules {
            output.push_str(&format!("\n{} ({})\n", module.name, module.package_name()));

            let msgs: Vec<&str> = module.msgs.iter().map(|m| m.name.as_str()).collect();
            let queries: Vec<String> = module
                .queries
                .iter()
                .map(|q| format!("{} ({})", q.name, q.full_name))
                .collect();
            let types: Vec<&str> = module.types.iter().map(|t| t.name.as_str()).collect();

            output.push_str(&format!("\u{251C}\u{2500} Msgs:    {}\n", list_or_none(&msgs)));
            output.push_str(&format!("\u{251C}\u{2500} Queries: {}\n", list_or_none(&queries)));
            output.push_str(&format!("\u{2514}\u{2500} Types:   {}\n", list_or_none(&types)));
        }

        output
    }
}

fn list_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
