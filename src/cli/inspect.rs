//! Per-plugin diagnostics.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::OutputFormat;
use super::common::{CommandContext, print_json, similar_slugs};
use super::map::print_record;
use crate::core::SlimError;
use crate::slug::{get_plugin_slug, is_valid_slug};

/// Show the slug derived from a plugin file identifier.
#[derive(Args, Debug)]
pub struct SlugCommand {
    /// Plugin file identifier, e.g. `elementor/elementor.php`
    path: String,
}

impl SlugCommand {
    pub fn execute(&self, format: OutputFormat) -> Result<()> {
        let slug = get_plugin_slug(&self.path);
        let valid = is_valid_slug(&slug);

        if format == OutputFormat::Json {
            return print_json(&json!({ "path": self.path, "slug": slug, "valid": valid }));
        }
        if !valid {
            return Err(SlimError::InvalidSlug {
                slug,
            }
            .into());
        }
        println!("{slug}");
        Ok(())
    }
}

/// Show detection evidence for one plugin.
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Plugin slug or file identifier
    plugin: String,
}

impl InspectCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        let report = match manager.inspect_plugin(&self.plugin) {
            Ok(report) => report,
            Err(e) => {
                if let Ok(active) = manager.active_slugs() {
                    let suggestions = similar_slugs(&self.plugin, active.iter().map(String::as_str));
                    if !suggestions.is_empty() {
                        eprintln!("Did you mean: {}?", suggestions.join(", "));
                    }
                }
                return Err(e);
            }
        };

        if ctx.json() {
            return print_json(&report);
        }

        println!("{} {}", "Plugin:".bold(), report.plugin);
        println!("{} {}", "Slug:".bold(), report.slug);
        if let Some(declared) = &report.declared {
            println!("{} {}", "Declared:".bold(), display_list(declared));
        }

        println!("\n{}", "Evidence:".bold());
        if report.evidence.is_empty() {
            println!("  {}", "none".bright_black());
        }
        for (source, parents) in &report.evidence {
            println!("  {:<10} {}", source.as_str(), display_list(parents));
        }

        println!("\n{}", "Map record:".bold());
        match &report.record {
            Some(record) => print_record(&report.slug, record),
            None => println!("  {}", "no relationships".bright_black()),
        }
        Ok(())
    }
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() { "-".to_string() } else { items.join(", ") }
}
