//! Commands showing and maintaining the dependency map.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, print_json};
use crate::graph::{CircularPairSet, DependencyMap, DependencyRecord, detect_circular_dependencies};
use crate::manager::RebuildStats;

/// Show the dependency map.
#[derive(Args, Debug)]
pub struct MapCommand {
    /// Only show plugins that have relationships
    #[arg(long)]
    related: bool,
}

impl MapCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        let map = manager.get_dependency_map()?;

        if ctx.json() {
            return print_json(&map);
        }
        print_map(&map, self.related);
        Ok(())
    }
}

/// Build a fresh map without reading the cache.
#[derive(Args, Debug)]
pub struct BuildCommand {}

impl BuildCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        let map = manager.build_dependency_map()?;
        let circular = detect_circular_dependencies(&map);

        if ctx.json() {
            return print_json(&RebuildStats::from_map(&map, &circular));
        }
        println!(
            "{} Built dependency map: {} plugins, {} relationships, {} circular",
            "✓".green(),
            map.len(),
            map.relationship_count(),
            circular.len()
        );
        Ok(())
    }
}

/// Clear the cache, rebuild and show statistics.
#[derive(Args, Debug)]
pub struct RebuildCommand {}

impl RebuildCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        let stats = manager.rebuild_dependency_map()?;

        if ctx.json() {
            return print_json(&stats);
        }

        println!("{} Rebuilt dependency map", "✓".green());
        println!("  Plugins:        {}", stats.total_plugins);
        println!("  Relationships:  {}", stats.total_relationships);
        let circular = stats.circular_count.to_string();
        println!(
            "  Circular pairs: {}",
            if stats.circular_count > 0 { circular.yellow() } else { circular.normal() }
        );
        if !stats.by_source.is_empty() {
            println!("\n{}", "Records by source:".bold());
            for (source, count) in &stats.by_source {
                println!("  {:<10} {}", source.as_str(), count);
            }
        }
        if !stats.by_evidence.is_empty() {
            println!("\n{}", "Relationships by evidence:".bold());
            for (source, count) in &stats.by_evidence {
                println!("  {:<10} {}", source.as_str(), count);
            }
        }
        Ok(())
    }
}

/// List circular dependencies.
#[derive(Args, Debug)]
pub struct CyclesCommand {}

impl CyclesCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        let circular = manager.circular_dependencies()?;

        if ctx.json() {
            return print_json(&circular);
        }
        print_cycles(&circular);
        Ok(())
    }
}

/// Clear the cached map; the next command rebuilds it.
#[derive(Args, Debug)]
pub struct InvalidateCommand {}

impl InvalidateCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        manager.invalidate();
        println!("{} Dependency map cache cleared", "✓".green());
        Ok(())
    }
}

fn print_cycles(circular: &CircularPairSet) {
    if circular.is_empty() {
        println!("{}", "No circular dependencies found".green());
        return;
    }
    println!("{}", format!("Found {} circular dependencies:", circular.len()).yellow().bold());
    for pair in circular {
        println!("  {} {} {}", pair.first(), "<->".yellow(), pair.second());
    }
}

fn print_map(map: &DependencyMap, related_only: bool) {
    if map.is_empty() {
        println!("No plugin relationships detected.");
        return;
    }

    for (slug, record) in map.iter() {
        if related_only && record.depends_on.is_empty() && record.plugins_depending.is_empty() {
            continue;
        }
        print_record(slug, record);
    }

    println!(
        "\n{} plugins, {} relationships",
        map.len().to_string().bold(),
        map.relationship_count().to_string().bold()
    );
}

pub(super) fn print_record(slug: &str, record: &DependencyRecord) {
    let mut line = format!("{} {}", slug.bold(), format!("({})", record.source).bright_black());
    if let Some(partner) = &record.circular_with {
        line.push_str(&format!(" {}", format!("[circular with {partner}]").yellow()));
    }
    println!("{line}");

    if !record.depends_on.is_empty() {
        let parents: Vec<String> = record
            .depends_on
            .iter()
            .map(|parent| match record.evidence.get(parent) {
                Some(source) if *source != record.source => {
                    format!("{} {}", parent, format!("[{source}]").bright_black())
                }
                _ => parent.clone(),
            })
            .collect();
        println!("  {} {}", "depends on:".cyan(), parents.join(", "));
    }
    if !record.plugins_depending.is_empty() {
        let children: Vec<&str> = record.plugins_depending.iter().map(String::as_str).collect();
        println!("  {} {}", "required by:".cyan(), children.join(", "));
    }
}
