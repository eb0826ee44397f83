//! Resolve a seed set against the dependency map.
//!
//! ```bash
//! slimload resolve elementor-pro
//! slimload resolve woocommerce --reverse
//! slimload --format json resolve my-addon other-addon
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::collections::BTreeSet;

use super::common::{CommandContext, print_json, warn_unknown_slugs};
use crate::core::SlimError;
use crate::slug::is_valid_slug;

/// Resolve the plugins a seed set needs.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Seed slugs
    #[arg(required = true)]
    slugs: Vec<String>,

    /// Also include active plugins that depend on the resolved ones
    #[arg(short, long, conflicts_with = "no_reverse")]
    reverse: bool,

    /// Never include dependents, even if the configuration enables it
    #[arg(long)]
    no_reverse: bool,
}

impl ResolveCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        if let Some(bad) = self.slugs.iter().find(|s| !is_valid_slug(s)) {
            return Err(SlimError::InvalidSlug {
                slug: bad.clone(),
            }
            .into());
        }

        let include_reverse = !self.no_reverse && (self.reverse || ctx.config.include_reverse);
        let mut manager = ctx.manager();
        let snapshot = manager.snapshot()?;

        let mut known: BTreeSet<&str> = snapshot.cached.map.slugs().map(String::as_str).collect();
        known.extend(snapshot.active.iter().map(String::as_str));
        warn_unknown_slugs(&self.slugs, &known);

        let resolution = manager.resolve_in(&snapshot, self.slugs.iter().cloned(), include_reverse);

        if ctx.json() {
            return print_json(&resolution);
        }

        let seed: BTreeSet<&String> = self.slugs.iter().collect();
        for slug in &resolution.plugins {
            if seed.contains(slug) {
                println!("{}", slug.bold());
            } else {
                println!("{} {}", slug, "(dependency)".bright_black());
            }
        }
        if resolution.truncated {
            eprintln!(
                "{} stopped after {} iterations, result is partial",
                "warning:".yellow().bold(),
                resolution.iterations
            );
        }
        Ok(())
    }
}
