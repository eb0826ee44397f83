//! Manual dependency edits.
//!
//! Edits are stored separately from the built map and replayed on every
//! rebuild. An added edge that would close a cycle is refused.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use super::common::CommandContext;

/// Add a manual dependency edge.
#[derive(Args, Debug)]
pub struct AddDepCommand {
    /// Plugin that needs the parent
    child: String,

    /// Plugin that must be loaded for the child
    parent: String,
}

impl AddDepCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        if !manager.add_custom_dependency(&self.child, &self.parent)? {
            bail!(
                "Refused dependency {} -> {}: slugs must be valid and distinct, and the edge must not create a cycle",
                self.child,
                self.parent
            );
        }
        println!("{} Added dependency {} -> {}", "✓".green(), self.child.bold(), self.parent.bold());
        Ok(())
    }
}

/// Remove a dependency edge.
#[derive(Args, Debug)]
pub struct RemoveDepCommand {
    /// Dependent plugin
    child: String,

    /// Plugin it currently depends on
    parent: String,
}

impl RemoveDepCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut manager = ctx.manager();
        if !manager.remove_custom_dependency(&self.child, &self.parent)? {
            bail!("No dependency {} -> {} in the map", self.child, self.parent);
        }
        println!("{} Removed dependency {} -> {}", "✓".green(), self.child.bold(), self.parent.bold());
        Ok(())
    }
}
