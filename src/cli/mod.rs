//! Command-line interface for slimload.
//!
//! # Available Commands
//!
//! - `map` - Show the cached dependency map (building it on a miss)
//! - `build` - Build a fresh map and persist it
//! - `rebuild` - Drop the cache, rebuild and print statistics
//! - `resolve` - Expand a seed set of slugs to everything it needs
//! - `cycles` - List circular dependency pairs
//! - `add-dep` / `remove-dep` - Manual dependency edits
//! - `slug` - Derive the slug of a plugin file identifier
//! - `inspect` - Show per-source evidence for one plugin
//! - `invalidate` - Clear the cached map
//!
//! # Global Options
//!
//! - `--config <PATH>` - Configuration file (otherwise `SLIMLOAD_CONFIG` or
//!   `./slimload.toml`)
//! - `--format <text|json>` - Output format of listing commands
//! - `--verbose` / `--quiet` - Log level
//!
//! # Examples
//!
//! ```bash
//! slimload map
//! slimload resolve elementor-pro --reverse
//! slimload add-dep my-addon woocommerce
//! slimload --format json cycles
//! ```

mod common;
mod edit;
mod inspect;
mod map;
mod resolve;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::SlimConfig;
pub use common::CommandContext;

/// Output format of listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Coloured human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Main CLI structure for slimload.
#[derive(Parser)]
#[command(
    name = "slimload",
    about = "Resolve the minimal plugin set a request needs",
    version,
    author,
    long_about = "slimload builds a dependency graph of installed CMS plugins from headers, \
                  source scans, naming conventions and known ecosystems, detects cycles, \
                  and resolves seed sets against it."
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dependency map
    Map(map::MapCommand),

    /// Build a fresh dependency map and persist it
    Build(map::BuildCommand),

    /// Clear the cache, rebuild and show statistics
    Rebuild(map::RebuildCommand),

    /// Resolve the plugins a seed set needs
    Resolve(resolve::ResolveCommand),

    /// List circular dependencies
    Cycles(map::CyclesCommand),

    /// Add a manual dependency edge
    #[command(name = "add-dep")]
    AddDep(edit::AddDepCommand),

    /// Remove a dependency edge
    #[command(name = "remove-dep")]
    RemoveDep(edit::RemoveDepCommand),

    /// Show the slug derived from a plugin file identifier
    Slug(inspect::SlugCommand),

    /// Show detection evidence for one plugin
    Inspect(inspect::InspectCommand),

    /// Clear the cached dependency map
    Invalidate(map::InvalidateCommand),
}

impl Cli {
    /// Install logging, load configuration and run the command.
    pub fn execute(self) -> Result<()> {
        init_logging(self.verbose, self.quiet);

        // `slug` is a pure helper and works without any configuration
        if let Commands::Slug(cmd) = &self.command {
            return cmd.execute(self.format);
        }

        let config = SlimConfig::load(self.config.as_deref())?;
        let ctx = CommandContext::new(config, self.format);

        match self.command {
            Commands::Map(cmd) => cmd.execute(&ctx),
            Commands::Build(cmd) => cmd.execute(&ctx),
            Commands::Rebuild(cmd) => cmd.execute(&ctx),
            Commands::Resolve(cmd) => cmd.execute(&ctx),
            Commands::Cycles(cmd) => cmd.execute(&ctx),
            Commands::AddDep(cmd) => cmd.execute(&ctx),
            Commands::RemoveDep(cmd) => cmd.execute(&ctx),
            Commands::Slug(cmd) => cmd.execute(ctx.format),
            Commands::Inspect(cmd) => cmd.execute(&ctx),
            Commands::Invalidate(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Install the global tracing subscriber writing to stderr.
///
/// `--verbose` enables debug output for this crate, `--quiet` limits output
/// to errors, otherwise `RUST_LOG` applies with `info` as the fallback.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("slimload=debug,info")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
