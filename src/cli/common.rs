//! Shared plumbing for CLI commands.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;
use strsim::levenshtein;

use super::OutputFormat;
use crate::cache::FileStore;
use crate::config::SlimConfig;
use crate::host::FsPluginHost;
use crate::manager::DependencyManager;

/// Manager type used by every command.
pub(crate) type CliManager = DependencyManager<FsPluginHost, FileStore>;

/// Maximum edit distance, in percent of the target length, for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 40;

/// Configuration and output settings shared by commands.
#[derive(Debug)]
pub struct CommandContext {
    /// Loaded configuration.
    pub config: SlimConfig,
    /// Requested output format.
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a context.
    pub fn new(config: SlimConfig, format: OutputFormat) -> Self {
        Self {
            config,
            format,
        }
    }

    /// Open a manager over the configured plugins directory and state store.
    ///
    /// Data cached by another engine version is discarded first.
    pub(crate) fn manager(&self) -> CliManager {
        let mut manager = DependencyManager::new(self.config.plugin_host(), self.config.store())
            .with_hooks(self.config.hooks())
            .with_max_iterations(self.config.max_iterations);
        if let Some(authority) = self.config.authority() {
            manager = manager.with_authority(authority);
        }
        manager.check_version();
        manager
    }

    /// True when JSON output was requested.
    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

/// Known slugs closest to `target`, closest first, at most three.
pub(crate) fn similar_slugs<'a>(target: &str, known: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let limit = (target.len() * SIMILARITY_THRESHOLD_PERCENT / 100).max(1);
    let mut scored: Vec<(usize, &str)> = known
        .into_iter()
        .map(|slug| (levenshtein(target, slug), slug))
        .filter(|(distance, _)| *distance > 0 && *distance <= limit)
        .collect();
    scored.sort();
    scored.into_iter().take(3).map(|(_, slug)| slug.to_string()).collect()
}

/// Warn on stderr about slugs that are neither active nor in the map.
pub(crate) fn warn_unknown_slugs<'a>(
    requested: impl IntoIterator<Item = &'a String>,
    known: &BTreeSet<&str>,
) {
    for slug in requested {
        if known.contains(slug.as_str()) {
            continue;
        }
        let suggestions = similar_slugs(slug, known.iter().copied());
        if suggestions.is_empty() {
            eprintln!("{} Unknown plugin '{}'", "warning:".yellow().bold(), slug);
        } else {
            eprintln!(
                "{} Unknown plugin '{}'. Did you mean: {}?",
                "warning:".yellow().bold(),
                slug,
                suggestions.join(", ")
            );
        }
    }
}
