//! Configuration for the slimload command-line tool.
//!
//! Settings live in a TOML file located, in order of precedence, by:
//!
//! 1. the `--config` flag
//! 2. the `SLIMLOAD_CONFIG` environment variable
//! 3. `slimload.toml` in the working directory
//!
//! Without any file the built-in defaults apply. Paths may use `~` and
//! environment variables and are resolved relative to the file that names
//! them.
//!
//! ```toml
//! plugins_dir = "~/sites/shop/wp-content/plugins"
//! state_dir = ".slimload"
//! include_reverse = true
//! max_iterations = 1000
//!
//! # Optional; by default every installed plugin counts as active
//! active_plugins = ["woocommerce/woocommerce.php", "my-gateway/my-gateway.php"]
//!
//! [slug_substitutions]
//! "elementor-pro-premium" = "elementor-pro"
//!
//! # Declarations trusted over every heuristic
//! [declared]
//! "my-gateway" = ["woocommerce"]
//! ```

pub mod parser;

pub use parser::parse_config;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::FileStore;
use crate::constants::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, MAX_RESOLVE_ITERATIONS};
use crate::core::SlimError;
use crate::graph::BuildHooks;
use crate::host::{DeclaredDependencies, FsPluginHost};
use crate::slug::is_valid_slug;
use crate::utils::fs::expand_path;

/// On-disk shape of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    plugins_dir: Option<String>,
    state_dir: Option<String>,
    active_plugins: Option<Vec<String>>,
    include_reverse: Option<bool>,
    max_iterations: Option<usize>,
    slug_substitutions: BTreeMap<String, String>,
    declared: BTreeMap<String, Vec<String>>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlimConfig {
    /// Directory holding the installed plugins.
    pub plugins_dir: PathBuf,
    /// Directory of the durable store.
    pub state_dir: PathBuf,
    /// Explicit active plugin identifiers; `None` means every installed plugin.
    pub active_plugins: Option<Vec<String>>,
    /// Default for reverse inclusion when resolving.
    pub include_reverse: bool,
    /// Resolver iteration cap.
    pub max_iterations: usize,
    /// Header slug substitutions applied during builds.
    pub slug_substitutions: BTreeMap<String, String>,
    /// Authoritative slug -> parents declarations.
    pub declared: BTreeMap<String, Vec<String>>,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
}

impl SlimConfig {
    /// Built-in defaults: `wp-content/plugins` under the working directory
    /// and state in `~/.slimload`.
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            plugins_dir: PathBuf::from("wp-content").join("plugins"),
            state_dir: default_state_dir()?,
            active_plugins: None,
            include_reverse: false,
            max_iterations: MAX_RESOLVE_ITERATIONS,
            slug_substitutions: BTreeMap::new(),
            declared: BTreeMap::new(),
            source: None,
        })
    }

    /// Locate and load the configuration.
    ///
    /// An explicitly named file (flag or environment variable) must exist;
    /// the working-directory file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_value = std::env::var(CONFIG_ENV_VAR).ok();
        let cwd = std::env::current_dir().context("Failed to determine working directory")?;

        match locate(explicit, env_value.as_deref(), &cwd) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Self::defaults()
            }
        }
    }

    /// Load from one file, filling unset fields with defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SlimError::ConfigError {
                message: format!("Configuration file not found: {}", path.display()),
            }
            .into());
        }

        let raw: RawConfig = parse_config(path)?;
        let base = path.parent().filter(|p| !p.as_os_str().is_empty());
        let defaults = Self::defaults()?;

        let plugins_dir = match raw.plugins_dir {
            Some(dir) => expand_path(&dir, base)?,
            None => defaults.plugins_dir,
        };
        let state_dir = match raw.state_dir {
            Some(dir) => expand_path(&dir, base)?,
            None => defaults.state_dir,
        };

        let config = Self {
            plugins_dir,
            state_dir,
            active_plugins: raw.active_plugins,
            include_reverse: raw.include_reverse.unwrap_or(defaults.include_reverse),
            max_iterations: raw.max_iterations.unwrap_or(defaults.max_iterations),
            slug_substitutions: raw.slug_substitutions,
            declared: raw.declared,
            source: Some(path.to_path_buf()),
        };
        config.validate()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject settings the engine cannot work with; warn about ignored ones.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SlimError::ConfigError {
                message: "max_iterations must be at least 1".to_string(),
            }
            .into());
        }

        for (child, parents) in &self.declared {
            if !is_valid_slug(child) {
                tracing::warn!("Ignoring declaration for invalid slug '{}'", child);
            }
            for parent in parents.iter().filter(|p| !is_valid_slug(p)) {
                tracing::warn!("Ignoring invalid declared parent '{}' of '{}'", parent, child);
            }
        }
        for target in self.slug_substitutions.values().filter(|t| !is_valid_slug(t)) {
            tracing::warn!("Slug substitution target '{}' is not a valid slug", target);
        }
        Ok(())
    }

    /// Filesystem host over the configured plugins directory.
    pub fn plugin_host(&self) -> FsPluginHost {
        FsPluginHost::new(&self.plugins_dir, self.active_plugins.clone())
    }

    /// Durable store in the configured state directory.
    pub fn store(&self) -> FileStore {
        FileStore::new(&self.state_dir)
    }

    /// Build hooks implementing the configured slug substitutions.
    pub fn hooks(&self) -> BuildHooks {
        BuildHooks::from_substitutions(self.slug_substitutions.clone())
    }

    /// Authority backed by the `[declared]` table, `None` when empty.
    pub fn authority(&self) -> Option<DeclaredDependencies> {
        let declared = DeclaredDependencies::new(&self.declared);
        (!declared.is_empty()).then_some(declared)
    }
}

/// Default state directory, `~/.slimload`.
pub fn default_state_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| SlimError::ConfigError {
            message: "Unable to determine home directory".to_string(),
        })?
        .join(".slimload"))
}

/// Pick the configuration file by precedence.
fn locate(explicit: Option<&Path>, env_value: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(value));
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    local.is_file().then_some(local)
}
