//! Test utilities for slimload
//!
//! Helpers shared by unit and integration tests:
//! - [`init_test_logging`] installs a test-writer tracing subscriber once
//! - [`PluginFixture`] lays out a throwaway plugins directory with main files
//!   carrying `Plugin Name` and `Requires Plugins` headers
//!
//! # Example
//!
//! ```rust,no_run
//! use slimload::test_utils::PluginFixture;
//!
//! let fixture = PluginFixture::new().unwrap();
//! fixture.add_plugin("shop/shop.php", "Shop", None, "").unwrap();
//! fixture.add_plugin("addon/addon.php", "Addon", Some("shop"), "").unwrap();
//! let config = fixture.write_config("").unwrap();
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level = None` logging is only
/// enabled when `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Temporary plugins directory plus a state directory next to it.
pub struct PluginFixture {
    pub temp_dir: TempDir,
    pub plugins_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl PluginFixture {
    /// Create empty `plugins/` and `state/` directories.
    pub fn new() -> Result<Self> {
        init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let plugins_dir = temp_dir.path().join("plugins");
        let state_dir = temp_dir.path().join("state");
        fs::create_dir_all(&plugins_dir)?;

        Ok(Self {
            temp_dir,
            plugins_dir,
            state_dir,
        })
    }

    /// Root of the temporary tree.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a plugin main file at `rel` under the plugins directory.
    ///
    /// `body` is appended after the header comment.
    pub fn add_plugin(
        &self,
        rel: &str,
        name: &str,
        requires: Option<&str>,
        body: &str,
    ) -> Result<PathBuf> {
        let mut content = format!("<?php\n/**\n * Plugin Name: {name}\n");
        if let Some(requires) = requires {
            content.push_str(&format!(" * Requires Plugins: {requires}\n"));
        }
        content.push_str(" */\n");
        content.push_str(body);

        let path = self.plugins_dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write plugin fixture: {}", path.display()))?;
        Ok(path)
    }

    /// Write `slimload.toml` pointing at the fixture directories.
    ///
    /// `extra` is appended verbatim, e.g. `[declared]` tables.
    pub fn write_config(&self, extra: &str) -> Result<PathBuf> {
        let content = format!(
            "plugins_dir = {:?}\nstate_dir = {:?}\n{extra}",
            self.plugins_dir.display().to_string(),
            self.state_dir.display().to_string()
        );
        let path = self.path().join(crate::constants::CONFIG_FILE_NAME);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config fixture: {}", path.display()))?;
        Ok(path)
    }
}
