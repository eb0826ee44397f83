//! Host platform adapters.
//!
//! The graph builder never touches the platform directly. It asks a
//! [`PluginHost`] for the active plugin list and for each plugin's header and
//! source text, and optionally an [`AuthoritativeSource`] for declared
//! relationships that take precedence over heuristics.
//!
//! [`FsPluginHost`] reads a plugins directory laid out the usual way
//! (`<plugins_dir>/<slug>/<main>.php` or `<plugins_dir>/<single>.php`).
//! [`DeclaredDependencies`] is an authority backed by an explicit table,
//! typically the `[declared]` section of the configuration file.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::HEADER_SCAN_LIMIT;
use crate::core::SlimError;
use crate::detect::header::read_requires_field;
use crate::slug::is_valid_slug;

/// Read access to the host's installed plugins.
///
/// Plugin identifiers are file paths relative to the plugins directory, such
/// as `elementor/elementor.php` or `hello.php`.
pub trait PluginHost {
    /// Identifiers of the active plugins, in host order.
    fn active_plugins(&self) -> Result<Vec<String>>;

    /// Raw `Requires Plugins` header value, empty when absent or unreadable.
    fn requires_header(&self, plugin: &str) -> String;

    /// Up to `limit` leading bytes of the plugin's main file, empty when
    /// unreadable.
    fn source_prefix(&self, plugin: &str, limit: usize) -> String;
}

/// Host-provided dependency declarations.
pub trait AuthoritativeSource {
    /// False when the host offers no dependency API.
    fn is_available(&self) -> bool {
        true
    }

    /// Declared parents of `slug`, or `None` if the host knows nothing about it.
    fn declared_dependencies(&self, slug: &str) -> Option<Vec<String>>;

    /// Plugins declaring a dependency on `slug`.
    fn declared_dependents(&self, slug: &str) -> Vec<String>;
}

/// Authority backed by an explicit slug -> parents table.
#[derive(Debug, Clone, Default)]
pub struct DeclaredDependencies {
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DeclaredDependencies {
    /// Build from a slug -> parents table. Invalid slugs are discarded.
    pub fn new(table: &BTreeMap<String, Vec<String>>) -> Self {
        let mut declared = Self::default();
        for (child, parents) in table.iter().filter(|(child, _)| is_valid_slug(child)) {
            let entry = declared.dependencies.entry(child.clone()).or_default();
            for parent in parents.iter().filter(|p| is_valid_slug(p) && *p != child) {
                entry.insert(parent.clone());
                declared.dependents.entry(parent.clone()).or_default().insert(child.clone());
            }
        }
        declared
    }

    /// True when the table declares nothing.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl AuthoritativeSource for DeclaredDependencies {
    fn is_available(&self) -> bool {
        !self.is_empty()
    }

    fn declared_dependencies(&self, slug: &str) -> Option<Vec<String>> {
        self.dependencies.get(slug).map(|parents| parents.iter().cloned().collect())
    }

    fn declared_dependents(&self, slug: &str) -> Vec<String> {
        self.dependents.get(slug).map(|c| c.iter().cloned().collect()).unwrap_or_default()
    }
}

/// Plugin host reading a plugins directory on disk.
#[derive(Debug, Clone)]
pub struct FsPluginHost {
    plugins_dir: PathBuf,
    active: Option<Vec<String>>,
}

impl FsPluginHost {
    /// Create a host over `plugins_dir`.
    ///
    /// With `active = None` every installed plugin counts as active.
    pub fn new(plugins_dir: impl Into<PathBuf>, active: Option<Vec<String>>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
            active,
        }
    }

    /// Root of the plugins directory.
    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    /// Discover installed plugins: PHP files at depth one or two that carry a
    /// `Plugin Name:` header. Sorted by identifier.
    pub fn installed_plugins(&self) -> Result<Vec<String>> {
        if !self.plugins_dir.is_dir() {
            return Err(SlimError::PluginsDirNotFound {
                path: self.plugins_dir.display().to_string(),
            }
            .into());
        }

        let mut plugins = Vec::new();
        for entry in WalkDir::new(&self.plugins_dir).min_depth(1).max_depth(2).sort_by_file_name() {
            let entry = entry.with_context(|| {
                format!("Failed to read plugins directory: {}", self.plugins_dir.display())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "php") {
                continue;
            }

            let head = read_prefix(path, HEADER_SCAN_LIMIT).unwrap_or_default();
            if !head.contains("Plugin Name:") {
                continue;
            }

            if let Ok(relative) = path.strip_prefix(&self.plugins_dir) {
                let id = relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
                tracing::debug!("Discovered plugin {}", id);
                plugins.push(id);
            }
        }

        Ok(plugins)
    }

    fn plugin_path(&self, plugin: &str) -> PathBuf {
        self.plugins_dir.join(plugin)
    }
}

impl PluginHost for FsPluginHost {
    fn active_plugins(&self) -> Result<Vec<String>> {
        match &self.active {
            Some(active) => Ok(active.clone()),
            None => self.installed_plugins(),
        }
    }

    fn requires_header(&self, plugin: &str) -> String {
        read_prefix(&self.plugin_path(plugin), HEADER_SCAN_LIMIT)
            .map(|head| read_requires_field(&head))
            .unwrap_or_default()
    }

    fn source_prefix(&self, plugin: &str, limit: usize) -> String {
        read_prefix(&self.plugin_path(plugin), limit).unwrap_or_default()
    }
}

/// Read at most `limit` bytes of a file as lossy UTF-8.
fn read_prefix(path: &Path, limit: usize) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("Cannot open {}: {}", path.display(), e);
            return None;
        }
    };

    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    if let Err(e) = file.take(limit as u64).read_to_end(&mut buf) {
        tracing::debug!("Cannot read {}: {}", path.display(), e);
        return None;
    }

    Some(String::from_utf8_lossy(&buf).into_owned())
}

/// In-memory host for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticPluginHost {
    /// Active plugin identifiers.
    pub active: Vec<String>,
    /// Identifier -> raw `Requires Plugins` value.
    pub headers: BTreeMap<String, String>,
    /// Identifier -> source text.
    pub sources: BTreeMap<String, String>,
}

impl StaticPluginHost {
    /// Create a host with the given active identifiers and no content.
    pub fn new<I, S>(active: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active: active.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the `Requires Plugins` value of a plugin.
    pub fn with_header(mut self, plugin: &str, value: &str) -> Self {
        self.headers.insert(plugin.to_string(), value.to_string());
        self
    }

    /// Set the source text of a plugin.
    pub fn with_source(mut self, plugin: &str, source: &str) -> Self {
        self.sources.insert(plugin.to_string(), source.to_string());
        self
    }
}

impl PluginHost for StaticPluginHost {
    fn active_plugins(&self) -> Result<Vec<String>> {
        Ok(self.active.clone())
    }

    fn requires_header(&self, plugin: &str) -> String {
        self.headers.get(plugin).cloned().unwrap_or_default()
    }

    fn source_prefix(&self, plugin: &str, limit: usize) -> String {
        self.sources
            .get(plugin)
            .map(|s| crate::detect::header::truncate_at_char_boundary(s, limit).to_string())
            .unwrap_or_default()
    }
}
