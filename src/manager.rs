//! High-level entry point tying the engine together.
//!
//! [`DependencyManager`] owns a [`PluginHost`], an optional
//! [`AuthoritativeSource`], the build hooks and a [`MapCache`]. It serves the
//! dependency map from cache, rebuilds it on a miss, resolves seed sets
//! against it and applies manual edits.
//!
//! # Examples
//!
//! ```rust
//! use slimload::cache::MemoryStore;
//! use slimload::host::StaticPluginHost;
//! use slimload::manager::DependencyManager;
//!
//! # fn main() -> anyhow::Result<()> {
//! let host = StaticPluginHost::new(["shop/shop.php", "addon/addon.php"])
//!     .with_header("addon/addon.php", "shop");
//! let mut manager = DependencyManager::new(host, MemoryStore::new());
//!
//! let active = manager.active_slugs()?;
//! let resolved = manager.resolve_dependencies(["addon"], &active, false)?;
//! assert!(resolved.contains("shop"));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use semver::Version;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::cache::{CachedMap, KeyValueStore, MapCache};
use crate::constants::CODE_SCAN_LIMIT;
use crate::core::SlimError;
use crate::detect::{EvidenceInput, collect_evidence};
use crate::graph::{
    BuildHooks, BuildOutput, CircularPairSet, CycleDetector, DependencyMap, DependencyRecord,
    DependencySource, GraphBuilder, detect_circular_dependencies,
};
use crate::host::{AuthoritativeSource, PluginHost};
use crate::resolver::{Resolution, Resolver};
use crate::slug::{get_plugin_slug, is_valid_slug};

/// Version of the running engine, recorded next to cached data.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Summary of a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildStats {
    /// Records in the map.
    pub total_plugins: usize,
    /// Forward edges in the map.
    pub total_relationships: usize,
    /// Circular pairs detected.
    pub circular_count: usize,
    /// Records per record tag.
    pub by_source: BTreeMap<DependencySource, usize>,
    /// Edges per evidence source.
    pub by_evidence: BTreeMap<DependencySource, usize>,
}

impl RebuildStats {
    /// Compute the summary of a built map.
    pub fn from_map(map: &DependencyMap, circular: &CircularPairSet) -> Self {
        Self {
            total_plugins: map.len(),
            total_relationships: map.relationship_count(),
            circular_count: circular.len(),
            by_source: map.count_by_source(),
            by_evidence: map.count_by_evidence(),
        }
    }
}

/// Everything known about one plugin, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct PluginReport {
    /// Plugin identifier.
    pub plugin: String,
    /// Derived slug.
    pub slug: String,
    /// Host declarations, when the authority knows the plugin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared: Option<Vec<String>>,
    /// Raw output of each extractor.
    pub evidence: BTreeMap<DependencySource, Vec<String>>,
    /// The plugin's record in the current map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DependencyRecord>,
}

/// Active slugs and the matching cached map, taken from one read of the
/// host's active list.
#[derive(Debug, Clone)]
pub struct ActiveSnapshot {
    /// Slugs of the active plugins.
    pub active: BTreeSet<String>,
    /// Map built for exactly that active set.
    pub cached: CachedMap,
}

/// Cached dependency map with build, resolve and edit operations.
pub struct DependencyManager<H, S> {
    host: H,
    authority: Option<Box<dyn AuthoritativeSource>>,
    hooks: BuildHooks,
    resolver: Resolver,
    cache: MapCache<S>,
}

impl<H: PluginHost, S: KeyValueStore> DependencyManager<H, S> {
    /// Create a manager over `host`, persisting into `store`.
    pub fn new(host: H, store: S) -> Self {
        Self {
            host,
            authority: None,
            hooks: BuildHooks::new(),
            resolver: Resolver::default(),
            cache: MapCache::new(store),
        }
    }

    /// Use `authority` for declared dependencies.
    pub fn with_authority(mut self, authority: impl AuthoritativeSource + 'static) -> Self {
        self.authority = Some(Box::new(authority));
        self
    }

    /// Use `hooks` for every build started by the manager.
    pub fn with_hooks(mut self, hooks: BuildHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Use a resolver with a different iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.resolver = Resolver::new(max_iterations);
        self
    }

    /// The plugin host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The cache.
    pub fn cache(&self) -> &MapCache<S> {
        &self.cache
    }

    /// Slugs of the currently active plugins.
    pub fn active_slugs(&self) -> Result<BTreeSet<String>> {
        Ok(slugs_of(&self.read_active()?))
    }

    /// Active slugs and the cached map for them, rebuilding on a miss.
    ///
    /// The host's active list is read once, so a command can resolve and
    /// report against the snapshot without walking the plugins again.
    pub fn snapshot(&mut self) -> Result<ActiveSnapshot> {
        let plugins = self.read_active()?;
        let cached = self.cached_for(&plugins)?.clone();
        Ok(ActiveSnapshot {
            active: slugs_of(&plugins),
            cached,
        })
    }

    /// Closure of `seed` over a snapshot, without touching the host.
    pub fn resolve_in<I, T>(&self, snapshot: &ActiveSnapshot, seed: I, include_reverse: bool) -> Resolution
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.resolver.resolve(
            &snapshot.cached.map,
            &snapshot.cached.circular,
            seed,
            &snapshot.active,
            include_reverse,
        )
    }

    /// Cached map, rebuilding on a miss.
    pub fn get_dependency_map(&mut self) -> Result<DependencyMap> {
        Ok(self.cached()?.map.clone())
    }

    /// Circular pairs of the cached map, rebuilding on a miss.
    pub fn circular_dependencies(&mut self) -> Result<CircularPairSet> {
        Ok(self.cached()?.circular.clone())
    }

    /// Build a fresh map without reading the cache, then persist it.
    pub fn build_dependency_map(&mut self) -> Result<DependencyMap> {
        let active = self.read_active()?;
        let output = self.build_output(&active, &self.hooks);
        Ok(self.store_output(output).map)
    }

    /// Like [`Self::build_dependency_map`], with one-off hooks.
    pub fn build_dependency_map_with(&mut self, hooks: &BuildHooks) -> Result<DependencyMap> {
        let active = self.read_active()?;
        let output = self.build_output(&active, hooks);
        Ok(self.store_output(output).map)
    }

    /// Drop the cache, rebuild and summarize.
    pub fn rebuild_dependency_map(&mut self) -> Result<RebuildStats> {
        self.cache.invalidate();
        let active = self.read_active()?;
        let output = self.build_output(&active, &self.hooks);
        let cached = self.store_output(output);

        let stats = RebuildStats::from_map(&cached.map, &cached.circular);
        tracing::info!(
            "Rebuilt dependency map: {} plugins, {} relationships, {} circular",
            stats.total_plugins,
            stats.total_relationships,
            stats.circular_count
        );
        Ok(stats)
    }

    /// Closure of `seed` over the cached map.
    ///
    /// `active` is the caller's snapshot of active slugs and only restricts
    /// reverse inclusion.
    pub fn resolve<I, T>(
        &mut self,
        seed: I,
        active: &BTreeSet<String>,
        include_reverse: bool,
    ) -> Result<Resolution>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let resolver = self.resolver;
        let cached = self.cached()?;
        Ok(resolver.resolve(&cached.map, &cached.circular, seed, active, include_reverse))
    }

    /// Set of slugs to load for `seed`, seed included.
    pub fn resolve_dependencies<I, T>(
        &mut self,
        seed: I,
        active: &BTreeSet<String>,
        include_reverse: bool,
    ) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Ok(self.resolve(seed, active, include_reverse)?.plugins)
    }

    /// Add a manual edge `child depends on parent`.
    ///
    /// Returns false, changing nothing, for invalid slugs, self edges and
    /// edges that would close a cycle. Accepted edges are persisted and
    /// survive rebuilds.
    pub fn add_custom_dependency(&mut self, child: &str, parent: &str) -> Result<bool> {
        if child == parent || !is_valid_slug(child) || !is_valid_slug(parent) {
            tracing::debug!("Rejected custom dependency {} -> {}: invalid edge", child, parent);
            return Ok(false);
        }

        let current = self.cached()?.clone();
        let mut map = current.map.clone();
        map.add_edge(child, parent, DependencySource::Custom);

        if CycleDetector::new(&map).edge_on_cycle(child, parent) {
            tracing::warn!("Rejected custom dependency {} -> {}: would create a cycle", child, parent);
            return Ok(false);
        }

        let mut edits = self.cache.custom_edits();
        edits.add(child, parent);
        self.cache.save_custom_edits(&edits)?;

        self.cache.set(CachedMap {
            map,
            ..current
        });
        tracing::info!("Added custom dependency {} -> {}", child, parent);
        Ok(true)
    }

    /// Remove the edge `child depends on parent`, whatever its origin.
    ///
    /// Returns false when the edge does not exist. The removal is persisted
    /// and replayed on later builds.
    pub fn remove_custom_dependency(&mut self, child: &str, parent: &str) -> Result<bool> {
        let current = self.cached()?.clone();
        if !current.map.has_edge(child, parent) {
            return Ok(false);
        }

        let mut edits = self.cache.custom_edits();
        edits.remove(child, parent);
        self.cache.save_custom_edits(&edits)?;

        let mut map = current.map;
        map.remove_edge(child, parent);
        let circular = detect_circular_dependencies(&map);
        map.flag_circular(&circular);

        self.cache.set(CachedMap {
            map,
            circular,
            fingerprint: current.fingerprint,
            built_at: current.built_at,
        });
        tracing::info!("Removed dependency {} -> {}", child, parent);
        Ok(true)
    }

    /// A plugin was activated.
    pub fn plugin_activated(&mut self, plugin: &str) {
        tracing::info!("Plugin activated: {}", plugin);
        self.invalidate();
    }

    /// A plugin was deactivated.
    pub fn plugin_deactivated(&mut self, plugin: &str) {
        tracing::info!("Plugin deactivated: {}", plugin);
        self.invalidate();
    }

    /// A plugin was upgraded; its header and source may have changed.
    pub fn plugin_upgraded(&mut self, plugin: &str) {
        tracing::info!("Plugin upgraded: {}", plugin);
        self.invalidate();
    }

    /// Drop both cache layers. The next read rebuilds.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        tracing::info!("Dependency map cache invalidated");
    }

    /// Invalidate when the cached data was written by another engine version.
    ///
    /// Returns true when the cache was invalidated.
    pub fn check_version(&mut self) -> bool {
        let stored = self.cache.stored_version();
        let current = Version::parse(ENGINE_VERSION).ok();
        let matches = match (&stored, &current) {
            (Some(stored), Some(current)) => Version::parse(stored).ok().as_ref() == Some(current),
            _ => false,
        };
        if matches {
            return false;
        }

        tracing::info!(
            "Engine version changed ({} -> {}), invalidating cache",
            stored.as_deref().unwrap_or("none"),
            ENGINE_VERSION
        );
        self.invalidate();
        self.cache.save_version(ENGINE_VERSION);
        true
    }

    /// Per-extractor evidence and current record for one active plugin.
    ///
    /// `plugin` may be an identifier or a slug.
    pub fn inspect_plugin(&mut self, plugin: &str) -> Result<PluginReport> {
        let active = self.read_active()?;
        let id = active
            .iter()
            .find(|id| id.as_str() == plugin || get_plugin_slug(id) == plugin)
            .cloned()
            .ok_or_else(|| SlimError::PluginNotFound {
                name: plugin.to_string(),
            })?;
        let slug = get_plugin_slug(&id);

        let header = self.host.requires_header(&id);
        let source = self.host.source_prefix(&id, CODE_SCAN_LIMIT);
        let hooks = &self.hooks;
        let evidence = collect_evidence(
            EvidenceInput {
                slug: &slug,
                requires_header: &header,
                source: &source,
            },
            &|s: &str| hooks.substitute(s),
        );
        let declared = self
            .authority
            .as_deref()
            .filter(|a| a.is_available())
            .and_then(|a| a.declared_dependencies(&slug));
        let record = self.cached_for(&active)?.map.get(&slug).cloned();

        Ok(PluginReport {
            plugin: id,
            slug,
            declared,
            evidence: evidence.by_source,
            record,
        })
    }

    fn read_active(&self) -> Result<Vec<String>> {
        self.host.active_plugins().context("Failed to read active plugin list")
    }

    fn cached(&mut self) -> Result<&CachedMap> {
        let active = self.read_active()?;
        self.cached_for(&active)
    }

    fn cached_for(&mut self, active: &[String]) -> Result<&CachedMap> {
        let fingerprint = crate::utils::fingerprint(active);

        if self.cache.get(&fingerprint).is_none() {
            tracing::debug!("Dependency map cache miss, rebuilding");
            let output = self.build_output(active, &self.hooks);
            self.store_output(output);
        }

        self.cache.get(&fingerprint).ok_or_else(|| {
            SlimError::Other {
                message: "Dependency map missing from cache after rebuild".to_string(),
            }
            .into()
        })
    }

    fn build_output(&self, active: &[String], hooks: &BuildHooks) -> BuildOutput {
        let edits = self.cache.custom_edits();
        GraphBuilder::new(&self.host, hooks)
            .with_authority(self.authority.as_deref())
            .with_custom_edits(&edits)
            .build_for(active)
    }

    fn store_output(&mut self, output: BuildOutput) -> CachedMap {
        let cached = CachedMap {
            map: output.map,
            circular: output.circular,
            fingerprint: output.fingerprint,
            built_at: Utc::now(),
        };
        self.cache.set(cached.clone());
        self.cache.save_version(ENGINE_VERSION);
        cached
    }
}

fn slugs_of(plugins: &[String]) -> BTreeSet<String> {
    plugins.iter().map(|id| get_plugin_slug(id)).filter(|slug| is_valid_slug(slug)).collect()
}
