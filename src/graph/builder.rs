//! Dependency map construction.
//!
//! [`GraphBuilder`] turns the active plugin list into one consistent
//! [`DependencyMap`]:
//!
//! 1. Authoritative declarations, when the host offers them (`wp_core`)
//! 2. Merged evidence extractors for every plugin not covered by step 1
//! 3. Persisted manual edits
//! 4. Reverse-edge pass with `inferred` placeholders for unknown parents
//! 5. Known-ecosystem validation for active children
//! 6. The map override hook, followed by re-normalization
//! 7. Cycle detection and circular flagging
//!
//! The same active list and the same plugin files always produce the same
//! map.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{CircularPairSet, DependencyMap, DependencySource, detect_circular_dependencies};
use crate::constants::CODE_SCAN_LIMIT;
use crate::detect::ecosystem::ecosystem_edges;
use crate::detect::{EvidenceInput, collect_evidence};
use crate::host::{AuthoritativeSource, PluginHost};
use crate::slug::{get_plugin_slug, is_valid_slug, sanitize_slugs};
use crate::utils::fingerprint;

/// Customization points of a build.
///
/// - `slug_substitute` rewrites each `Requires Plugins` entry before it is
///   validated, e.g. to swap a premium slug for its free equivalent.
/// - `map_built` sees the complete map before cycle detection and caching and
///   may change it freely.
#[derive(Default)]
pub struct BuildHooks {
    slug_substitute: Option<Box<dyn Fn(&str) -> String>>,
    map_built: Option<Box<dyn Fn(&mut DependencyMap)>>,
}

impl BuildHooks {
    /// Hooks that change nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitution hook backed by a fixed table; unknown slugs pass through.
    pub fn from_substitutions(table: BTreeMap<String, String>) -> Self {
        if table.is_empty() {
            return Self::new();
        }
        Self::new().with_slug_substitute(move |slug| {
            table.get(slug).cloned().unwrap_or_else(|| slug.to_string())
        })
    }

    /// Set the slug-substitution hook.
    pub fn with_slug_substitute(mut self, hook: impl Fn(&str) -> String + 'static) -> Self {
        self.slug_substitute = Some(Box::new(hook));
        self
    }

    /// Set the map override hook.
    pub fn with_map_built(mut self, hook: impl Fn(&mut DependencyMap) + 'static) -> Self {
        self.map_built = Some(Box::new(hook));
        self
    }

    /// Apply the substitution hook to one header entry.
    pub fn substitute(&self, slug: &str) -> String {
        match &self.slug_substitute {
            Some(hook) => hook(slug),
            None => slug.to_string(),
        }
    }

    fn apply_map_built(&self, map: &mut DependencyMap) {
        if let Some(hook) = &self.map_built {
            hook(map);
        }
    }
}

impl fmt::Debug for BuildHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildHooks")
            .field("slug_substitute", &self.slug_substitute.is_some())
            .field("map_built", &self.map_built.is_some())
            .finish()
    }
}

/// Manual dependency edits replayed on every build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEdits {
    /// `(child, parent)` edges added by hand.
    #[serde(default)]
    pub added: BTreeSet<(String, String)>,
    /// `(child, parent)` edges removed by hand.
    #[serde(default)]
    pub removed: BTreeSet<(String, String)>,
}

impl CustomEdits {
    /// True when there are no edits.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Record an added edge, cancelling an earlier removal of it.
    pub fn add(&mut self, child: &str, parent: &str) {
        let edge = (child.to_string(), parent.to_string());
        self.removed.remove(&edge);
        self.added.insert(edge);
    }

    /// Record a removed edge, cancelling an earlier addition of it.
    pub fn remove(&mut self, child: &str, parent: &str) {
        let edge = (child.to_string(), parent.to_string());
        self.added.remove(&edge);
        self.removed.insert(edge);
    }

    fn is_removed(&self, child: &str, parent: &str) -> bool {
        self.removed.contains(&(child.to_string(), parent.to_string()))
    }
}

/// Result of one build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The completed map.
    pub map: DependencyMap,
    /// Circular pairs found in it.
    pub circular: CircularPairSet,
    /// Slugs of the active plugins the map was built for.
    pub active_slugs: BTreeSet<String>,
    /// Fingerprint of the active plugin list.
    pub fingerprint: String,
}

/// Builds a [`DependencyMap`] from a plugin host.
pub struct GraphBuilder<'a> {
    host: &'a dyn PluginHost,
    authority: Option<&'a dyn AuthoritativeSource>,
    custom: Option<&'a CustomEdits>,
    hooks: &'a BuildHooks,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over `host` using `hooks`.
    pub fn new(host: &'a dyn PluginHost, hooks: &'a BuildHooks) -> Self {
        Self {
            host,
            authority: None,
            custom: None,
            hooks,
        }
    }

    /// Consult `authority` before any heuristic.
    pub fn with_authority(mut self, authority: Option<&'a dyn AuthoritativeSource>) -> Self {
        self.authority = authority;
        self
    }

    /// Replay `edits` after heuristic detection.
    pub fn with_custom_edits(mut self, edits: &'a CustomEdits) -> Self {
        self.custom = Some(edits);
        self
    }

    /// Build for the host's current active plugin list.
    pub fn build(&self) -> Result<BuildOutput> {
        let active = self.host.active_plugins().context("Failed to read active plugin list")?;
        Ok(self.build_for(&active))
    }

    /// Build for an explicit list of active plugin identifiers.
    pub fn build_for(&self, active: &[String]) -> BuildOutput {
        let plugins: Vec<(&str, String)> = active
            .iter()
            .map(|id| (id.as_str(), get_plugin_slug(id)))
            .filter(|(id, slug)| {
                let valid = is_valid_slug(slug);
                if !valid {
                    tracing::debug!("Skipping plugin {} with invalid slug '{}'", id, slug);
                }
                valid
            })
            .collect();
        let active_slugs: BTreeSet<String> = plugins.iter().map(|(_, slug)| slug.clone()).collect();

        let mut map = DependencyMap::new();
        self.apply_authority(&mut map, &plugins);
        self.apply_heuristics(&mut map, &plugins);
        self.apply_custom_edits(&mut map);

        let reversed = map.ensure_reverse_edges();
        tracing::debug!("Reverse-edge pass added {} entries", reversed);

        self.apply_ecosystem(&mut map, &active_slugs);

        self.hooks.apply_map_built(&mut map);
        map.normalize();

        let circular = detect_circular_dependencies(&map);
        if !circular.is_empty() {
            tracing::warn!(
                "Detected {} circular dependencies: {}",
                circular.len(),
                circular.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            );
        }
        map.flag_circular(&circular);

        tracing::info!(
            "Built dependency map: {} plugins, {} relationships, {} circular",
            map.len(),
            map.relationship_count(),
            circular.len()
        );

        BuildOutput {
            map,
            circular,
            active_slugs,
            fingerprint: fingerprint(active),
        }
    }

    fn apply_authority(&self, map: &mut DependencyMap, plugins: &[(&str, String)]) {
        let Some(authority) = self.authority.filter(|a| a.is_available()) else {
            return;
        };

        for (_, slug) in plugins {
            let parents = authority.declared_dependencies(slug);
            let dependents = sanitize_slugs(authority.declared_dependents(slug));
            // Known to the host either as a child or as a parent
            if parents.is_none() && dependents.is_empty() {
                continue;
            }

            map.ensure_record(slug, DependencySource::WpCore);
            for parent in sanitize_slugs(parents.unwrap_or_default()) {
                map.add_edge(slug, &parent, DependencySource::WpCore);
            }
            for dependent in dependents {
                map.add_edge(&dependent, slug, DependencySource::WpCore);
            }
        }
    }

    fn apply_heuristics(&self, map: &mut DependencyMap, plugins: &[(&str, String)]) {
        let substitute = |s: &str| self.hooks.substitute(s);

        for (id, slug) in plugins {
            if map.get(slug).is_some_and(|r| r.is_authoritative()) {
                tracing::debug!("Skipping heuristics for {}: declared by host", slug);
                continue;
            }

            let header = self.host.requires_header(id);
            let source = self.host.source_prefix(id, CODE_SCAN_LIMIT);
            let evidence = collect_evidence(
                EvidenceInput {
                    slug,
                    requires_header: &header,
                    source: &source,
                },
                &substitute,
            );
            if evidence.is_empty() {
                continue;
            }

            map.ensure_record(slug, DependencySource::Heuristic);
            for (parent, source) in &evidence.parents {
                map.add_edge(slug, parent, *source);
            }
        }
    }

    fn apply_custom_edits(&self, map: &mut DependencyMap) {
        let Some(edits) = self.custom else {
            return;
        };
        for (child, parent) in &edits.removed {
            map.remove_edge(child, parent);
        }
        for (child, parent) in &edits.added {
            map.add_edge(child, parent, DependencySource::Custom);
        }
    }

    fn apply_ecosystem(&self, map: &mut DependencyMap, active_slugs: &BTreeSet<String>) {
        for (child, root) in ecosystem_edges(active_slugs) {
            if self.custom.is_some_and(|edits| edits.is_removed(&child, &root)) {
                continue;
            }
            if map.add_edge(&child, &root, DependencySource::Ecosystem) {
                tracing::debug!("Ecosystem table added {} -> {}", child, root);
            }
        }
    }
}
