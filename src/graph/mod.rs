//! Dependency map types shared by the builder, the cycle detector and the
//! resolver.
//!
//! The map is keyed by plugin slug. Each [`DependencyRecord`] carries both
//! directions of every edge: `depends_on` (what the plugin needs) and
//! `plugins_depending` (what needs the plugin). The two sets are only ever
//! changed together through [`DependencyMap::add_edge`],
//! [`DependencyMap::remove_edge`] and [`DependencyMap::normalize`], which
//! keeps them consistent and free of self-references.
//!
//! Ordered collections are used throughout so that two builds over the same
//! input serialize identically.

pub mod builder;
pub mod cycles;

pub use builder::{BuildHooks, BuildOutput, GraphBuilder};
pub use cycles::{CycleDetector, detect_circular_dependencies};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::slug::is_valid_slug;

/// Where a record or an edge came from.
///
/// Record-level tags drive builder precedence: a record tagged
/// [`DependencySource::WpCore`] is never overridden by heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencySource {
    /// The host platform's own dependency declarations.
    WpCore,
    /// `Requires Plugins` header of the plugin's main file.
    Header,
    /// Static scan of the plugin's source text.
    Code,
    /// Slug naming-convention rules.
    Pattern,
    /// Curated ecosystem table.
    Ecosystem,
    /// Record created by any of the heuristic extractors.
    Heuristic,
    /// Placeholder for a parent only known as a dependency target.
    Inferred,
    /// Manual edit.
    Custom,
}

impl DependencySource {
    /// Tag given to a record created by an edge of this evidence source.
    ///
    /// Header, code and pattern evidence all create `heuristic` records.
    pub const fn record_tag(self) -> Self {
        match self {
            Self::Header | Self::Code | Self::Pattern => Self::Heuristic,
            other => other,
        }
    }

    /// Stable lowercase name, as serialized.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WpCore => "wp_core",
            Self::Header => "header",
            Self::Code => "code",
            Self::Pattern => "pattern",
            Self::Ecosystem => "ecosystem",
            Self::Heuristic => "heuristic",
            Self::Inferred => "inferred",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for DependencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationships known for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Slugs this plugin needs.
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
    /// Slugs that need this plugin.
    #[serde(default)]
    pub plugins_depending: BTreeSet<String>,
    /// How the record entered the map.
    pub source: DependencySource,
    /// Set when the record participates in a detected cycle.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_circular: bool,
    /// Partner of the first circular pair involving this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circular_with: Option<String>,
    /// Evidence source that introduced each `depends_on` edge.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub evidence: BTreeMap<String, DependencySource>,
}

impl DependencyRecord {
    /// Create an empty record with the given tag.
    pub fn new(source: DependencySource) -> Self {
        Self {
            depends_on: BTreeSet::new(),
            plugins_depending: BTreeSet::new(),
            source,
            has_circular: false,
            circular_with: None,
            evidence: BTreeMap::new(),
        }
    }

    /// True when the record carries authoritative host data.
    pub fn is_authoritative(&self) -> bool {
        self.source == DependencySource::WpCore
    }
}

/// An unordered pair of slugs joined by a back-edge.
///
/// The two elements are stored sorted, so `(a, b)` and `(b, a)` compare
/// equal and collapse to one entry in a [`CircularPairSet`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CircularPair(String, String);

impl CircularPair {
    /// Create a pair, normalizing the element order.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// The lexicographically smaller slug.
    pub fn first(&self) -> &str {
        &self.0
    }

    /// The lexicographically larger slug.
    pub fn second(&self) -> &str {
        &self.1
    }

    /// Return the other element if `slug` is part of this pair.
    pub fn partner_of(&self, slug: &str) -> Option<&str> {
        if self.0 == slug {
            Some(&self.1)
        } else if self.1 == slug {
            Some(&self.0)
        } else {
            None
        }
    }
}

impl fmt::Display for CircularPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.0, self.1)
    }
}

/// Deduplicated, ordered set of circular pairs.
pub type CircularPairSet = BTreeSet<CircularPair>;

/// True when the edge between `a` and `b`, in either direction, is flagged.
pub fn is_circular_edge(pairs: &CircularPairSet, a: &str, b: &str) -> bool {
    pairs.contains(&CircularPair::new(a, b))
}

/// Mapping of slug to its dependency record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyMap {
    records: BTreeMap<String, DependencyRecord>,
}

impl DependencyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the map holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up one record.
    pub fn get(&self, slug: &str) -> Option<&DependencyRecord> {
        self.records.get(slug)
    }

    /// True when `slug` has a record.
    pub fn contains(&self, slug: &str) -> bool {
        self.records.contains_key(slug)
    }

    /// Iterate over records in slug order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DependencyRecord)> {
        self.records.iter()
    }

    /// All keys in slug order.
    pub fn slugs(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    /// Forward edges of `slug`, empty when unknown.
    pub fn dependencies_of(&self, slug: &str) -> impl Iterator<Item = &String> {
        self.records.get(slug).into_iter().flat_map(|r| r.depends_on.iter())
    }

    /// Reverse edges of `slug`, empty when unknown.
    pub fn dependents_of(&self, slug: &str) -> impl Iterator<Item = &String> {
        self.records.get(slug).into_iter().flat_map(|r| r.plugins_depending.iter())
    }

    /// True when the map holds the edge `child -> parent`.
    pub fn has_edge(&self, child: &str, parent: &str) -> bool {
        self.records.get(child).is_some_and(|r| r.depends_on.contains(parent))
    }

    /// Total number of forward edges.
    pub fn relationship_count(&self) -> usize {
        self.records.values().map(|r| r.depends_on.len()).sum()
    }

    /// Insert a record for `slug` unless one exists.
    ///
    /// An `inferred` placeholder is promoted to `source`, since the slug is
    /// now known in its own right. Returns false for invalid slugs.
    pub fn ensure_record(&mut self, slug: &str, source: DependencySource) -> bool {
        if !is_valid_slug(slug) {
            return false;
        }
        let record =
            self.records.entry(slug.to_string()).or_insert_with(|| DependencyRecord::new(source));
        if record.source == DependencySource::Inferred && source != DependencySource::Inferred {
            record.source = source;
        }
        true
    }

    /// Add the edge `child depends on parent`, keeping both directions.
    ///
    /// A missing child record is created with `evidence.record_tag()`, a
    /// missing parent record as an `inferred` placeholder. Self edges and
    /// invalid slugs are refused. Returns true if the edge is new.
    pub fn add_edge(&mut self, child: &str, parent: &str, evidence: DependencySource) -> bool {
        if child == parent || !is_valid_slug(child) || !is_valid_slug(parent) {
            return false;
        }
        if self.has_edge(child, parent) {
            return false;
        }

        self.ensure_record(child, evidence.record_tag());
        self.ensure_record(parent, DependencySource::Inferred);

        if let Some(record) = self.records.get_mut(child) {
            record.depends_on.insert(parent.to_string());
            record.evidence.insert(parent.to_string(), evidence);
        }
        if let Some(record) = self.records.get_mut(parent) {
            record.plugins_depending.insert(child.to_string());
        }
        true
    }

    /// Remove the edge `child depends on parent` in both directions.
    ///
    /// Records themselves are kept. Returns true if the edge existed.
    pub fn remove_edge(&mut self, child: &str, parent: &str) -> bool {
        let removed = match self.records.get_mut(child) {
            Some(record) => {
                record.evidence.remove(parent);
                record.depends_on.remove(parent)
            }
            None => false,
        };
        if let Some(record) = self.records.get_mut(parent) {
            record.plugins_depending.remove(child);
        }
        removed
    }

    /// Reverse-edge pass.
    ///
    /// Guarantees `parent.plugins_depending` contains `child` for every edge,
    /// creating `inferred` placeholders for parents without a record.
    /// Returns the number of reverse entries added.
    pub fn ensure_reverse_edges(&mut self) -> usize {
        let edges: Vec<(String, String)> = self
            .records
            .iter()
            .flat_map(|(child, r)| r.depends_on.iter().map(move |p| (child.clone(), p.clone())))
            .collect();

        let mut added = 0;
        for (child, parent) in edges {
            self.ensure_record(&parent, DependencySource::Inferred);
            if let Some(record) = self.records.get_mut(&parent)
                && record.plugins_depending.insert(child)
            {
                added += 1;
            }
        }
        added
    }

    /// Restore every structural invariant after arbitrary edits.
    ///
    /// Drops invalid keys, invalid or self-referencing edges and evidence for
    /// edges that no longer exist, then reconciles both edge directions as a
    /// union: an edge present on either side ends up on both.
    pub fn normalize(&mut self) {
        self.records.retain(|slug, _| is_valid_slug(slug));

        for (slug, record) in &mut self.records {
            record.depends_on.retain(|p| p != slug && is_valid_slug(p));
            record.plugins_depending.retain(|c| c != slug && is_valid_slug(c));
            let deps = &record.depends_on;
            record.evidence.retain(|p, _| deps.contains(p));
        }

        let reverse_only: Vec<(String, String)> = self
            .records
            .iter()
            .flat_map(|(parent, r)| {
                r.plugins_depending.iter().map(move |c| (c.clone(), parent.clone()))
            })
            .filter(|(child, parent)| !self.has_edge(child, parent))
            .collect();

        for (child, parent) in reverse_only {
            let source = self.records.get(&parent).map_or(DependencySource::Inferred, |r| r.source);
            self.ensure_record(&child, source.record_tag());
            if let Some(record) = self.records.get_mut(&child) {
                record.depends_on.insert(parent.clone());
                record.evidence.entry(parent).or_insert(source);
            }
        }

        self.ensure_reverse_edges();
    }

    /// Replace circular flags with the ones implied by `pairs`.
    ///
    /// With several partners, `circular_with` names the lexicographically
    /// first one since pairs iterate in order.
    pub fn flag_circular(&mut self, pairs: &CircularPairSet) {
        for record in self.records.values_mut() {
            record.has_circular = false;
            record.circular_with = None;
        }
        for pair in pairs {
            for slug in [pair.first(), pair.second()] {
                if let Some(partner) = pair.partner_of(slug)
                    && let Some(record) = self.records.get_mut(slug)
                {
                    record.has_circular = true;
                    record.circular_with.get_or_insert_with(|| partner.to_string());
                }
            }
        }
    }

    /// Every slug mentioned anywhere in the map, keys and edge endpoints.
    pub fn all_slugs(&self) -> BTreeSet<&str> {
        let mut slugs = BTreeSet::new();
        for (slug, record) in &self.records {
            slugs.insert(slug.as_str());
            slugs.extend(record.depends_on.iter().map(String::as_str));
            slugs.extend(record.plugins_depending.iter().map(String::as_str));
        }
        slugs
    }

    /// Number of records per record tag.
    pub fn count_by_source(&self) -> BTreeMap<DependencySource, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.values() {
            *counts.entry(record.source).or_insert(0) += 1;
        }
        counts
    }

    /// Number of edges per evidence source.
    pub fn count_by_evidence(&self) -> BTreeMap<DependencySource, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.values() {
            for parent in &record.depends_on {
                let source = record.evidence.get(parent).copied().unwrap_or(record.source);
                *counts.entry(source).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Insert a raw record, bypassing edge bookkeeping.
    ///
    /// Callers must run [`DependencyMap::normalize`] afterwards.
    pub fn insert_record(&mut self, slug: impl Into<String>, record: DependencyRecord) {
        self.records.insert(slug.into(), record);
    }
}

impl FromIterator<(String, DependencyRecord)> for DependencyMap {
    fn from_iter<T: IntoIterator<Item = (String, DependencyRecord)>>(iter: T) -> Self {
        let mut map = Self {
            records: iter.into_iter().collect(),
        };
        map.normalize();
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(map: &DependencyMap) {
        for (slug, record) in map.iter() {
            assert!(!record.depends_on.contains(slug), "{slug} depends on itself");
            for parent in &record.depends_on {
                assert!(
                    map.dependents_of(parent).any(|c| c == slug),
                    "{parent} is missing reverse edge to {slug}"
                );
            }
            for child in &record.plugins_depending {
                assert!(map.has_edge(child, slug), "{child} is missing forward edge to {slug}");
            }
        }
    }

    #[test]
    fn test_add_edge_keeps_both_directions() {
        let mut map = DependencyMap::new();
        assert!(map.add_edge("elementor-pro", "elementor", DependencySource::Header));

        let child = map.get("elementor-pro").unwrap();
        assert_eq!(child.source, DependencySource::Heuristic);
        assert_eq!(child.evidence["elementor"], DependencySource::Header);

        let parent = map.get("elementor").unwrap();
        assert_eq!(parent.source, DependencySource::Inferred);
        assert!(parent.plugins_depending.contains("elementor-pro"));
        assert_consistent(&map);
    }

    #[test]
    fn test_add_edge_refuses_self_and_invalid() {
        let mut map = DependencyMap::new();
        assert!(!map.add_edge("a", "a", DependencySource::Custom));
        assert!(!map.add_edge("a", "Bad", DependencySource::Custom));
        assert!(!map.add_edge("--", "a", DependencySource::Custom));
        assert!(map.is_empty());
    }

    #[test]
    fn test_duplicate_edge_is_not_new() {
        let mut map = DependencyMap::new();
        assert!(map.add_edge("a", "b", DependencySource::Code));
        assert!(!map.add_edge("a", "b", DependencySource::Pattern));
        assert_eq!(map.relationship_count(), 1);
        assert_eq!(map.get("a").unwrap().evidence["b"], DependencySource::Code);
    }

    #[test]
    fn test_placeholder_promoted_when_it_gains_edges() {
        let mut map = DependencyMap::new();
        map.add_edge("a", "b", DependencySource::Header);
        assert_eq!(map.get("b").unwrap().source, DependencySource::Inferred);
        map.add_edge("b", "c", DependencySource::Ecosystem);
        assert_eq!(map.get("b").unwrap().source, DependencySource::Ecosystem);
    }

    #[test]
    fn test_remove_edge() {
        let mut map = DependencyMap::new();
        map.add_edge("a", "b", DependencySource::Custom);
        assert!(map.remove_edge("a", "b"));
        assert!(!map.remove_edge("a", "b"));
        assert!(map.get("b").unwrap().plugins_depending.is_empty());
        assert!(map.get("a").unwrap().evidence.is_empty());
        assert_consistent(&map);
    }

    #[test]
    fn test_normalize_repairs_hand_built_records() {
        let mut a = DependencyRecord::new(DependencySource::Custom);
        a.depends_on.extend(["a".to_string(), "b".to_string(), "Nope".to_string()]);
        let mut c = DependencyRecord::new(DependencySource::Heuristic);
        c.plugins_depending.insert("d".to_string());

        let map: DependencyMap =
            [("a".to_string(), a), ("c".to_string(), c), ("BAD".to_string(), DependencyRecord::new(DependencySource::Custom))]
                .into_iter()
                .collect();

        assert!(!map.contains("BAD"));
        assert!(!map.has_edge("a", "a"));
        assert!(map.has_edge("a", "b"));
        assert!(map.has_edge("d", "c"));
        assert_eq!(map.get("b").unwrap().source, DependencySource::Inferred);
        assert_consistent(&map);
    }

    #[test]
    fn test_circular_pair_is_unordered() {
        assert_eq!(CircularPair::new("b", "a"), CircularPair::new("a", "b"));
        let pair = CircularPair::new("zeta", "alpha");
        assert_eq!(pair.first(), "alpha");
        assert_eq!(pair.partner_of("zeta"), Some("alpha"));
        assert_eq!(pair.partner_of("other"), None);

        let mut set = CircularPairSet::new();
        set.insert(CircularPair::new("x", "y"));
        set.insert(CircularPair::new("y", "x"));
        assert_eq!(set.len(), 1);
        assert!(is_circular_edge(&set, "y", "x"));
    }

    #[test]
    fn test_flag_circular() {
        let mut map = DependencyMap::new();
        map.add_edge("a", "b", DependencySource::Custom);
        map.add_edge("b", "a", DependencySource::Custom);
        map.add_edge("c", "a", DependencySource::Custom);

        let pairs: CircularPairSet = [CircularPair::new("a", "b")].into_iter().collect();
        map.flag_circular(&pairs);
        assert!(map.get("a").unwrap().has_circular);
        assert_eq!(map.get("a").unwrap().circular_with.as_deref(), Some("b"));
        assert_eq!(map.get("b").unwrap().circular_with.as_deref(), Some("a"));
        assert!(!map.get("c").unwrap().has_circular);

        map.flag_circular(&CircularPairSet::new());
        assert!(!map.get("a").unwrap().has_circular);
    }

    #[test]
    fn test_counts() {
        let mut map = DependencyMap::new();
        map.add_edge("a", "b", DependencySource::Header);
        map.add_edge("a", "c", DependencySource::Code);
        map.add_edge("d", "b", DependencySource::WpCore);

        let by_source = map.count_by_source();
        assert_eq!(by_source[&DependencySource::Heuristic], 1);
        assert_eq!(by_source[&DependencySource::Inferred], 2);
        assert_eq!(by_source[&DependencySource::WpCore], 1);

        let by_evidence = map.count_by_evidence();
        assert_eq!(by_evidence[&DependencySource::Header], 1);
        assert_eq!(by_evidence[&DependencySource::Code], 1);
        assert_eq!(by_evidence[&DependencySource::WpCore], 1);
        assert_eq!(map.relationship_count(), 3);
    }

    #[test]
    fn test_serialized_shape() {
        let mut map = DependencyMap::new();
        map.add_edge("a", "b", DependencySource::WpCore);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["a"]["source"], "wp_core");
        assert_eq!(json["a"]["depends_on"][0], "b");
        assert_eq!(json["b"]["plugins_depending"][0], "a");
        assert!(json["a"].get("has_circular").is_none());

        let back: DependencyMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }
}
