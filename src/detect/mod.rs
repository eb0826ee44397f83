//! Evidence extractors.
//!
//! Four independent sources each propose parent slugs for one plugin:
//!
//! - [`header`] - the declared `Requires Plugins` field
//! - [`code_scan`] - well-known symbols, constants and hook prefixes in the source
//! - [`patterns`] - slug naming conventions
//! - [`ecosystem`] - the curated root/children table
//!
//! [`collect_evidence`] merges them into one [`Evidence`] value. None of the
//! extractors can fail: missing input simply contributes nothing.

pub mod code_scan;
pub mod ecosystem;
pub mod header;
pub mod patterns;

use std::collections::BTreeMap;

use crate::graph::DependencySource;

/// Raw inputs the extractors work from for one plugin.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceInput<'a> {
    /// Slug of the plugin being examined.
    pub slug: &'a str,
    /// Raw `Requires Plugins` header value, empty when absent.
    pub requires_header: &'a str,
    /// Leading bytes of the plugin's main source file, empty when unreadable.
    pub source: &'a str,
}

/// Merged extractor output for one plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    /// Candidate parent and the first source that proposed it.
    pub parents: BTreeMap<String, DependencySource>,
    /// Per-extractor output before merging, for diagnostics.
    pub by_source: BTreeMap<DependencySource, Vec<String>>,
}

impl Evidence {
    /// True when no extractor proposed anything.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Run every extractor against one plugin and merge the results.
///
/// The union is taken in the order header, code, pattern, ecosystem; each
/// parent keeps the first source that produced it. Self references are
/// removed. `substitute` is the slug-substitution hook applied to header
/// entries.
pub fn collect_evidence(input: EvidenceInput<'_>, substitute: &dyn Fn(&str) -> String) -> Evidence {
    let mut parts = BTreeMap::new();
    parts.insert(DependencySource::Header, header::parse_requires(input.requires_header, substitute));
    parts.insert(DependencySource::Code, code_scan::scan_source(input.source));
    parts.insert(DependencySource::Pattern, patterns::match_slug(input.slug));
    parts.insert(DependencySource::Ecosystem, ecosystem::ecosystem_parents(input.slug));

    let mut parents = BTreeMap::new();
    // BTreeMap order of DependencySource is header, code, pattern, ecosystem
    for (source, slugs) in &parts {
        for parent in slugs.iter().filter(|p| p.as_str() != input.slug) {
            parents.entry(parent.clone()).or_insert(*source);
        }
    }

    if !parents.is_empty() {
        tracing::debug!(
            "Evidence for {}: {}",
            input.slug,
            parents.iter().map(|(p, s)| format!("{p} ({s})")).collect::<Vec<_>>().join(", ")
        );
    }

    Evidence {
        parents,
        by_source: parts.into_iter().filter(|(_, v)| !v.is_empty()).collect(),
    }
}
