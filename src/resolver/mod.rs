//! Dependency closure over the built map.
//!
//! Given a seed set of slugs a request is known to need, the resolver walks
//! the map breadth-first and returns everything that must also be loaded:
//!
//! - every forward dependency (`depends_on`), transitively;
//! - with reverse inclusion, every dependent (`plugins_depending`) that is
//!   currently active.
//!
//! Edges joining a [`CircularPair`](crate::graph::CircularPair) are never
//! followed. That suppression only covers the flagged edge itself, so a longer
//! cycle can still be walked in part; the iteration cap stops the walk in
//! that case and the partial result is returned.
//!
//! The result is an unordered set that includes the seed. Load order is the
//! host's concern.

use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

use crate::constants::MAX_RESOLVE_ITERATIONS;
use crate::graph::{CircularPairSet, DependencyMap, is_circular_edge};

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Slugs to load, seed included.
    pub plugins: BTreeSet<String>,
    /// Queue pops performed.
    pub iterations: usize,
    /// True when the iteration cap cut the walk short.
    pub truncated: bool,
}

/// Breadth-first closure computation with an iteration cap.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    max_iterations: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(MAX_RESOLVE_ITERATIONS)
    }
}

impl Resolver {
    /// Create a resolver that stops after `max_iterations` queue pops.
    ///
    /// A cap of zero is raised to one so the seed is always examined.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
        }
    }

    /// The iteration cap.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Expand `seed` over `map`.
    ///
    /// `active` is the caller's snapshot of active slugs. It only restricts
    /// reverse inclusion; forward dependencies are followed whether or not
    /// they are active.
    pub fn resolve<I, S>(
        &self,
        map: &DependencyMap,
        circular: &CircularPairSet,
        seed: I,
        active: &BTreeSet<String>,
        include_reverse: bool,
    ) -> Resolution
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue: VecDeque<String> = seed.into_iter().map(Into::into).collect();
        let mut result = BTreeSet::new();
        let mut iterations = 0;

        while let Some(current) = queue.pop_front() {
            if iterations >= self.max_iterations {
                // Put it back so truncation is reported below
                queue.push_front(current);
                break;
            }
            iterations += 1;

            if result.contains(&current) {
                continue;
            }

            for parent in map.dependencies_of(&current) {
                if result.contains(parent) {
                    continue;
                }
                if is_circular_edge(circular, &current, parent) {
                    tracing::debug!("Not following circular edge {} -> {}", current, parent);
                    continue;
                }
                queue.push_back(parent.clone());
            }

            if include_reverse {
                for child in map.dependents_of(&current) {
                    if result.contains(child) || !active.contains(child) {
                        continue;
                    }
                    if is_circular_edge(circular, child, &current) {
                        tracing::debug!("Not following circular edge {} <- {}", current, child);
                        continue;
                    }
                    queue.push_back(child.clone());
                }
            }

            result.insert(current);
        }

        // Leftover duplicates of resolved slugs would not have added anything
        let truncated = queue.iter().any(|slug| !result.contains(slug));
        if truncated {
            tracing::warn!(
                "Dependency resolution stopped after {} iterations with {} plugins resolved",
                iterations,
                result.len()
            );
        }

        Resolution {
            plugins: result,
            iterations,
            truncated,
        }
    }
}

/// Closure of `seed` with the default iteration cap.
pub fn resolve_dependencies<I, S>(
    map: &DependencyMap,
    circular: &CircularPairSet,
    seed: I,
    active: &BTreeSet<String>,
    include_reverse: bool,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Resolver::default().resolve(map, circular, seed, active, include_reverse).plugins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CircularPair, DependencySource, detect_circular_dependencies};

    fn map_of(edges: &[(&str, &str)]) -> DependencyMap {
        let mut map = DependencyMap::new();
        for (child, parent) in edges {
            map.add_edge(child, parent, DependencySource::Header);
        }
        map
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_forward_closure() {
        let map = map_of(&[("a", "b"), ("b", "c"), ("d", "c")]);
        let resolved = resolve_dependencies(&map, &CircularPairSet::new(), ["a"], &set(&[]), false);
        assert_eq!(resolved, set(&["a", "b", "c"]));
    }

    #[test]
    fn test_unknown_seed_resolves_to_itself() {
        let map = map_of(&[("a", "b")]);
        let resolved = resolve_dependencies(&map, &CircularPairSet::new(), ["zzz"], &set(&[]), true);
        assert_eq!(resolved, set(&["zzz"]));
    }

    #[test]
    fn test_reverse_inclusion_requires_active() {
        let map = map_of(&[("elementor-pro", "elementor"), ("addon", "elementor")]);
        let active = set(&["elementor", "elementor-pro"]);

        let resolved = resolve_dependencies(&map, &CircularPairSet::new(), ["elementor"], &active, true);
        assert_eq!(resolved, set(&["elementor", "elementor-pro"]));

        let forward_only = resolve_dependencies(&map, &CircularPairSet::new(), ["elementor"], &active, false);
        assert_eq!(forward_only, set(&["elementor"]));
    }

    #[test]
    fn test_circular_edge_not_followed() {
        let map = map_of(&[("a", "b"), ("b", "a")]);
        let circular = detect_circular_dependencies(&map);
        assert!(circular.contains(&CircularPair::new("a", "b")));

        let resolution = Resolver::default().resolve(&map, &circular, ["a"], &set(&["a", "b"]), true);
        assert_eq!(resolution.plugins, set(&["a"]));
        assert!(!resolution.truncated);
    }

    #[test]
    fn test_longer_cycle_terminates() {
        let map = map_of(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let circular = detect_circular_dependencies(&map);

        let resolution = Resolver::default().resolve(&map, &circular, ["a"], &set(&["a", "b", "c"]), true);
        assert!(resolution.plugins.contains("a"));
        assert!(!resolution.truncated);
    }

    #[test]
    fn test_iteration_cap_returns_partial_result() {
        let names: Vec<String> = (0..20).map(|i| format!("p{i}")).collect();
        let edges: Vec<(&str, &str)> = names.windows(2).map(|w| (w[0].as_str(), w[1].as_str())).collect();
        let map = map_of(&edges);

        let resolution = Resolver::new(5).resolve(&map, &CircularPairSet::new(), ["p0"], &set(&[]), false);
        assert!(resolution.truncated);
        assert_eq!(resolution.iterations, 5);
        assert_eq!(resolution.plugins, set(&["p0", "p1", "p2", "p3", "p4"]));
    }

    #[test]
    fn test_cap_reached_on_duplicates_is_not_truncation() {
        let resolution = Resolver::new(1).resolve(&DependencyMap::new(), &CircularPairSet::new(), ["a", "a"], &set(&[]), false);
        assert_eq!(resolution.plugins, set(&["a"]));
        assert_eq!(resolution.iterations, 1);
        assert!(!resolution.truncated);

        // Diamond: `d` is queued twice and the cap lands on the duplicate
        let map = map_of(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        let resolution = Resolver::new(4).resolve(&map, &CircularPairSet::new(), ["a"], &set(&[]), false);
        assert_eq!(resolution.plugins, set(&["a", "b", "c", "d"]));
        assert!(!resolution.truncated);
    }

    #[test]
    fn test_default_cap() {
        assert_eq!(Resolver::default().max_iterations(), 1000);
        assert_eq!(Resolver::new(0).max_iterations(), 1);
    }

    #[test]
    fn test_result_includes_every_seed() {
        let map = map_of(&[("a", "b")]);
        let resolved = resolve_dependencies(&map, &CircularPairSet::new(), ["a", "x", "a"], &set(&[]), false);
        assert_eq!(resolved, set(&["a", "b", "x"]));
    }
}
