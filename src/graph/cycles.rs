//! Cycle detection over a dependency map.
//!
//! The map is loaded into a [`petgraph`] directed graph in slug order, then
//! walked with a three-color depth-first search. Every edge pointing at a
//! node that is still on the DFS stack is a back-edge and is reported as a
//! [`CircularPair`]. Nodes that only appear as dependency targets are part of
//! the graph as well, so coverage is complete.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::{CircularPair, CircularPairSet, DependencyMap};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed view of a [`DependencyMap`] used for traversal.
pub struct CycleDetector<'a> {
    graph: DiGraph<&'a str, ()>,
    node_map: HashMap<&'a str, NodeIndex>,
}

impl<'a> CycleDetector<'a> {
    /// Build the graph view of `map`. Edges point from child to parent.
    pub fn new(map: &'a DependencyMap) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for slug in map.all_slugs() {
            node_map.insert(slug, graph.add_node(slug));
        }

        for (child, record) in map.iter() {
            let from = node_map[child.as_str()];
            // Insert in reverse so `neighbors` yields targets in slug order
            for parent in record.depends_on.iter().rev() {
                let to = node_map[parent.as_str()];
                graph.add_edge(from, to, ());
            }
        }

        Self {
            graph,
            node_map,
        }
    }

    /// Run the search and collect every back-edge as a normalized pair.
    pub fn circular_pairs(&self) -> CircularPairSet {
        let mut colors = vec![Color::White; self.graph.node_count()];
        let mut pairs = CircularPairSet::new();

        for node in self.graph.node_indices() {
            if colors[node.index()] == Color::White {
                self.dfs_visit(node, &mut colors, &mut pairs);
            }
        }

        pairs
    }

    /// True when the edge `child -> parent` exists and lies on a cycle,
    /// i.e. `parent` reaches `child` again.
    pub fn edge_on_cycle(&self, child: &str, parent: &str) -> bool {
        let (Some(&from), Some(&to)) = (self.node_map.get(child), self.node_map.get(parent)) else {
            return false;
        };
        self.graph.contains_edge(from, to) && has_path_connecting(&self.graph, to, from, None)
    }

    /// Iterative DFS from `start`. Each stack frame holds a node and the
    /// neighbors still to visit, so long dependency chains cannot exhaust
    /// the call stack.
    fn dfs_visit(&self, start: NodeIndex, colors: &mut [Color], pairs: &mut CircularPairSet) {
        colors[start.index()] = Color::Gray;
        let mut stack = vec![(start, self.graph.neighbors(start))];

        while let Some((node, neighbors)) = stack.last_mut() {
            let node = *node;
            let Some(neighbor) = neighbors.next() else {
                colors[node.index()] = Color::Black;
                stack.pop();
                continue;
            };

            match colors[neighbor.index()] {
                Color::White => {
                    colors[neighbor.index()] = Color::Gray;
                    stack.push((neighbor, self.graph.neighbors(neighbor)));
                }
                Color::Gray => {
                    tracing::debug!(
                        "Circular dependency: {} -> {}",
                        self.graph[node],
                        self.graph[neighbor]
                    );
                    pairs.insert(CircularPair::new(self.graph[node], self.graph[neighbor]));
                }
                Color::Black => {}
            }
        }
    }
}

/// Detect every circular dependency in `map`.
///
/// Returns an empty set for acyclic maps. Pairs are unordered, so a cycle
/// `a -> b -> a` is reported once.
///
/// # Examples
///
/// ```rust
/// use slimload::graph::{DependencyMap, DependencySource, detect_circular_dependencies};
///
/// let mut map = DependencyMap::new();
/// map.add_edge("a", "b", DependencySource::Custom);
/// map.add_edge("b", "a", DependencySource::Custom);
///
/// let pairs = detect_circular_dependencies(&map);
/// assert_eq!(pairs.len(), 1);
/// ```
pub fn detect_circular_dependencies(map: &DependencyMap) -> CircularPairSet {
    CycleDetector::new(map).circular_pairs()
}
