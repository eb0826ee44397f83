//! slimload - plugin dependency graph engine
//!
//! Loading every installed CMS plugin on every request is wasteful. slimload
//! builds a dependency graph over the active plugins so a loader can start
//! from the few plugins a request is known to need and add exactly what those
//! require.
//!
//! # Architecture Overview
//!
//! Edges of the graph are inferred from independent evidence sources, each of
//! them a heuristic on its own:
//! - the `Requires Plugins` header of each plugin's main file
//! - well-known class names, constants and hook prefixes in its source
//! - slug naming conventions (`woocommerce-*`, `*-for-elementor`)
//! - a curated table of ecosystems and their add-ons
//!
//! Declarations from the host platform, when available, take precedence
//! over all of them. The built map is checked for cycles, cached in memory
//! and in a durable store, and consumed by a breadth-first resolver that never
//! follows an edge flagged as circular.
//!
//! # Core Modules
//!
//! ## Engine
//! - [`slug`] - Plugin identifier to slug derivation and slug validation
//! - [`detect`] - Evidence extractors
//! - [`graph`] - Dependency map types, builder and cycle detection
//! - [`resolver`] - Closure computation over the map
//! - [`cache`] - In-memory and durable map persistence
//! - [`manager`] - Facade combining all of the above
//!
//! ## Supporting Modules
//! - [`host`] - Plugin host and authoritative-source traits with filesystem
//!   and in-memory implementations
//! - [`config`] - `slimload.toml` loading
//! - [`core`] - Error types and user-facing error rendering
//! - [`cli`] - Command-line interface
//! - [`utils`] - Filesystem helpers and fingerprints
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Show the dependency map of the configured plugins directory
//! slimload map
//!
//! # What must load alongside elementor-pro?
//! slimload resolve elementor-pro --reverse
//!
//! # Record a relationship no heuristic can see
//! slimload add-dep my-checkout-tweaks woocommerce
//! ```
//!
//! # Library Usage
//!
//! ```rust
//! use slimload::cache::MemoryStore;
//! use slimload::host::StaticPluginHost;
//! use slimload::manager::DependencyManager;
//!
//! # fn main() -> anyhow::Result<()> {
//! let host = StaticPluginHost::new([
//!     "elementor/elementor.php",
//!     "elementor-pro/elementor-pro.php",
//! ]);
//! let mut manager = DependencyManager::new(host, MemoryStore::new());
//!
//! let map = manager.get_dependency_map()?;
//! assert!(map.has_edge("elementor-pro", "elementor"));
//! # Ok(())
//! # }
//! ```

// Engine
pub mod cache;
pub mod detect;
pub mod graph;
pub mod manager;
pub mod resolver;
pub mod slug;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod host;
pub mod utils;

// Test utilities (only compiled in test mode or with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use graph::detect_circular_dependencies;
pub use resolver::resolve_dependencies;
pub use slug::{get_plugin_slug, is_valid_slug};
