//! Integration test suite for slimload
//!
//! End-to-end tests over real plugin directories on disk: graph building
//! through the filesystem host, persistence in the file store and the
//! command-line interface.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **build**: Map construction from a plugins directory
//! - **persistence**: File store, cache reuse and invalidation
//! - **cli**: Command-line behaviour and output formats

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod build;
mod cli;
mod persistence;
