//! Global constants used throughout the slimload codebase.
//!
//! Scan limits, store keys and the resolver's safety bound live here so the
//! numbers shared between the builder, the host adapters and the cache stay
//! in one place.

/// Maximum number of bytes of a plugin's main file read by the code scanner.
///
/// Full-file scans do not scale when every active plugin is scanned during a
/// request-triggered rebuild.
pub const CODE_SCAN_LIMIT: usize = 50_000;

/// Number of leading bytes searched for plugin header fields (8 KiB).
pub const HEADER_SCAN_LIMIT: usize = 8 * 1024;

/// Hard cap on resolver iterations.
///
/// Backstop for any cycle the circular-pair suppression fails to break.
pub const MAX_RESOLVE_ITERATIONS: usize = 1000;

/// Legacy single-file plugin whose slug does not follow the filename rule.
pub const LEGACY_PLUGIN_FILE: &str = "hello.php";

/// Slug assigned to [`LEGACY_PLUGIN_FILE`].
pub const LEGACY_PLUGIN_SLUG: &str = "hello-dolly";

/// Store key holding the serialized dependency map.
pub const DEPENDENCY_MAP_KEY: &str = "slimload_dependency_map";

/// Store key holding the serialized circular pair set.
pub const CIRCULAR_DEPENDENCIES_KEY: &str = "slimload_circular_dependencies";

/// Store key holding manual dependency edits.
pub const CUSTOM_DEPENDENCIES_KEY: &str = "slimload_custom_dependencies";

/// Store key holding the engine version that produced the cached data.
pub const VERSION_KEY: &str = "slimload_version";

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "slimload.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "SLIMLOAD_CONFIG";
