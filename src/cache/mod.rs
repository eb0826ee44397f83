//! Two-layer cache for the built dependency map.
//!
//! [`MapCache`] keeps a process-lifetime copy of the map in memory in front
//! of a durable [`KeyValueStore`]. Reads are served from the fastest layer
//! that has a usable copy; writes go to both layers; invalidation clears both.
//!
//! # Lifecycle
//!
//! 1. First access: memory is empty, the store is read and, if the blob is
//!    well-formed and was built for the same active plugin set, it fills the
//!    memory layer.
//! 2. Miss: the caller rebuilds and calls [`MapCache::set`].
//! 3. Plugin activated, deactivated or upgraded, or an explicit rebuild:
//!    [`MapCache::invalidate`] drops both layers; the next access rebuilds.
//!
//! Every read failure fails closed. An unreadable or malformed blob is treated
//! as absent and logged, never surfaced as an error. Failed writes are logged
//! and the in-memory copy is still served.

pub mod lock;
pub mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CIRCULAR_DEPENDENCIES_KEY, CUSTOM_DEPENDENCIES_KEY, DEPENDENCY_MAP_KEY, VERSION_KEY};
use crate::graph::builder::CustomEdits;
use crate::graph::{CircularPairSet, DependencyMap};

/// Current layout of the persisted map blob.
const PERSISTED_FORMAT: u32 = 1;

/// A built map together with the data needed to serve it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMap {
    /// The dependency map.
    pub map: DependencyMap,
    /// Circular pairs found when the map was built.
    pub circular: CircularPairSet,
    /// Fingerprint of the active plugin set the map was built for.
    pub fingerprint: String,
    /// Build time.
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedMap {
    format: u32,
    fingerprint: String,
    built_at: DateTime<Utc>,
    plugins: DependencyMap,
}

/// In-memory layer over a durable store.
#[derive(Debug)]
pub struct MapCache<S> {
    store: S,
    memory: Option<CachedMap>,
}

impl<S: KeyValueStore> MapCache<S> {
    /// Create a cache with an empty memory layer.
    pub fn new(store: S) -> Self {
        Self {
            store,
            memory: None,
        }
    }

    /// The durable layer.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// True when the memory layer holds a map.
    pub fn is_warm(&self) -> bool {
        self.memory.is_some()
    }

    /// Cached map for the active set identified by `fingerprint`.
    ///
    /// Checks memory, then the store. A copy built for a different active set
    /// counts as a miss.
    pub fn get(&mut self, fingerprint: &str) -> Option<&CachedMap> {
        if self.memory.as_ref().is_some_and(|m| m.fingerprint != fingerprint) {
            tracing::debug!("In-memory dependency map is stale, discarding");
            self.memory = None;
        }

        if self.memory.is_none() {
            self.memory = self.load_persisted(fingerprint);
        }

        self.memory.as_ref()
    }

    /// Store `cached` in both layers.
    pub fn set(&mut self, cached: CachedMap) {
        self.persist(&cached);
        self.memory = Some(cached);
    }

    /// Drop both layers.
    pub fn invalidate(&mut self) {
        self.memory = None;
        for key in [DEPENDENCY_MAP_KEY, CIRCULAR_DEPENDENCIES_KEY] {
            if let Err(e) = self.store.delete(key) {
                tracing::warn!("Failed to clear cached {}: {:#}", key, e);
            }
        }
    }

    fn load_persisted(&self, fingerprint: &str) -> Option<CachedMap> {
        let raw_map = self.read_key(DEPENDENCY_MAP_KEY)?;
        let persisted: PersistedMap = match serde_json::from_str(&raw_map) {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!("Cached dependency map is malformed, rebuilding: {}", e);
                return None;
            }
        };

        if persisted.format != PERSISTED_FORMAT {
            tracing::debug!("Cached dependency map has format {}, rebuilding", persisted.format);
            return None;
        }
        if persisted.fingerprint != fingerprint {
            tracing::debug!("Cached dependency map was built for a different plugin set");
            return None;
        }

        let circular: CircularPairSet = match self.read_key(CIRCULAR_DEPENDENCIES_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(pairs) => pairs,
                Err(e) => {
                    tracing::warn!("Cached circular dependencies are malformed, rebuilding: {}", e);
                    return None;
                }
            },
            None => return None,
        };

        let mut map = persisted.plugins;
        map.normalize();

        tracing::debug!("Loaded dependency map with {} plugins from store", map.len());
        Some(CachedMap {
            map,
            circular,
            fingerprint: persisted.fingerprint,
            built_at: persisted.built_at,
        })
    }

    fn persist(&self, cached: &CachedMap) {
        let persisted = PersistedMap {
            format: PERSISTED_FORMAT,
            fingerprint: cached.fingerprint.clone(),
            built_at: cached.built_at,
            plugins: cached.map.clone(),
        };

        let blobs = serde_json::to_string(&persisted)
            .and_then(|map| serde_json::to_string(&cached.circular).map(|pairs| (map, pairs)));

        match blobs {
            Ok((map, pairs)) => {
                self.write_key(DEPENDENCY_MAP_KEY, &map);
                self.write_key(CIRCULAR_DEPENDENCIES_KEY, &pairs);
            }
            Err(e) => tracing::warn!("Failed to serialize dependency map: {}", e),
        }
    }

    /// Persisted manual edits, empty when absent or malformed.
    pub fn custom_edits(&self) -> CustomEdits {
        match self.read_key(CUSTOM_DEPENDENCIES_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Stored custom dependencies are malformed, ignoring: {}", e);
                CustomEdits::default()
            }),
            None => CustomEdits::default(),
        }
    }

    /// Persist manual edits.
    pub fn save_custom_edits(&self, edits: &CustomEdits) -> anyhow::Result<()> {
        let raw = serde_json::to_string(edits)?;
        self.store.set(CUSTOM_DEPENDENCIES_KEY, &raw)
    }

    /// Engine version recorded with the cached data.
    pub fn stored_version(&self) -> Option<String> {
        self.read_key(VERSION_KEY).map(|v| v.trim().to_string())
    }

    /// Record the engine version.
    pub fn save_version(&self, version: &str) {
        self.write_key(VERSION_KEY, version);
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {} from store: {:#}", key, e);
                None
            }
        }
    }

    fn write_key(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to write {} to store: {:#}", key, e);
        }
    }
}
