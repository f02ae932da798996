//! Bounded boundary cache over a key-value store.

use serde::Serialize;

use super::policy::{EvictionPolicy, OldestHalf};
use super::store::{KeyValueStore, StorageError};
use crate::constants::DEFAULT_CACHE_NAMESPACE;
use crate::model::{BoundaryGeometry, RegionLevel, RegionPath};

/// Deterministic cache key for a region boundary.
///
/// `{namespace}{level}_{province}[_{district}][_{subdistrict}]`
pub fn cache_key(
    namespace: &str,
    level: RegionLevel,
    sido: &str,
    sigungu: Option<&str>,
    dong: Option<&str>,
) -> String {
    let mut key = format!("{namespace}{level}_{sido}");
    for part in [sigungu, dong].into_iter().flatten() {
        key.push('_');
        key.push_str(part);
    }
    key
}

/// Outcome of [`BoundaryCache::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    /// Stored after dropping `evicted` older entries
    StoredAfterEviction { evicted: usize },
    /// Not stored; the failure was logged
    Dropped,
}

/// Cache diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub count: usize,
    /// Sum of serialized entry lengths in bytes
    pub total_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub keys: Vec<String>,
}

/// Session-scoped boundary cache.
///
/// Entries are JSON-serialized [`BoundaryGeometry`] values stored under a
/// namespace prefix. Eviction removes the oldest inserted entries chosen by
/// the [`EvictionPolicy`]; reads do not refresh an entry's age.
#[derive(Debug)]
pub struct BoundaryCache<S, E = OldestHalf> {
    store: S,
    policy: E,
    namespace: String,
    max_entries: Option<usize>,
    hits: u64,
    misses: u64,
}

impl<S: KeyValueStore> BoundaryCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: OldestHalf,
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            max_entries: None,
            hits: 0,
            misses: 0,
        }
    }
}

impl<S: KeyValueStore, E: EvictionPolicy> BoundaryCache<S, E> {
    /// Replace the eviction policy.
    pub fn with_policy<P: EvictionPolicy>(self, policy: P) -> BoundaryCache<S, P> {
        BoundaryCache {
            store: self.store,
            policy,
            namespace: self.namespace,
            max_entries: self.max_entries,
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Bound the number of entries. Older entries are evicted before a put
    /// of a new key would exceed it. `Some(0)` disables storing.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Key for a region path in this cache's namespace.
    pub fn key_for(&self, path: &RegionPath) -> String {
        cache_key(
            &self.namespace,
            path.level(),
            path.province(),
            path.district(),
            path.subdistrict(),
        )
    }

    /// Look up a boundary. Unreadable entries count as a miss and are removed.
    pub fn get(&mut self, key: &str) -> Option<BoundaryGeometry> {
        let raw = match self.store.get_item(key) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("⚠️ Boundary cache read failed for {}: {}", key, e);
                None
            }
        };

        let Some(raw) = raw else {
            self.misses += 1;
            return None;
        };

        match serde_json::from_str::<BoundaryGeometry>(&raw) {
            Ok(geometry) => {
                self.hits += 1;
                log::debug!("💾 Boundary cache hit: {}", key);
                Some(geometry)
            }
            Err(e) => {
                log::warn!("⚠️ Dropping corrupt boundary cache entry {}: {}", key, e);
                if let Err(e) = self.store.remove_item(key) {
                    log::warn!("⚠️ Failed to remove {}: {}", key, e);
                }
                self.misses += 1;
                None
            }
        }
    }

    /// Store a boundary.
    ///
    /// On quota failure the policy's victims are evicted and the write is
    /// retried once. A second failure drops the entry.
    pub fn put(&mut self, key: &str, geometry: &BoundaryGeometry) -> PutOutcome {
        if self.max_entries == Some(0) {
            log::debug!("💾 Boundary cache disabled, not storing {}", key);
            return PutOutcome::Dropped;
        }
        let json = match serde_json::to_string(geometry) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("⚠️ Failed to serialize boundary {}: {}", key, e);
                return PutOutcome::Dropped;
            }
        };

        let mut evicted = self.make_room_for(key);

        match self.store.set_item(key, &json) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded) => {
                let victims = self.namespace_keys().map(|keys| self.policy.select_victims(&keys));
                evicted += self.remove_all(&victims.unwrap_or_default());
                log::info!("🧹 Boundary cache full, evicted {} entries", evicted);

                if let Err(e) = self.store.set_item(key, &json) {
                    log::warn!("⚠️ Boundary cache write for {} dropped: {}", key, e);
                    return PutOutcome::Dropped;
                }
            }
            Err(e) => {
                log::warn!("⚠️ Boundary cache write for {} dropped: {}", key, e);
                return PutOutcome::Dropped;
            }
        }

        log::debug!("💾 Cached boundary {} ({} bytes)", key, json.len());
        if evicted > 0 {
            PutOutcome::StoredAfterEviction { evicted }
        } else {
            PutOutcome::Stored
        }
    }

    /// Enforce `max_entries` before storing `key`. Returns the eviction count.
    fn make_room_for(&mut self, key: &str) -> usize {
        let Some(max) = self.max_entries else {
            return 0;
        };
        let Ok(keys) = self.namespace_keys() else {
            return 0;
        };
        if keys.iter().any(|k| k == key) || keys.len() < max {
            return 0;
        }

        let mut victims = self.policy.select_victims(&keys);
        if keys.len() - victims.len() >= max {
            // Policy freed too little; drop the oldest ones until the new entry fits
            let excess = keys.len() + 1 - max;
            victims = keys.into_iter().take(excess).collect();
        }
        let evicted = self.remove_all(&victims);
        log::debug!("🧹 Boundary cache at capacity ({}), evicted {}", max, evicted);
        evicted
    }

    fn remove_all(&mut self, keys: &[String]) -> usize {
        keys.iter()
            .filter(|key| match self.store.remove_item(key) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("⚠️ Failed to evict {}: {}", key, e);
                    false
                }
            })
            .count()
    }

    /// Keys in this namespace, oldest first.
    fn namespace_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(&self.namespace))
            .collect())
    }

    /// Remove every entry in this namespace. Returns the number removed.
    pub fn clear_all(&mut self) -> usize {
        let keys = match self.namespace_keys() {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("⚠️ Failed to list boundary cache: {}", e);
                return 0;
            }
        };
        let removed = self.remove_all(&keys);
        log::info!("🧹 Cleared {} boundary cache entries", removed);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let keys = self.namespace_keys().unwrap_or_default();
        let total_bytes = keys
            .iter()
            .filter_map(|key| self.store.get_item(key).ok().flatten())
            .map(|value| value.len())
            .sum();
        CacheStats {
            count: keys.len(),
            total_bytes,
            hits: self.hits,
            misses: self.misses,
            keys,
        }
    }
}
