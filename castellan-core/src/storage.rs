//! Storage backends for [`crate::Cache`].
//!
//! Two backends ship, mirroring the two storage strategies used across the
//! teacher crate: a `parking_lot::RwLock`-guarded `HashMap` (the baseline,
//! grounded on `GlobalCache`) and a `DashMap` (grounded on
//! `AsyncGlobalCache`) that shards its locking for better throughput under
//! contention at the cost of slightly coarser iteration snapshots.

use std::collections::HashMap;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::entry::CacheEntry;

/// Storage is kept separate from eviction/listener/stat bookkeeping so both
/// backends can share the rest of [`crate::Cache`]'s logic untouched.
pub trait Backend<V: Clone>: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry<V>>;
    fn insert(&self, key: String, entry: CacheEntry<V>) -> Option<CacheEntry<V>>;
    fn remove(&self, key: &str) -> Option<CacheEntry<V>>;
    fn contains_key(&self, key: &str) -> bool;
    fn len(&self) -> usize;
    fn clear(&self);
    /// Updates an entry's access metadata in place, returning a clone of the
    /// value if present and not expired as of `now`. Returns `None` without
    /// mutating anything if the entry is missing or already expired.
    fn touch(&self, key: &str, now: Instant) -> Option<V>;
    /// Snapshot of all keys whose entries are expired as of `now`.
    fn expired_keys(&self, now: Instant) -> Vec<String>;
    /// Snapshot of the full live (non-expired) map.
    fn as_map(&self, now: Instant) -> HashMap<String, V>;
}

#[derive(Default)]
pub struct RwLockBackend<V> {
    map: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> RwLockBackend<V> {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Send + Sync + Clone> Backend<V> for RwLockBackend<V> {
    fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.map.read().get(key).cloned()
    }

    fn insert(&self, key: String, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        self.map.write().insert(key, entry)
    }

    fn remove(&self, key: &str) -> Option<CacheEntry<V>> {
        self.map.write().remove(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.map.read().contains_key(key)
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }

    fn clear(&self) {
        self.map.write().clear();
    }

    fn touch(&self, key: &str, now: Instant) -> Option<V> {
        let mut map = self.map.write();
        match map.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch();
                Some(entry.value().clone())
            }
            _ => None,
        }
    }

    fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.map
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn as_map(&self, now: Instant) -> HashMap<String, V> {
        self.map
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(k, entry)| (k.clone(), entry.value().clone()))
            .collect()
    }
}

#[derive(Default)]
pub struct DashMapBackend<V> {
    map: DashMap<String, CacheEntry<V>>,
}

impl<V> DashMapBackend<V> {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }
}

impl<V: Send + Sync + Clone> Backend<V> for DashMapBackend<V> {
    fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.map.get(key).map(|e| e.clone())
    }

    fn insert(&self, key: String, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        self.map.insert(key, entry)
    }

    fn remove(&self, key: &str) -> Option<CacheEntry<V>> {
        self.map.remove(key).map(|(_, v)| v)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn touch(&self, key: &str, now: Instant) -> Option<V> {
        match self.map.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.touch();
                Some(entry.value().clone())
            }
            _ => None,
        }
    }

    fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.map
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn as_map(&self, now: Instant) -> HashMap<String, V> {
        self.map
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| (entry.key().clone(), entry.value().value().clone()))
            .collect()
    }
}
