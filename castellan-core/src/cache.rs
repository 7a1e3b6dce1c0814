//! The concurrent cache instance.
//!
//! Grounded on the teacher's `GlobalCache` (read path: lookup, expiry check,
//! touch, stats; write path: insert, eviction dispatch) and `AsyncGlobalCache`
//! (DashMap-backed concurrent storage), generalized from their static-`Lazy`
//! globals into an owned, `Arc`-shared handle so the manager (§4.5) can create
//! and destroy caches by name at runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::CacheConfiguration;
use crate::entry::CacheEntry;
use crate::error::{CacheError, CacheResult};
use crate::eviction::{self, EvictionStrategy};
use crate::listener::{ListenerId, ListenerList, RemovalCause, RemovalEvent};
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::storage::{Backend, DashMapBackend, RwLockBackend};

const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);
const CLOSE_SHUTDOWN_WINDOW: Duration = Duration::from_secs(5);

struct Inner<V> {
    name: String,
    config: CacheConfiguration,
    backend: Box<dyn Backend<V>>,
    strategy: Box<dyn EvictionStrategy>,
    stats: CacheStats,
    listeners: ListenerList,
    closed: AtomicBool,
    cleanup_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// A named, thread-safe cache instance.
///
/// Cheap to clone: clones share the same storage, statistics, and listener
/// list through an internal `Arc`.
pub struct Cache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + Sync + Clone + 'static> Cache<V> {
    fn new_with_backend(config: CacheConfiguration, backend: Box<dyn Backend<V>>) -> CacheResult<Self> {
        config.validate()?;
        let strategy = eviction::for_policy(config.eviction_policy);
        let cache = Self {
            inner: Arc::new(Inner {
                name: config.name.clone(),
                config,
                backend,
                strategy,
                stats: CacheStats::new(),
                listeners: ListenerList::new(),
                closed: AtomicBool::new(false),
                cleanup_task: Mutex::new(None),
            }),
        };
        cache.spawn_periodic_cleanup();
        Ok(cache)
    }

    /// Reference-provider backend: a `parking_lot::RwLock`-guarded `HashMap`.
    pub fn new(config: CacheConfiguration) -> CacheResult<Self> {
        Self::new_with_backend(config, Box::new(RwLockBackend::new()))
    }

    /// Concurrent-provider backend: a sharded `DashMap`.
    pub fn new_concurrent(config: CacheConfiguration) -> CacheResult<Self> {
        Self::new_with_backend(config, Box::new(DashMapBackend::new()))
    }

    fn spawn_periodic_cleanup(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let weak_name = self.inner.name.clone();
        let handle_cache = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(DEFAULT_CLEANUP_INTERVAL);
            loop {
                ticker.tick().await;
                if handle_cache.is_closed() {
                    break;
                }
                let removed = handle_cache.cleanup_expired();
                if removed > 0 {
                    tracing::debug!(cache = %weak_name, removed, "periodic expiration sweep");
                }
            }
        });
        *self.inner.cleanup_task.lock() = Some(task);
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &CacheConfiguration {
        &self.inner.config
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.is_closed() {
            Err(CacheError::ClosedCache(self.inner.name.clone()))
        } else {
            Ok(())
        }
    }

    fn fire_removal(&self, key: &str, cause: RemovalCause) {
        self.inner.strategy.on_remove(key);
        self.inner.listeners.notify(&RemovalEvent {
            cache_name: self.inner.name.clone(),
            key: key.to_string(),
            cause,
            at: std::time::SystemTime::now(),
        });
    }

    /// Removes `key` if its entry is expired as of `now`. Returns `true` if removed.
    fn expire_if_needed(&self, key: &str, now: Instant) -> bool {
        if let Some(entry) = self.inner.backend.get(key) {
            if entry.is_expired(now) {
                self.inner.backend.remove(key);
                self.fire_removal(key, RemovalCause::Expired);
                return true;
            }
        }
        false
    }

    pub fn get(&self, key: &str) -> CacheResult<Option<V>> {
        self.ensure_open()?;
        let now = Instant::now();
        if self.expire_if_needed(key, now) {
            #[cfg(feature = "stats")]
            if self.inner.config.record_stats {
                self.inner.stats.record_miss();
            }
            return Ok(None);
        }
        match self.inner.backend.touch(key, now) {
            Some(value) => {
                self.inner.strategy.on_access(key);
                #[cfg(feature = "stats")]
                if self.inner.config.record_stats {
                    self.inner.stats.record_hit();
                }
                Ok(Some(value))
            }
            None => {
                #[cfg(feature = "stats")]
                if self.inner.config.record_stats {
                    self.inner.stats.record_miss();
                }
                Ok(None)
            }
        }
    }

    /// Read-through `get`: on a miss, invokes `loader`, timing it into the
    /// `loads`/`load_time_ns` counters, and publishes a non-null result
    /// before returning it.
    pub fn get_with<F>(&self, key: &str, loader: F) -> CacheResult<Option<V>>
    where
        F: FnOnce() -> CacheResult<Option<V>>,
    {
        if let Some(value) = self.get(key)? {
            return Ok(Some(value));
        }
        let start = Instant::now();
        let loaded = loader();
        #[cfg(feature = "stats")]
        if self.inner.config.record_stats {
            self.inner.stats.record_load(start.elapsed().as_nanos() as u64);
        }
        match loaded {
            Ok(Some(value)) => {
                self.put(key.to_string(), value.clone())?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn put(&self, key: String, value: V) -> CacheResult<()> {
        self.put_with_ttl(key, value, None)
    }

    pub fn put_with_ttl(&self, key: String, value: V, ttl: Option<Duration>) -> CacheResult<()> {
        self.ensure_open()?;
        let max_size = self.inner.config.max_size;
        let already_present = self.inner.backend.contains_key(&key);
        if !already_present && self.inner.backend.len() as u64 >= max_size {
            match self.inner.strategy.select_victim() {
                Some(victim) => {
                    self.inner.backend.remove(&victim);
                    self.fire_removal(&victim, RemovalCause::Size);
                    #[cfg(feature = "stats")]
                    if self.inner.config.record_stats {
                        self.inner.stats.record_eviction();
                    }
                }
                None => {
                    // NONE policy, or no victim found: full cache silently
                    // rejects the new key; existing keys still overwrite above.
                    return Ok(());
                }
            }
        }
        let effective_ttl = self.inner.config.effective_ttl(ttl);
        let entry = CacheEntry::new(value, effective_ttl);
        let previous = self.inner.backend.insert(key.clone(), entry);
        self.inner.strategy.on_put(&key);
        if previous.is_some() {
            self.inner
                .listeners
                .notify(&RemovalEvent {
                    cache_name: self.inner.name.clone(),
                    key,
                    cause: RemovalCause::Replaced,
                    at: std::time::SystemTime::now(),
                });
        }
        Ok(())
    }

    pub fn put_if_absent(&self, key: String, value: V) -> CacheResult<Option<V>> {
        self.ensure_open()?;
        if let Some(existing) = self.get(&key)? {
            return Ok(Some(existing));
        }
        self.put(key, value)?;
        Ok(None)
    }

    pub fn remove(&self, key: &str) -> CacheResult<Option<V>> {
        self.ensure_open()?;
        match self.inner.backend.remove(key) {
            Some(entry) => {
                self.fire_removal(key, RemovalCause::Explicit);
                Ok(Some(entry.into_value()))
            }
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &str) -> CacheResult<bool> {
        self.ensure_open()?;
        let now = Instant::now();
        if self.expire_if_needed(key, now) {
            return Ok(false);
        }
        Ok(self.inner.backend.contains_key(key))
    }

    pub fn as_map(&self) -> CacheResult<HashMap<String, V>> {
        self.ensure_open()?;
        Ok(self.inner.backend.as_map(Instant::now()))
    }

    pub fn size(&self) -> usize {
        self.inner.backend.len()
    }

    pub fn estimated_size(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn clear(&self) -> CacheResult<()> {
        self.ensure_open()?;
        self.inner.backend.clear();
        self.inner.strategy.clear();
        Ok(())
    }

    pub fn get_all(&self, keys: &[String]) -> CacheResult<HashMap<String, V>> {
        self.ensure_open()?;
        let mut result = HashMap::new();
        for key in keys {
            if let Some(value) = self.get(key)? {
                result.insert(key.clone(), value);
            }
        }
        Ok(result)
    }

    pub fn put_all(&self, entries: HashMap<String, V>) -> CacheResult<()> {
        self.ensure_open()?;
        for (key, value) in entries {
            // A single failure does not roll back prior insertions.
            let _ = self.put(key, value);
        }
        Ok(())
    }

    pub fn remove_all(&self, keys: &[String]) -> CacheResult<()> {
        self.ensure_open()?;
        for key in keys {
            let _ = self.remove(key);
        }
        Ok(())
    }

    pub fn evict(&self, key: &str) -> CacheResult<()> {
        self.remove(key).map(|_| ())
    }

    pub fn evict_all<F>(&self, predicate: F) -> CacheResult<()>
    where
        F: Fn(&str) -> bool,
    {
        self.ensure_open()?;
        let keys: Vec<String> = self
            .inner
            .backend
            .as_map(Instant::now())
            .into_keys()
            .filter(|k| predicate(k))
            .collect();
        self.remove_all(&keys)
    }

    /// Removes every entry whose TTL has expired. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let expired = self.inner.backend.expired_keys(now);
        for key in &expired {
            self.inner.backend.remove(key);
            self.fire_removal(key, RemovalCause::Expired);
        }
        expired.len()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.inner.stats.snapshot(self.size() as u64)
    }

    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RemovalEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.inner.listeners.remove(id);
    }

    /// Async get, offloaded to the blocking pool so the cache's own critical
    /// sections never hold across an `.await`.
    pub async fn get_async(&self, key: String) -> CacheResult<Option<V>> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.get(&key))
            .await
            .map_err(|_| CacheError::Cancelled)?
    }

    pub async fn put_async(&self, key: String, value: V) -> CacheResult<()> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.put(key, value))
            .await
            .map_err(|_| CacheError::Cancelled)?
    }

    pub async fn remove_async(&self, key: String) -> CacheResult<Option<V>> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.remove(&key))
            .await
            .map_err(|_| CacheError::Cancelled)?
    }

    /// Synchronous close: marks the cache closed and clears all state so
    /// further mutating calls fail fast. Idempotent.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.backend.clear();
        self.inner.strategy.clear();
        self.inner.listeners.clear();
        if let Some(task) = self.inner.cleanup_task.lock().take() {
            task.abort();
        }
    }

    /// Closes the cache and waits (bounded) for the periodic cleanup task to
    /// actually stop, logging if the shutdown window is exceeded.
    pub async fn close_and_wait(&self) {
        let task = {
            let mut guard = self.inner.cleanup_task.lock();
            guard.take()
        };
        self.inner.closed.store(true, Ordering::AcqRel);
        self.inner.backend.clear();
        self.inner.strategy.clear();
        self.inner.listeners.clear();
        if let Some(task) = task {
            task.abort();
            if tokio::time::timeout(CLOSE_SHUTDOWN_WINDOW, task).await.is_err() {
                tracing::warn!(cache = %self.inner.name, "cleanup task did not stop within the shutdown window");
            }
        }
    }
}

/// `put` variants that give `allow_null_values` force. Rust's generic `V`
/// carries no universal notion of "null"; `Option<T>` is the one shape where
/// it is concretely representable, so the check only applies there.
impl<T: Send + Sync + Clone + 'static> Cache<Option<T>> {
    pub fn put_nullable(&self, key: String, value: Option<T>) -> CacheResult<()> {
        self.put_nullable_with_ttl(key, value, None)
    }

    pub fn put_nullable_with_ttl(
        &self,
        key: String,
        value: Option<T>,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        if value.is_none() && !self.inner.config.allow_null_values {
            return Err(CacheError::InvalidValue(self.inner.name.clone()));
        }
        self.put_with_ttl(key, value, ttl)
    }
}
