//! Cache providers: factories that instantiate caches of one implementation
//! family and own their lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::cache::Cache;
use crate::config::CacheConfiguration;
use crate::error::{CacheError, CacheResult};

/// Observability snapshot for one provider.
#[derive(Debug, Clone)]
pub struct ProviderStats {
    pub provider_name: String,
    pub cache_count: usize,
    pub closed: bool,
    pub cache_names: Vec<String>,
}

/// A named family of cache instances, all constructed the same way.
pub trait CacheProvider<V>: Send + Sync {
    fn provider_name(&self) -> &str;
    fn create_cache(&self, config: CacheConfiguration) -> CacheResult<Cache<V>>;
    fn get_cache(&self, name: &str) -> Option<Cache<V>>;
    fn destroy_cache(&self, name: &str) -> CacheResult<()>;
    fn cache_names(&self) -> Vec<String>;
    fn is_closed(&self) -> bool;
    fn close(&self);
    fn stats(&self) -> ProviderStats {
        ProviderStats {
            provider_name: self.provider_name().to_string(),
            cache_count: self.cache_names().len(),
            closed: self.is_closed(),
            cache_names: self.cache_names(),
        }
    }
}

struct ProviderState<V> {
    caches: RwLock<HashMap<String, Cache<V>>>,
    closed: AtomicBool,
}

impl<V> Default for ProviderState<V> {
    fn default() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }
}

/// Baseline provider: `parking_lot::RwLock`-guarded `HashMap` storage per
/// cache, grounded on the teacher's `GlobalCache`.
pub struct ReferenceProvider<V> {
    state: ProviderState<V>,
}

impl<V> Default for ReferenceProvider<V> {
    fn default() -> Self {
        Self {
            state: ProviderState::default(),
        }
    }
}

impl<V: Send + Sync + Clone + 'static> CacheProvider<V> for ReferenceProvider<V> {
    fn provider_name(&self) -> &str {
        "ReferenceImpl"
    }

    fn create_cache(&self, config: CacheConfiguration) -> CacheResult<Cache<V>> {
        if self.state.closed.load(Ordering::Acquire) {
            return Err(CacheError::ClosedManager);
        }
        let name = config.name.clone();
        let cache = Cache::new(config)?;
        self.state.caches.write().insert(name, cache.clone());
        Ok(cache)
    }

    fn get_cache(&self, name: &str) -> Option<Cache<V>> {
        self.state.caches.read().get(name).cloned()
    }

    fn destroy_cache(&self, name: &str) -> CacheResult<()> {
        if let Some(cache) = self.state.caches.write().remove(name) {
            cache.close();
        }
        Ok(())
    }

    fn cache_names(&self) -> Vec<String> {
        self.state.caches.read().keys().cloned().collect()
    }

    fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for cache in self.state.caches.write().values() {
            cache.close();
        }
    }
}

/// Higher-throughput provider: `DashMap`-backed caches, grounded on the
/// teacher's `AsyncGlobalCache`.
pub struct ConcurrentProvider<V> {
    state: ProviderState<V>,
}

impl<V> Default for ConcurrentProvider<V> {
    fn default() -> Self {
        Self {
            state: ProviderState::default(),
        }
    }
}

impl<V: Send + Sync + Clone + 'static> CacheProvider<V> for ConcurrentProvider<V> {
    fn provider_name(&self) -> &str {
        "HighPerf"
    }

    fn create_cache(&self, config: CacheConfiguration) -> CacheResult<Cache<V>> {
        if self.state.closed.load(Ordering::Acquire) {
            return Err(CacheError::ClosedManager);
        }
        let name = config.name.clone();
        let cache = Cache::new_concurrent(config)?;
        self.state.caches.write().insert(name, cache.clone());
        Ok(cache)
    }

    fn get_cache(&self, name: &str) -> Option<Cache<V>> {
        self.state.caches.read().get(name).cloned()
    }

    fn destroy_cache(&self, name: &str) -> CacheResult<()> {
        if let Some(cache) = self.state.caches.write().remove(name) {
            cache.close();
        }
        Ok(())
    }

    fn cache_names(&self) -> Vec<String> {
        self.state.caches.read().keys().cloned().collect()
    }

    fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for cache in self.state.caches.write().values() {
            cache.close();
        }
    }
}
