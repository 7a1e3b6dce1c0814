//! Cache manager: registry of providers and named caches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::Cache;
use crate::config::{CacheConfiguration, EvictionPolicy};
use crate::error::{CacheError, CacheResult};
use crate::provider::{CacheProvider, ConcurrentProvider, ReferenceProvider};
use crate::stats::CacheStatsSnapshot;

/// Aggregate statistics across every cache a manager tracks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerStats {
    pub totals: CacheStatsSnapshot,
    pub cache_count: usize,
    pub provider_count: usize,
    pub closed: bool,
}

impl ManagerStats {
    pub fn hit_rate(&self) -> f64 {
        self.totals.hit_rate()
    }
}

/// Registry of providers and named caches, with global-default merging
/// (§4.5): a caller's `CacheConfiguration` wins field-by-field over the
/// manager's global configuration only when the cache is requested under the
/// reserved name `"default"`.
pub struct CacheManager<V> {
    providers: RwLock<HashMap<String, Arc<dyn CacheProvider<V>>>>,
    default_provider: String,
    global_config: RwLock<CacheConfiguration>,
    registry: RwLock<HashMap<String, (String, Cache<V>)>>,
    closed: AtomicBool,
}

impl<V: Send + Sync + Clone + 'static> CacheManager<V> {
    /// Builds a manager with the reference provider registered as default and
    /// the concurrent provider available under the name `"HighPerf"`.
    pub fn new() -> Self {
        let mut providers: HashMap<String, Arc<dyn CacheProvider<V>>> = HashMap::new();
        let reference = Arc::new(ReferenceProvider::<V>::default());
        let concurrent = Arc::new(ConcurrentProvider::<V>::default());
        providers.insert(reference.provider_name().to_string(), reference.clone());
        providers.insert(concurrent.provider_name().to_string(), concurrent);
        Self {
            default_provider: reference.provider_name().to_string(),
            providers: RwLock::new(providers),
            global_config: RwLock::new(CacheConfiguration::default()),
            registry: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn register_provider(&self, provider: Arc<dyn CacheProvider<V>>) {
        self.providers
            .write()
            .insert(provider.provider_name().to_string(), provider);
    }

    pub fn set_global_config(&self, config: CacheConfiguration) {
        *self.global_config.write() = config;
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::ClosedManager)
        } else {
            Ok(())
        }
    }

    /// Acquires (creating if absent) the named cache on the default provider.
    pub fn get(&self, name: &str, config: CacheConfiguration) -> CacheResult<Cache<V>> {
        self.get_with_provider(name, &self.default_provider.clone(), config)
    }

    pub fn get_with_provider(
        &self,
        name: &str,
        provider_name: &str,
        config: CacheConfiguration,
    ) -> CacheResult<Cache<V>> {
        self.ensure_open()?;
        let registry_key = format!("{provider_name}:{name}");
        if let Some((_, cache)) = self.registry.read().get(&registry_key) {
            return Ok(cache.clone());
        }
        let provider = self
            .providers
            .read()
            .get(provider_name)
            .cloned()
            .ok_or_else(|| {
                CacheError::InvalidArgument(format!("unknown cache provider `{provider_name}`"))
            })?;
        let merged = CacheConfiguration::merge(&config, &self.global_config.read());
        let cache = provider.create_cache(merged)?;
        self.registry
            .write()
            .insert(registry_key, (provider_name.to_string(), cache.clone()));
        Ok(cache)
    }

    pub fn destroy(&self, name: &str) -> CacheResult<()> {
        self.destroy_with_provider(name, &self.default_provider.clone())
    }

    pub fn destroy_with_provider(&self, name: &str, provider_name: &str) -> CacheResult<()> {
        let registry_key = format!("{provider_name}:{name}");
        if let Some((provider_name, _)) = self.registry.write().remove(&registry_key) {
            if let Some(provider) = self.providers.read().get(&provider_name) {
                provider.destroy_cache(name)?;
            }
        }
        Ok(())
    }

    pub fn get_all_stats(&self) -> HashMap<String, CacheStatsSnapshot> {
        self.registry
            .read()
            .iter()
            .map(|(key, (_, cache))| (key.clone(), cache.stats()))
            .collect()
    }

    pub fn get_manager_stats(&self) -> ManagerStats {
        let registry = self.registry.read();
        let totals = registry
            .values()
            .map(|(_, cache)| cache.stats())
            .fold(CacheStatsSnapshot::default(), |acc, snap| acc.combine(&snap));
        ManagerStats {
            totals,
            cache_count: registry.len(),
            provider_count: self.providers.read().len(),
            closed: self.closed.load(Ordering::Acquire),
        }
    }

    pub fn reset_all_stats(&self) {
        for (_, cache) in self.registry.read().values() {
            cache.reset_stats();
        }
    }

    pub fn cleanup_all(&self) -> usize {
        self.registry
            .read()
            .values()
            .map(|(_, cache)| cache.cleanup_expired())
            .sum()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for (_, cache) in self.registry.write().drain() {
            cache.1.close();
        }
        for provider in self.providers.read().values() {
            provider.close();
        }
    }

    /// Starts a fluent builder for acquiring a cache with explicit
    /// configuration. Takes `&Arc<Self>` rather than `&self` because the
    /// builder outlives this call and needs its own owning reference to the
    /// manager.
    pub fn builder(manager: &Arc<Self>, name: impl Into<String>) -> CacheBuilder<V> {
        CacheBuilder {
            manager: Arc::clone(manager),
            name: name.into(),
            config: CacheConfiguration::default(),
            provider: None,
        }
    }
}

impl<V: Send + Sync + Clone + 'static> Default for CacheManager<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent builder for acquiring a cache from a [`CacheManager`], one setter
/// per [`CacheConfiguration`] field plus an optional provider selector.
pub struct CacheBuilder<V> {
    manager: Arc<CacheManager<V>>,
    name: String,
    config: CacheConfiguration,
    provider: Option<String>,
}

impl<V: Send + Sync + Clone + 'static> CacheBuilder<V> {
    pub fn max_size(mut self, value: u64) -> Self {
        self.config.max_size = value;
        self
    }

    pub fn default_ttl(mut self, value: Duration) -> Self {
        self.config.default_ttl = Some(value);
        self
    }

    pub fn max_idle(mut self, value: Duration) -> Self {
        self.config.max_idle = Some(value);
        self
    }

    pub fn expire_after_write(mut self, value: Duration) -> Self {
        self.config.expire_after_write = Some(value);
        self
    }

    pub fn expire_after_access(mut self, value: Duration) -> Self {
        self.config.expire_after_access = Some(value);
        self
    }

    pub fn refresh_after_write(mut self, value: Duration) -> Self {
        self.config.refresh_after_write = Some(value);
        self
    }

    pub fn record_stats(mut self, value: bool) -> Self {
        self.config.record_stats = value;
        self
    }

    pub fn allow_null_values(mut self, value: bool) -> Self {
        self.config.allow_null_values = value;
        self
    }

    pub fn eviction_policy(mut self, value: EvictionPolicy) -> Self {
        self.config.eviction_policy = value;
        self
    }

    pub fn concurrency_level(mut self, value: u16) -> Self {
        self.config.concurrency_level = value;
        self
    }

    pub fn weak_keys(mut self, value: bool) -> Self {
        self.config.weak_keys = value;
        self
    }

    pub fn weak_values(mut self, value: bool) -> Self {
        self.config.weak_values = value;
        self
    }

    pub fn soft_values(mut self, value: bool) -> Self {
        self.config.soft_values = value;
        self
    }

    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.provider = Some(name.into());
        self
    }

    pub fn build(self) -> CacheResult<Cache<V>> {
        self.config.validate()?;
        let mut config = self.config;
        config.name = self.name.clone();
        match self.provider {
            Some(provider) => self.manager.get_with_provider(&self.name, &provider, config),
            None => self.manager.get(&self.name, config),
        }
    }
}
