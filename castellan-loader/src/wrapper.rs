//! The cached loader wrapper (§4.6): renders an arbitrary [`Loader`]
//! cache-aware with read-through, write-through, and negative caching.

use std::time::Duration;

use castellan_core::{Cache, CacheConfiguration, CacheStatsSnapshot, KeyGenerator};
use futures::Stream;

use crate::collector::{collect, CollectorOptions};
use crate::error::LoaderError;
use crate::loader::Loader;

/// Negative entries default to a tenth of the positive cache's size and a
/// fifth of its TTL (design choice: 5 minutes vs. 30 minutes when the
/// positive cache carries no explicit TTL of its own).
const NEGATIVE_SIZE_RATIO: u64 = 10;
const DEFAULT_POSITIVE_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(5 * 60);

/// Aggregated statistics across a wrapper's positive and negative caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderCacheStats {
    pub positive: CacheStatsSnapshot,
    pub negative: CacheStatsSnapshot,
}

/// Adapts `L` to be cache-aware. For every key, at most one of the positive
/// cache and the negative cache holds a live entry after any single
/// operation on this wrapper completes.
pub struct CachedLoader<L, K>
where
    L: Loader,
    K: KeyGenerator<L::Id, L::Item, L::Params>,
{
    loader: L,
    key_gen: K,
    positive: Cache<L::Item>,
    negative: Cache<()>,
    negative_caching_enabled: bool,
}

impl<L, K> CachedLoader<L, K>
where
    L: Loader,
    L::Item: 'static,
    K: KeyGenerator<L::Id, L::Item, L::Params>,
{
    pub fn new(
        loader: L,
        key_gen: K,
        mut positive_config: CacheConfiguration,
        negative_caching_enabled: bool,
    ) -> Result<Self, LoaderError<L::Error>> {
        if positive_config.default_ttl.is_none() {
            positive_config.default_ttl = Some(DEFAULT_POSITIVE_TTL);
        }
        let mut negative_config = CacheConfiguration::named(format!("{}:negative", positive_config.name));
        negative_config.max_size = (positive_config.max_size / NEGATIVE_SIZE_RATIO).max(1);
        negative_config.default_ttl = Some(DEFAULT_NEGATIVE_TTL);
        negative_config.eviction_policy = positive_config.eviction_policy;

        let positive = Cache::new(positive_config)?;
        let negative = Cache::new(negative_config)?;
        Ok(Self {
            loader,
            key_gen,
            positive,
            negative,
            negative_caching_enabled,
        })
    }

    pub fn positive_cache(&self) -> &Cache<L::Item> {
        &self.positive
    }

    pub fn negative_cache(&self) -> &Cache<()> {
        &self.negative
    }

    pub async fn find_by_id(&self, id: Option<&L::Id>) -> Result<Option<L::Item>, LoaderError<L::Error>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let key = self.key_gen.by_id(Some(id));

        if let Some(hit) = self.positive.get(&key)? {
            return Ok(Some(hit));
        }
        if self.negative_caching_enabled && self.negative.contains_key(&key)? {
            return Ok(None);
        }

        match self.loader.find_by_id(id).await? {
            Some(item) => {
                if let Err(e) = self.positive.put(key, item.clone()) {
                    tracing::warn!(error = %e, "failed to publish loaded item to cache");
                }
                Ok(Some(item))
            }
            None => {
                if self.negative_caching_enabled {
                    if let Err(e) = self.negative.put(key, ()) {
                        tracing::warn!(error = %e, "failed to record negative cache entry");
                    }
                }
                Ok(None)
            }
        }
    }

    /// Identical control flow to [`Self::find_by_id`]; kept as a distinct
    /// name for interface parity with callers that distinguish sync/async
    /// entry points even though this wrapper is async throughout.
    pub async fn find_by_id_async(&self, id: Option<&L::Id>) -> Result<Option<L::Item>, LoaderError<L::Error>> {
        self.find_by_id(id).await
    }

    pub async fn save(&self, item: L::Item, params: &L::Params) -> Result<L::Item, LoaderError<L::Error>> {
        let saved = self.loader.save(item, params).await?;
        let key = self.key_gen.for_item(&saved, params);
        if let Err(e) = self.positive.put(key.clone(), saved.clone()) {
            tracing::warn!(error = %e, "failed to publish saved item to cache");
        }
        if let Err(e) = self.negative.remove(&key) {
            tracing::warn!(error = %e, "failed to clear negative cache entry after save");
        }
        Ok(saved)
    }

    pub async fn save_async(&self, item: L::Item, params: &L::Params) -> Result<L::Item, LoaderError<L::Error>> {
        self.save(item, params).await
    }

    pub async fn save_batch(
        &self,
        items: Vec<L::Item>,
        params: &L::Params,
    ) -> Result<Vec<L::Item>, LoaderError<L::Error>> {
        let saved = self.loader.save_batch(items, params).await?;
        for item in &saved {
            let key = self.key_gen.for_item(item, params);
            if let Err(e) = self.positive.put(key.clone(), item.clone()) {
                tracing::warn!(error = %e, "failed to publish batch-saved item to cache");
            }
            if let Err(e) = self.negative.remove(&key) {
                tracing::warn!(error = %e, "failed to clear negative cache entry after batch save");
            }
        }
        Ok(saved)
    }

    /// Drains a stream of per-item save results under `options`, updating the
    /// caches for every `Ok` item as it arrives.
    pub async fn save_batch_async(
        &self,
        stream: impl Stream<Item = Result<L::Item, L::Error>> + Unpin,
        params: &L::Params,
        options: CollectorOptions,
    ) -> Vec<Result<L::Item, LoaderError<L::Error>>> {
        let results = collect(stream, options).await;
        results
            .into_iter()
            .map(|result| match result {
                Ok(item) => {
                    let key = self.key_gen.for_item(&item, params);
                    if let Err(e) = self.positive.put(key.clone(), item.clone()) {
                        tracing::warn!(error = %e, "failed to publish batch-saved item to cache");
                    }
                    let _ = self.negative.remove(&key);
                    Ok(item)
                }
                Err(e) => Err(LoaderError::Loader(e)),
            })
            .collect()
    }

    pub async fn initialize_storage(&self) -> Result<(), LoaderError<L::Error>> {
        self.loader.initialize_storage().await?;
        Ok(())
    }

    /// Delegates to the loader's own probe, then confirms the cache layer
    /// itself accepts a put+remove round trip (probed through the negative
    /// cache, whose unit value needs no constructor from `L::Item`).
    pub async fn health_check(&self) -> Result<(), LoaderError<L::Error>> {
        self.loader.health_check().await?;
        let key = "__castellan_health_check__".to_string();
        self.negative.put(key.clone(), ())?;
        self.negative.remove(&key)?;
        Ok(())
    }

    pub fn get_debug_info(&self) -> String {
        format!(
            "loader: {}\npositive_cache: {}/{} entries, hit_rate={:.3}\nnegative_cache: {}/{} entries, hit_rate={:.3}",
            self.loader.debug_info(),
            self.positive.size(),
            self.positive.config().max_size,
            self.positive.stats().hit_rate(),
            self.negative.size(),
            self.negative.config().max_size,
            self.negative.stats().hit_rate(),
        )
    }

    pub fn get_configuration(&self) -> &CacheConfiguration {
        self.positive.config()
    }

    pub fn get_cache_statistics(&self) -> LoaderCacheStats {
        LoaderCacheStats {
            positive: self.positive.stats(),
            negative: self.negative.stats(),
        }
    }

    pub fn evict_from_cache(&self, id: &L::Id) -> Result<(), LoaderError<L::Error>> {
        let key = self.key_gen.by_id(Some(id));
        self.positive.remove(&key)?;
        self.negative.remove(&key)?;
        Ok(())
    }

    pub fn evict_all_from_cache(&self) -> Result<(), LoaderError<L::Error>> {
        self.positive.clear()?;
        self.negative.clear()?;
        Ok(())
    }

    pub fn preload_into_cache(&self, item: L::Item, params: &L::Params) -> Result<(), LoaderError<L::Error>> {
        let key = self.key_gen.for_item(&item, params);
        self.positive.put(key.clone(), item)?;
        self.negative.remove(&key)?;
        Ok(())
    }

    pub fn shutdown(&self) {
        self.positive.close();
        self.negative.close();
    }
}
