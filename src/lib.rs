//! # Castellan
//!
//! A thread-safe, multi-policy cache core with a transparent loader wrapper:
//! [`castellan_core`] provides the cache instance, eviction strategies,
//! provider and manager registry; [`castellan_loader`] adapts an arbitrary
//! data-access [`Loader`](castellan_loader::Loader) to be cache-aware.
//!
//! ## Quick start
//!
//! ```
//! use castellan::{CacheConfiguration, CacheManager};
//!
//! let manager: CacheManager<i32> = CacheManager::new();
//! let cache = manager.get("scores", CacheConfiguration::named("scores")).unwrap();
//! cache.put("alice".to_string(), 42).unwrap();
//! assert_eq!(cache.get("alice").unwrap(), Some(42));
//! ```
//!
//! ## Default manager
//!
//! A process-wide manager, one per cached value type, is available through
//! [`default_manager`] as a documented convenience for callers who would
//! otherwise thread an explicit `Arc<CacheManager<V>>` through their whole
//! call graph. Prefer building and passing an explicit manager; reach for the
//! default only at the edges of a program (e.g. a `main` that has nowhere
//! else to hold it). [`shutdown_default_manager`] gives that convenience a
//! documented teardown path.

pub use castellan_core::{
    Cache, CacheBuilder, CacheConfiguration, CacheEntry, CacheError, CacheManager, CacheProvider,
    CacheResult, CacheStats, CacheStatsSnapshot, ConcurrentProvider, DefaultKeyGenerator,
    EvictionPolicy, EvictionStrategy, KeyGenerator, ListenerId, ManagerStats, ProviderStats,
    ReferenceProvider, RemovalCause, RemovalEvent,
};
pub use castellan_loader::{CachedLoader, CollectorOptions, Loader, LoaderCacheStats, LoaderError};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// One lazily-constructed [`CacheManager`] per distinct cached value type,
/// mirroring the teacher crate's `Lazy<RwLock<HashMap<...>>>` static-storage
/// pattern but keyed by `TypeId` instead of by cache name, since a single
/// process-wide static cannot itself be generic over `V`.
static DEFAULT_MANAGERS: Lazy<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the process-wide default manager for cached value type `V`,
/// constructing it on first use.
pub fn default_manager<V>() -> Arc<CacheManager<V>>
where
    V: Send + Sync + Clone + 'static,
{
    let type_id = TypeId::of::<V>();
    if let Some(existing) = DEFAULT_MANAGERS.read().get(&type_id) {
        return existing
            .clone()
            .downcast::<CacheManager<V>>()
            .expect("default manager registry is keyed by TypeId::of::<V>()");
    }
    let mut managers = DEFAULT_MANAGERS.write();
    let entry = managers
        .entry(type_id)
        .or_insert_with(|| Arc::new(CacheManager::<V>::new()) as Arc<dyn Any + Send + Sync>);
    entry
        .clone()
        .downcast::<CacheManager<V>>()
        .expect("default manager registry is keyed by TypeId::of::<V>()")
}

/// Closes and forgets the default manager for `V`, if one was ever created.
/// Intended for test teardown and graceful shutdown paths; callers that want
/// deterministic lifecycle management should prefer an explicit manager.
pub fn shutdown_default_manager<V>()
where
    V: Send + Sync + Clone + 'static,
{
    let type_id = TypeId::of::<V>();
    if let Some(manager) = DEFAULT_MANAGERS.write().remove(&type_id) {
        if let Ok(manager) = manager.downcast::<CacheManager<V>>() {
            manager.close();
        }
    }
}
