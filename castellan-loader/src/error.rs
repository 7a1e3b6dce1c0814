use thiserror::Error;

/// Errors surfaced by [`crate::CachedLoader`]: either the wrapped loader
/// failed, or the cache itself refused an operation (closed, invalid
/// configuration). A cache-side failure after a successful load is logged
/// and never turned into an `Err` here — the wrapper always returns the
/// loader's value when the loader itself succeeded.
#[derive(Debug, Error)]
pub enum LoaderError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Loader(#[from] E),

    #[error("cache error: {0}")]
    Cache(#[from] castellan_core::CacheError),
}
