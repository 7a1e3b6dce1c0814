use thiserror::Error;

/// Failure modes surfaced by a [`crate::Cache`], [`crate::CacheProvider`] or
/// [`crate::CacheManager`].
///
/// Validation failures (`InvalidValue`, `InvalidConfig`, `InvalidArgument`) never
/// mutate state. Listener failures are never represented here: they are caught,
/// logged, and do not propagate to the caller that triggered the notification.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache `{0}` is closed")]
    ClosedCache(String),

    #[error("cache manager is closed")]
    ClosedManager,

    #[error("null value rejected by cache `{0}` (allow_null_values is false)")]
    InvalidValue(String),

    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("read-through loader failed: {0}")]
    LoaderFailure(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("operation was cancelled")]
    Cancelled,
}

pub type CacheResult<T> = Result<T, CacheError>;
