//! # Castellan Loader
//!
//! Adapts an arbitrary data-access [`Loader`] to be cache-aware: read-through
//! and write-through against a [`castellan_core::Cache`], with a parallel
//! negative cache recording recent known-absent lookups so repeated misses
//! never re-hit the backing store.

mod collector;
mod error;
mod loader;
mod wrapper;

pub use collector::{collect, CollectorOptions};
pub use error::LoaderError;
pub use loader::Loader;
pub use wrapper::{CachedLoader, LoaderCacheStats};
