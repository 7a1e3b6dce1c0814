//! Removal event notification.
//!
//! Grounded on the callback-registry pattern in the teacher crate's
//! invalidation module: listeners are type-erased `Fn` closures behind
//! `Arc`, held in a copy-on-write list, and fired outside of the storage
//! critical section so user code can never dead-lock the cache.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Removed by an explicit `remove` call.
    Explicit,
    /// Overwritten by a subsequent `put` of the same key.
    Replaced,
    /// Reclaimed by the runtime (documented no-op in this implementation; see
    /// the weak/soft value hints on `CacheConfiguration`).
    Collected,
    /// Removed because its TTL or idle deadline had passed.
    Expired,
    /// Removed to make room under `max_size`.
    Size,
    /// Cause could not be determined.
    Unknown,
}

/// A single removal notification.
#[derive(Debug, Clone)]
pub struct RemovalEvent {
    pub cache_name: String,
    pub key: String,
    pub cause: RemovalCause,
    pub at: SystemTime,
}

pub type RemovalListenerFn = dyn Fn(&RemovalEvent) + Send + Sync;

/// A copy-on-write list of removal listeners for one cache.
///
/// `notify` is meant to be called after the storage lock has been released;
/// a listener that panics is caught and logged rather than allowed to
/// unwind into the caller that triggered the removal.
#[derive(Default)]
pub struct ListenerList {
    listeners: RwLock<Vec<(usize, Arc<RemovalListenerFn>)>>,
    next_id: AtomicUsize,
}

impl std::fmt::Debug for ListenerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("count", &self.listeners.read().len())
            .finish()
    }
}

/// Handle returned by [`ListenerList::add`], used to remove the listener later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

impl ListenerList {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RemovalEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.listeners.write();
        let mut updated = listeners.clone();
        updated.push((id, Arc::new(listener)));
        *listeners = updated;
        ListenerId(id)
    }

    pub fn remove(&self, id: ListenerId) {
        let mut listeners = self.listeners.write();
        let updated: Vec<_> = listeners
            .iter()
            .filter(|(existing, _)| *existing != id.0)
            .cloned()
            .collect();
        *listeners = updated;
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Fires every registered listener. Must be called outside of any lock
    /// the cache itself holds on its storage.
    pub fn notify(&self, event: &RemovalEvent) {
        let snapshot = self.listeners.read().clone();
        for (_, listener) in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                tracing::warn!(
                    cache = %event.cache_name,
                    key = %event.key,
                    cause = ?event.cause,
                    "removal listener panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn event(key: &str, cause: RemovalCause) -> RemovalEvent {
        RemovalEvent {
            cache_name: "test".to_string(),
            key: key.to_string(),
            cause,
            at: SystemTime::now(),
        }
    }

    #[test]
    fn notifies_all_registered_listeners() {
        let list = ListenerList::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c1 = Arc::clone(&calls);
        let c2 = Arc::clone(&calls);
        list.add(move |_| {
            c1.fetch_add(1, Ordering::Relaxed);
        });
        list.add(move |_| {
            c2.fetch_add(1, Ordering::Relaxed);
        });
        list.notify(&event("k", RemovalCause::Explicit));
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let list = ListenerList::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c1 = Arc::clone(&calls);
        let id = list.add(move |_| {
            c1.fetch_add(1, Ordering::Relaxed);
        });
        list.remove(id);
        list.notify(&event("k", RemovalCause::Explicit));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn a_panicking_listener_does_not_stop_the_rest() {
        let list = ListenerList::new();
        let calls = Arc::new(AtomicU32::new(0));
        list.add(|_| panic!("boom"));
        let c1 = Arc::clone(&calls);
        list.add(move |_| {
            c1.fetch_add(1, Ordering::Relaxed);
        });
        list.notify(&event("k", RemovalCause::Size));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
