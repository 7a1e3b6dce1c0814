use std::time::{Duration, Instant};

/// A cached value together with the metadata every eviction policy and the
/// expiration sweep need.
///
/// `created_at` is set once at construction and never touched again;
/// `last_access_at` and `access_count` are updated on every successful lookup.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    last_access_at: Instant,
    access_count: u64,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            last_access_at: now,
            access_count: 0,
            expires_at: ttl.map(|d| now + d),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_access_at(&self) -> Instant {
        self.last_access_at
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|e| now > e).unwrap_or(false)
    }

    /// Updates access metadata. Called on every successful `get`.
    pub fn touch(&mut self) {
        self.last_access_at = Instant::now();
        self.access_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn new_entry_is_not_expired_without_ttl() {
        let entry = CacheEntry::new(42, None);
        assert!(!entry.is_expired(Instant::now()));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let entry = CacheEntry::new(42, Some(Duration::from_millis(0)));
        sleep(Duration::from_millis(5));
        assert!(entry.is_expired(Instant::now()));
    }

    #[test]
    fn touch_updates_access_metadata() {
        let mut entry = CacheEntry::new("v", None);
        assert_eq!(entry.access_count(), 0);
        entry.touch();
        assert_eq!(entry.access_count(), 1);
        assert!(entry.last_access_at() >= entry.created_at());
    }
}
