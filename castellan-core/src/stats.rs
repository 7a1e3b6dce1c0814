use std::sync::atomic::{AtomicU64, Ordering};

/// Cache statistics for monitoring hit/miss rates, load latency, and eviction
/// pressure.
///
/// All counters are lock-free atomics so recording a hit or a miss never
/// contends with the storage lock. Rates are derived at read time, never
/// stored.
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_time_ns: AtomicU64,
    evictions: AtomicU64,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            load_time_ns: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self, elapsed_ns: u64) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.load_time_ns.fetch_add(elapsed_ns, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn load_time_ns(&self) -> u64 {
        self.load_time_ns.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.misses() as f64 / total as f64
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.loads.store(0, Ordering::Relaxed);
        self.load_time_ns.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    /// Immutable snapshot, with `current_size` filled in by the caller since
    /// the stats object itself does not know the storage size.
    pub fn snapshot(&self, current_size: u64) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            loads: self.loads(),
            load_time_ns: self.load_time_ns(),
            evictions: self.evictions(),
            current_size,
        }
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
            loads: AtomicU64::new(self.loads()),
            load_time_ns: AtomicU64::new(self.load_time_ns()),
            evictions: AtomicU64::new(self.evictions()),
        }
    }
}

/// Point-in-time copy of [`CacheStats`], suitable for reporting or
/// aggregation across caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub load_time_ns: u64,
    pub evictions: u64,
    pub current_size: u64,
}

impl CacheStatsSnapshot {
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64
        }
    }

    pub fn combine(&self, other: &CacheStatsSnapshot) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            loads: self.loads + other.loads,
            load_time_ns: self.load_time_ns + other.load_time_ns,
            evictions: self.evictions + other.evictions,
            current_size: self.current_size + other.current_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn hit_and_miss_rates() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.total_accesses(), 3);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_stats_have_zero_rates() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 0.0);
    }

    #[test]
    fn reset_clears_all_counters() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_eviction();
        stats.reset();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.evictions(), 0);
    }

    #[test]
    fn concurrent_recording_is_consistent() {
        let stats = Arc::new(CacheStats::new());
        let mut handles = Vec::new();
        for _ in 0..10 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record_hit();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.hits(), 10_000);
    }

    #[test]
    fn snapshots_combine_across_caches() {
        let a = CacheStatsSnapshot {
            hits: 5,
            misses: 1,
            ..Default::default()
        };
        let b = CacheStatsSnapshot {
            hits: 2,
            misses: 3,
            ..Default::default()
        };
        let combined = a.combine(&b);
        assert_eq!(combined.hits, 7);
        assert_eq!(combined.misses, 4);
    }
}
