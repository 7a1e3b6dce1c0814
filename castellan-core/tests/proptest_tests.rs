//! Property-based tests over randomized put/get/remove sequences, following
//! the same top-level `tests/proptest_tests.rs` convention as the rest of the
//! pack's fuzzed crates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use castellan_core::{Cache, CacheConfiguration, EvictionPolicy, RemovalCause};
use proptest::collection::vec as pvec;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Put(String, i32),
    Get(String),
    Remove(String),
}

fn small_key() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|n| format!("k{n}"))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (small_key(), any::<i32>()).prop_map(|(k, v)| Op::Put(k, v)),
        small_key().prop_map(Op::Get),
        small_key().prop_map(Op::Remove),
    ]
}

fn ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    pvec(op(), 0..max_len)
}

fn policy() -> impl Strategy<Value = EvictionPolicy> {
    prop_oneof![
        Just(EvictionPolicy::Lru),
        Just(EvictionPolicy::Lfu),
        Just(EvictionPolicy::Fifo),
        Just(EvictionPolicy::Random),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// size() never exceeds max_size once a bounded eviction policy is active,
    /// no matter the interleaving of puts/gets/removes.
    #[test]
    fn size_stays_within_max_size(
        max_size in 1u64..16,
        evict in policy(),
        sequence in ops(200),
    ) {
        let cache: Cache<i32> = Cache::new(CacheConfiguration {
            max_size,
            eviction_policy: evict,
            ..CacheConfiguration::named("prop-size")
        }).unwrap();

        for op in sequence {
            match op {
                Op::Put(k, v) => { let _ = cache.put(k, v); }
                Op::Get(k) => { let _ = cache.get(&k); }
                Op::Remove(k) => { let _ = cache.remove(&k); }
            }
            prop_assert!(cache.size() as u64 <= max_size);
        }
    }

    /// NONE rejects new keys once full rather than silently exceeding
    /// max_size; existing keys may still be overwritten in place.
    #[test]
    fn none_policy_never_exceeds_capacity(
        max_size in 1u64..16,
        sequence in ops(200),
    ) {
        let cache: Cache<i32> = Cache::new(CacheConfiguration {
            max_size,
            eviction_policy: EvictionPolicy::None,
            ..CacheConfiguration::named("prop-none")
        }).unwrap();

        for op in sequence {
            match op {
                Op::Put(k, v) => { let _ = cache.put(k, v); }
                Op::Get(k) => { let _ = cache.get(&k); }
                Op::Remove(k) => { let _ = cache.remove(&k); }
            }
            prop_assert!(cache.size() as u64 <= max_size);
        }
    }

    /// hits + misses always matches the number of get() calls issued, and
    /// both counters are monotonically non-decreasing across the sequence.
    #[test]
    fn stats_counters_are_consistent(sequence in ops(200)) {
        let cache: Cache<i32> = Cache::new(CacheConfiguration {
            max_size: 32,
            eviction_policy: EvictionPolicy::Lru,
            ..CacheConfiguration::named("prop-stats")
        }).unwrap();

        let mut expected_gets: u64 = 0;
        let mut prev_total = 0u64;
        for op in sequence {
            match op {
                Op::Put(k, v) => { let _ = cache.put(k, v); }
                Op::Get(k) => {
                    let _ = cache.get(&k);
                    expected_gets += 1;
                }
                Op::Remove(k) => { let _ = cache.remove(&k); }
            }
            let snap = cache.stats();
            let total = snap.hits + snap.misses;
            prop_assert!(total >= prev_total);
            prev_total = total;
        }
        prop_assert_eq!(cache.stats().hits + cache.stats().misses, expected_gets);
    }

    /// contains_key never reports true for a key whose TTL has elapsed.
    #[test]
    fn expired_keys_never_report_as_present(keys in pvec(small_key(), 1..6)) {
        let cache: Cache<i32> = Cache::new(CacheConfiguration {
            max_size: 32,
            default_ttl: Some(Duration::from_millis(1)),
            ..CacheConfiguration::named("prop-ttl")
        }).unwrap();

        for (i, key) in keys.iter().enumerate() {
            cache.put(key.clone(), i as i32).unwrap();
        }
        std::thread::sleep(Duration::from_millis(20));
        for key in &keys {
            prop_assert!(!cache.contains_key(key).unwrap());
        }
    }

    /// Every Size-cause removal event fired while filling a bounded cache
    /// corresponds to one fewer distinct key than was actually inserted.
    #[test]
    fn size_eviction_listener_fires_once_per_overflow(
        max_size in 1u64..10,
        distinct_keys in 1u8..30,
    ) {
        let cache: Cache<i32> = Cache::new(CacheConfiguration {
            max_size,
            eviction_policy: EvictionPolicy::Fifo,
            ..CacheConfiguration::named("prop-evict-listener")
        }).unwrap();

        let evictions = Arc::new(AtomicU64::new(0));
        let counter = evictions.clone();
        cache.add_listener(move |event| {
            if event.cause == RemovalCause::Size {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        for i in 0..distinct_keys {
            cache.put(format!("d{i}"), i as i32).unwrap();
        }

        let inserted = distinct_keys as u64;
        let expected_evictions = inserted.saturating_sub(max_size);
        prop_assert_eq!(evictions.load(Ordering::SeqCst), expected_evictions);
        prop_assert_eq!(cache.size() as u64, inserted.min(max_size));
    }
}
