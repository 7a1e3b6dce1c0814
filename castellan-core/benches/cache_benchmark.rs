use castellan_core::{Cache, CacheConfiguration, EvictionPolicy};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::thread;

fn cache(limit: u64, policy: EvictionPolicy) -> Cache<i32> {
    Cache::new(CacheConfiguration {
        max_size: limit,
        eviction_policy: policy,
        ..Default::default()
    })
    .unwrap()
}

fn bench_insert_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_sequential");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("FIFO", size), size, |b, &size| {
            b.iter(|| {
                let cache = cache(size as u64, EvictionPolicy::Fifo);
                for i in 0..size {
                    cache.put(format!("key{i}"), black_box(i as i32)).unwrap();
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("LRU", size), size, |b, &size| {
            b.iter(|| {
                let cache = cache(size as u64, EvictionPolicy::Lru);
                for i in 0..size {
                    cache.put(format!("key{i}"), black_box(i as i32)).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_get_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_sequential");

    for size in [10, 100, 1000].iter() {
        let fifo_cache = cache(*size as u64, EvictionPolicy::Fifo);
        for i in 0..*size {
            fifo_cache.put(format!("key{i}"), i as i32).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("FIFO", size), size, |b, &size| {
            b.iter(|| {
                for i in 0..size {
                    black_box(fifo_cache.get(&format!("key{i}")).unwrap());
                }
            });
        });

        let lru_cache = cache(*size as u64, EvictionPolicy::Lru);
        for i in 0..*size {
            lru_cache.put(format!("key{i}"), i as i32).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("LRU", size), size, |b, &size| {
            b.iter(|| {
                for i in 0..size {
                    black_box(lru_cache.get(&format!("key{i}")).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_mixed");

    for num_threads in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let cache = cache(100, EvictionPolicy::Fifo);
                    let handles: Vec<_> = (0..num_threads)
                        .map(|thread_id| {
                            let cache = cache.clone();
                            thread::spawn(move || {
                                for i in 0..50 {
                                    if i % 2 == 0 {
                                        cache
                                            .put(format!("key{}", thread_id * 50 + i), black_box(i as i32))
                                            .unwrap();
                                    } else {
                                        black_box(cache.get(&format!("key{}", thread_id * 50 + i)).unwrap());
                                    }
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");

    group.bench_function("FIFO_eviction", |b| {
        b.iter(|| {
            let cache = cache(50, EvictionPolicy::Fifo);
            for i in 0..100 {
                cache.put(format!("key{i}"), black_box(i as i32)).unwrap();
            }
        });
    });

    group.bench_function("LRU_eviction", |b| {
        b.iter(|| {
            let cache = cache(50, EvictionPolicy::Lru);
            for i in 0..100 {
                cache.put(format!("key{i}"), black_box(i as i32)).unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sequential,
    bench_get_sequential,
    bench_concurrent_mixed,
    bench_eviction
);
criterion_main!(benches);
