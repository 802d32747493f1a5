//! Throughput Benchmark for tidekv
//!
//! This benchmark measures the performance of the sharded engine
//! under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tidekv::storage::Engine;

/// An engine without a background sweeper
fn lazy_engine() -> Engine<Bytes> {
    Engine::builder()
        .sweep_interval(Duration::ZERO)
        .build()
        .unwrap()
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let engine = lazy_engine();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        let value = Bytes::from_static(b"small_value");
        b.iter(|| {
            engine.set(&format!("key:{}", i), value.clone());
            i += 1;
        });
    });

    group.bench_function("set_overwrite", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(1024)); // 1KB value
        b.iter(|| {
            engine.set(&format!("key:{}", i % 1_000), value.clone());
            i += 1;
        });
    });

    group.bench_function("set_n_existing", |b| {
        engine.set("taken", Bytes::from_static(b"first"));
        let value = Bytes::from_static(b"second");
        b.iter(|| {
            black_box(engine.set_n("taken", value.clone()));
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let engine = lazy_engine();

    // Pre-populate with data
    for i in 0..100_000 {
        engine.set(&format!("key:{}", i), Bytes::from(format!("value:{}", i)));
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(engine.get(&format!("key:{}", i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(engine.get(&format!("missing:{}", i)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let engine = lazy_engine();

    // Pre-populate
    for i in 0..10_000 {
        engine.set(&format!("key:{}", i), Bytes::from(format!("value:{}", i)));
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        let value = Bytes::from_static(b"value");
        b.iter(|| {
            let key = format!("key:{}", i % 10_000);
            if i % 5 == 0 {
                // 20% writes
                engine.set_x(&key, value.clone(), Duration::from_secs(60));
            } else {
                // 80% reads
                black_box(engine.get(&key));
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let engine = Arc::new(lazy_engine());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            engine.set(&key, Bytes::from_static(b"value"));
                            engine.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(engine.len());
        });
    });

    // Every thread races for the same small key set
    group.bench_function("4_threads_set_nx_contended", |b| {
        b.iter(|| {
            let engine = Arc::new(lazy_engine());
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("lock:{}", i % 64);
                            if !engine
                                .set_nx(&key, Bytes::from_static(b"owner"), Duration::from_millis(1))
                                .exists()
                            {
                                engine.del(&key);
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

/// Benchmark expiry operations
fn bench_expiry(c: &mut Criterion) {
    let engine = lazy_engine();

    let mut group = c.benchmark_group("expiry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_x", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine.set_x(
                &format!("key:{}", i),
                Bytes::from_static(b"value"),
                Duration::from_secs(3600),
            );
            i += 1;
        });
    });

    group.bench_function("expire_existing", |b| {
        // Pre-create keys
        for i in 0..10_000 {
            engine.set(&format!("expire:{}", i), Bytes::from_static(b"value"));
        }

        let mut i = 0u64;
        b.iter(|| {
            engine.expire(&format!("expire:{}", i % 10_000), Duration::from_secs(3600));
            i += 1;
        });
    });

    group.bench_function("sweep_10k_expired", |b| {
        b.iter_batched(
            || {
                let engine = lazy_engine();
                for i in 0..10_000 {
                    engine.set_x(
                        &format!("gone:{}", i),
                        Bytes::from_static(b"value"),
                        Duration::from_nanos(1),
                    );
                }
                std::thread::sleep(Duration::from_millis(1));
                engine
            },
            |engine| black_box(engine.sweep_expired()),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

/// Benchmark full iteration
fn bench_range(c: &mut Criterion) {
    let engine = lazy_engine();

    for i in 0..1_000 {
        engine.set(&format!("user:{}", i), Bytes::from_static(b"user_data"));
        engine.set(&format!("session:{}", i), Bytes::from_static(b"session_data"));
        engine.set(&format!("cache:{}", i), Bytes::from_static(b"cache_data"));
    }

    let mut group = c.benchmark_group("range");

    group.bench_function("range_keys_prefix", |b| {
        b.iter(|| {
            let mut matched = 0usize;
            engine.range_keys(|key| {
                if key.starts_with("user:") {
                    matched += 1;
                }
                true
            });
            black_box(matched)
        });
    });

    group.bench_function("range_all", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            engine.range(|_, value| {
                bytes += value.len();
                true
            });
            black_box(bytes)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_concurrent,
    bench_expiry,
    bench_range,
);

criterion_main!(benches);
