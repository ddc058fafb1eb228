//! Benchmarks for the sliding-window Top-K sketch
//!
//! Covers the hot ingest path, point queries, tick advancement and the
//! sorted Top-K pull.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use topwatch::sketch::TopkSketch;

fn sketch(k: usize) -> TopkSketch {
    TopkSketch::with_seed(k, 2048, 4, 60, 0.9, 256, 42).unwrap()
}

/// Single update latency across k values
fn benchmark_incr(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_sketch_incr");

    for k in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("single_incr", k), k, |b, &k| {
            let mut s = sketch(k);
            let item = black_box("test_item");
            b.iter(|| {
                s.incr(item);
            });
        });
    }

    group.finish();
}

/// Throughput over a skewed key distribution
fn benchmark_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_sketch_throughput");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("1000_incrs_100_keys", |b| {
        let mut s = sketch(100);
        b.iter(|| {
            for i in 0..1000 {
                s.incr(black_box(&format!("item_{}", i % 100)));
            }
        });
    });

    group.finish();
}

/// Point-query latency on a populated sketch
fn benchmark_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_sketch_count");

    let mut s = sketch(100);
    for i in 0..10_000 {
        s.incr(&format!("item_{}", i % 100));
    }
    let item = "item_50";

    group.bench_function("count", |b| {
        b.iter(|| {
            black_box(s.count(item));
        });
    });

    group.finish();
}

/// Tick advancement (full grid rotation + heap re-derivation)
fn benchmark_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_sketch_ticks");

    for k in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("one_tick", k), k, |b, &k| {
            let mut s = sketch(k);
            for i in 0..10_000 {
                s.incr(&format!("item_{}", i % 200));
            }
            b.iter(|| {
                s.ticks(1);
            });
        });
    }

    group.finish();
}

/// Sorted Top-K pull
fn benchmark_sorted_slice(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_sketch_sorted_slice");

    for k in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("sorted_slice", k), k, |b, &k| {
            let mut s = sketch(k);
            for i in 0..10_000 {
                s.incr(&format!("item_{}", i % (k * 2)));
            }
            b.iter(|| {
                black_box(s.sorted_slice());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_incr,
    benchmark_throughput,
    benchmark_count,
    benchmark_ticks,
    benchmark_sorted_slice,
);

criterion_main!(benches);
