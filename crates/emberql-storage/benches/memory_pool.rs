/// Performance benchmarks for the thread-local pool subsystem
///
/// Compares allocation churn across the two disciplines:
/// 1. Exact-sized object pool vs raw Vec allocation
/// 2. Compacting pool churn with relocation
/// 3. Bulk free: immediate compaction vs one deferred drain
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use emberql_storage::memory::{
    allocate_exact_sized_object, free_exact_sized_object, PoolHandle, ScopedDeferredRelease,
    StringRef,
};

fn bench_exact_pool_churn(c: &mut Criterion) {
    let _holder = PoolHandle::new();
    let mut group = c.benchmark_group("exact_pool_churn");

    for size in [32usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let block = allocate_exact_sized_object(black_box(size));
                unsafe { free_exact_sized_object(size, block) };
            });
        });
    }
    group.finish();
}

fn bench_compacting_churn(c: &mut Criterion) {
    let _holder = PoolHandle::new();
    let payload = vec![0xA5u8; 120];

    c.bench_function("compacting_create_drop", |b| {
        b.iter(|| {
            let r = StringRef::create(black_box(&payload));
            black_box(r.len());
        });
    });

    // Hole-filling path: keep a population alive and free from the middle
    c.bench_function("compacting_relocating_free", |b| {
        b.iter(|| {
            let refs: Vec<_> = (0..64).map(|_| StringRef::create(&payload)).collect();
            let survivors: Vec<_> = refs
                .into_iter()
                .enumerate()
                .filter_map(|(i, r)| (i % 2 == 0).then_some(r))
                .collect();
            black_box(survivors.len());
        });
    });
}

fn bench_bulk_free_modes(c: &mut Criterion) {
    let _holder = PoolHandle::new();
    let payload = vec![0x5Au8; 80];
    let mut group = c.benchmark_group("bulk_free");

    group.bench_function("immediate", |b| {
        b.iter(|| {
            let refs: Vec<_> = (0..256).map(|_| StringRef::create(&payload)).collect();
            drop(black_box(refs));
        });
    });

    group.bench_function("deferred_drain", |b| {
        b.iter(|| {
            let refs: Vec<_> = (0..256).map(|_| StringRef::create(&payload)).collect();
            let guard = ScopedDeferredRelease::new();
            drop(black_box(refs));
            drop(guard);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_exact_pool_churn,
    bench_compacting_churn,
    bench_bulk_free_modes
);
criterion_main!(benches);
