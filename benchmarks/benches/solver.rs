//! Solver and manifold kernel benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench solver
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench solver -- reducer

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rein_solver::{
    contact_refresh, reduce_contacts, reduce_contacts_with_candidate, CollisionDetectionSettings,
    ContactData, ParallelLooper, SequentialLooper,
};
use rein_solver_bench::*;

// ---------------------------------------------------------------------------
// Manifold kernel
// ---------------------------------------------------------------------------

fn bench_reducer(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("reducer/general");
        for &n in &[5, 8, 16, 64] {
            let candidates = contact_ring(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| reduce_contacts(&[], &candidates));
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("reducer/four_plus_one");
        let contacts = square_contacts();
        let outlier = ContactData::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Y, 0.0);
        let interior = ContactData::new(Vec3::new(0.1, 0.0, 0.1), Vec3::Y, 0.0);
        group.bench_function("specialized/outlier", |b| {
            b.iter(|| reduce_contacts_with_candidate(&contacts, &outlier));
        });
        group.bench_function("specialized/interior", |b| {
            b.iter(|| reduce_contacts_with_candidate(&contacts, &interior));
        });
        group.bench_function("general/outlier", |b| {
            b.iter(|| reduce_contacts(&contacts, std::slice::from_ref(&outlier)));
        });
        group.finish();
    }
}

fn bench_refresher(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresher/contacts");
    let settings = CollisionDetectionSettings::default();
    for &n in &[1, 4, 16] {
        let (contacts, supplement, ta, tb) = refresh_fixture(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter_batched(
                || contacts.clone(),
                |mut c| contact_refresh(&mut c, &supplement, &ta, &tb, &settings),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

fn bench_solver(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("solver/sequential_chain");
        for &n in &[10, 100, 1000] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || joint_chain(n, Arc::new(SequentialLooper)).expect("chain setup"),
                    |mut solver| solver.update(1.0 / 60.0),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("solver/rayon_chain");
        let looper: Arc<dyn ParallelLooper> =
            Arc::new(rein_solver::RayonLooper::new(0).expect("thread pool"));
        for &n in &[10, 100, 1000] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || joint_chain(n, looper.clone()).expect("chain setup"),
                    |mut solver| solver.update(1.0 / 60.0),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/step");
    group.sample_size(30);
    for &n in &[50, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || sphere_scene(n, 1).expect("scene setup"),
                |mut physics| physics.step(1.0 / 60.0, &SpheresOnPlane),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_reducer,
    bench_refresher,
    bench_solver,
    bench_pipeline,
);
criterion_main!(benches);
