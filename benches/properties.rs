//! Benchmarks for spark-properties
//!
//! Run with: cargo bench

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spark_properties::{Model, ModelExt, Property, PropertyTracker, VecModel};

// =============================================================================
// PROPERTY BENCHMARKS
// =============================================================================

fn bench_property_create(c: &mut Criterion) {
    c.bench_function("property_create", |b| {
        b.iter(|| black_box(Property::new(0i32)))
    });
}

fn bench_property_get(c: &mut Criterion) {
    let p = Property::new(42i32);
    c.bench_function("property_get", |b| {
        b.iter(|| black_box(p.get()))
    });
}

fn bench_property_set(c: &mut Criterion) {
    let p = Property::new(0i32);
    c.bench_function("property_set", |b| {
        b.iter(|| p.set(black_box(42)))
    });
}

// =============================================================================
// BINDING BENCHMARKS
// =============================================================================

fn bench_binding_get_cached(c: &mut Criterion) {
    let source = Property::new(42i32);
    let bound = Property::new(0i32);
    let s = source.clone();
    bound.set_binding(move || s.get() * 2);

    // First get to cache the value
    let _ = bound.get();

    c.bench_function("binding_get_cached", |b| {
        b.iter(|| black_box(bound.get()))
    });
}

fn bench_binding_get_dirty(c: &mut Criterion) {
    let source = Property::new(0i32);
    let bound = Property::new(0i32);
    let s = source.clone();
    bound.set_binding(move || s.get() * 2);

    let mut i = 0i32;
    c.bench_function("binding_get_dirty", |b| {
        b.iter(|| {
            source.set(i);
            i += 1;
            black_box(bound.get())
        })
    });
}

fn bench_binding_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding_chain");

    for depth in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let root = Property::new(0i32);
            let mut current = root.clone();

            for _ in 0..depth {
                let prev = current.clone();
                let next = Property::new(0i32);
                next.set_binding(move || prev.get() + 1);
                current = next;
            }

            b.iter(|| {
                root.set(black_box(1));
                black_box(current.get())
            })
        });
    }

    group.finish();
}

// =============================================================================
// TRACKER BENCHMARKS
// =============================================================================

fn bench_tracker_evaluate(c: &mut Criterion) {
    let props: Vec<Property<i32>> = (0..10).map(Property::new).collect();
    let tracker = PropertyTracker::new();

    c.bench_function("tracker_evaluate_10_reads", |b| {
        b.iter(|| black_box(tracker.evaluate(|| props.iter().map(Property::get).sum::<i32>())))
    });
}

fn bench_tracker_invalidate(c: &mut Criterion) {
    let p = Property::new(0i32);
    let tracker = PropertyTracker::new();

    let mut i = 0i32;
    c.bench_function("tracker_invalidate", |b| {
        b.iter(|| {
            tracker.evaluate(|| black_box(p.get()));
            p.set(i);
            i += 1;
            black_box(tracker.is_dirty())
        })
    });
}

// =============================================================================
// MODEL BENCHMARKS
// =============================================================================

fn bench_vec_model_push(c: &mut Criterion) {
    c.bench_function("vec_model_push_1000", |b| {
        b.iter(|| {
            let model = VecModel::default();
            for i in 0..1000 {
                model.push(black_box(i));
            }
            black_box(model.len())
        })
    });
}

fn bench_filter_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_set_row_data");

    for rows in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            let source = Rc::new(VecModel::from((0..rows).collect::<Vec<i32>>()));
            let even = source.clone().filter(|x| x % 2 == 0);

            let mut i = 0i32;
            b.iter(|| {
                source.set_row_data((i as usize) % rows as usize, i);
                i += 1;
                black_box(even.row_count())
            })
        });
    }

    group.finish();
}

fn bench_sort_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_insert");

    for rows in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            let source = Rc::new(VecModel::from((0..rows).rev().collect::<Vec<i32>>()));
            let sorted = source.clone().sort();

            let mut i = 0i32;
            b.iter(|| {
                source.push(i % rows);
                source.remove(0);
                i += 1;
                black_box(sorted.row_data(0))
            })
        });
    }

    group.finish();
}

criterion_group!(
    property_benches,
    bench_property_create,
    bench_property_get,
    bench_property_set,
);

criterion_group!(
    binding_benches,
    bench_binding_get_cached,
    bench_binding_get_dirty,
    bench_binding_chain,
);

criterion_group!(
    tracker_benches,
    bench_tracker_evaluate,
    bench_tracker_invalidate,
);

criterion_group!(
    model_benches,
    bench_vec_model_push,
    bench_filter_updates,
    bench_sort_updates,
);

criterion_main!(property_benches, binding_benches, tracker_benches, model_benches);
