//! Ensemble microbenchmarks.
//!
//! Measures:
//! - `EnsembleController::train` throughput on a stationary stream
//! - one per-class drift test battery over a full window
//! - quantile sketch updates and sketch-vs-sketch KS distance

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use classwise_core::drift_test::run_battery;
use classwise_core::stats::ks::ks_delta;
use classwise_core::{
    EnsembleConfig, EnsembleController, Instance, QuantileSketch, ReferenceSummary, SlidingWindow,
    StreamSource,
};
use classwise_harness::{GaussianClassStream, ScenarioSpec};

fn stream() -> GaussianClassStream {
    match GaussianClassStream::new(ScenarioSpec::stable()) {
        Ok(s) => s,
        Err(err) => panic!("stable preset must build: {err}"),
    }
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("train");
    for window in [64usize, 128, 256] {
        let mut source = stream();
        let instances: Vec<Instance> = (0..4_096).map(|_| source.next_instance()).collect();
        group.throughput(Throughput::Elements(instances.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |b, &w| {
            b.iter(|| {
                let config = EnsembleConfig::default().with_window_size(w);
                let Ok(mut ensemble) = EnsembleController::for_source(config, &source) else {
                    return;
                };
                for inst in &instances {
                    let _ = black_box(ensemble.train(inst));
                }
            });
        });
    }
    group.finish();
}

fn bench_battery(c: &mut Criterion) {
    let mut source = stream();
    let header = source.header();
    let w = 128;
    let mut window = SlidingWindow::new(w);
    let mut reference = ReferenceSummary::new(&header.schema, 256);
    for _ in 0..(8 * w) {
        if let Some(old) = window.push(source.next_instance()) {
            reference.absorb(&header.schema, &old);
        }
    }
    c.bench_function("drift_battery_w128", |b| {
        b.iter(|| black_box(run_battery(&header.schema, &window, &reference)));
    });
}

fn bench_sketch(c: &mut Criterion) {
    let values: Vec<f64> = (0..10_000).map(|i| f64::from(i).sin() * 100.0).collect();
    c.bench_function("sketch_update_10k", |b| {
        b.iter(|| {
            let mut sketch = QuantileSketch::new(256);
            for &v in &values {
                sketch.update(v);
            }
            black_box(sketch.retained())
        });
    });

    let a = QuantileSketch::from_values(256, values.iter().copied());
    let b_sketch = QuantileSketch::from_values(128, values.iter().take(128).map(|v| v + 1.0));
    c.bench_function("ks_delta_256_vs_128", |b| {
        b.iter(|| black_box(ks_delta(&a, &b_sketch)));
    });
}

criterion_group!(benches, bench_train, bench_battery, bench_sketch);
criterion_main!(benches);
