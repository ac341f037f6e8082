use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folfoxcore::prelude::*;

/// Benchmark a single 180-day simulation with the standard six cycles
fn benchmark_simulate(c: &mut Criterion) {
    let settings = Settings::default();
    let model = FolfoxModel::new(&settings).unwrap();
    c.bench_function("simulate_6_cycles", |b| {
        b.iter(|| {
            let _ = model.simulate(black_box(6)).unwrap();
        });
    });
}

/// Benchmark the full cycle-count search over the 180-day horizon
fn benchmark_optimize(c: &mut Criterion) {
    let settings = Settings::default();
    let model = FolfoxModel::new(&settings).unwrap();
    c.bench_function("optimize_cycles", |b| {
        b.iter(|| {
            let _ = optimize_cycles(black_box(&model)).unwrap();
        });
    });
}

criterion_group!(benches, benchmark_simulate, benchmark_optimize);
criterion_main!(benches);
