use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use boundhist_histogram::{Histogram, ValueEstimator};
use boundhist_layout::LogOptimalLayout;

const NUM_VALUES: usize = 1_000_000;

fn bench_quantile_reading(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let layout = LogOptimalLayout::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
    let mut histogram = Histogram::create_static(layout);
    for _ in 0..NUM_VALUES {
        let _ = histogram.add_value(-rng.gen::<f64>().ln());
    }
    let preprocessed = histogram.preprocessed_copy();
    let quantiles: Vec<f64> = (0..1_000).map(|_| rng.gen::<f64>()).collect();

    let mut group = c.benchmark_group("quantile");
    for estimator in [ValueEstimator::MidPoint, ValueEstimator::Uniform] {
        group.bench_with_input(
            BenchmarkId::new("static", estimator.name()),
            &quantiles,
            |b, quantiles| {
                b.iter(|| {
                    quantiles
                        .iter()
                        .map(|&q| histogram.quantile_estimate_with(black_box(q), estimator))
                        .filter_map(Result::ok)
                        .sum::<f64>()
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("preprocessed", estimator.name()),
            &quantiles,
            |b, quantiles| {
                b.iter(|| {
                    quantiles
                        .iter()
                        .map(|&q| preprocessed.quantile_estimate_with(black_box(q), estimator))
                        .filter_map(Result::ok)
                        .sum::<f64>()
                })
            },
        );
    }
    group.bench_function("preprocess", |b| b.iter(|| histogram.preprocessed_copy()));
    group.finish();
}

criterion_group!(benches, bench_quantile_reading);
criterion_main!(benches);
