use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use boundhist_histogram::{BinStorage, Histogram};
use boundhist_layout::{ErrorLimitingLayout1, ErrorLimitingLayout2, Layout, LogOptimalLayout};

const NUM_VALUES: usize = 1_000_000;

/// Log-uniform latencies between 1µs and 100s
fn generate_latencies(size: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..size)
        .map(|_| 10f64.powf(rng.gen_range(-6.0..2.0)))
        .collect()
}

fn record<L: Layout + Clone, S: BinStorage>(layout: &L, values: &[f64]) -> Histogram<L, S> {
    let mut histogram = Histogram::new(layout.clone());
    for &value in values {
        let _ = histogram.add_value(black_box(value));
    }
    histogram
}

fn bench_layout<L: Layout + Clone>(c: &mut Criterion, name: &str, layout: L, values: &[f64]) {
    let mut group = c.benchmark_group(format!("record/{name}"));
    group.throughput(Throughput::Elements(values.len() as u64));
    group.sample_size(10);

    group.bench_with_input(BenchmarkId::new("static", values.len()), values, |b, values| {
        b.iter(|| record::<L, boundhist_histogram::StaticStorage>(&layout, values))
    });
    group.bench_with_input(BenchmarkId::new("dynamic", values.len()), values, |b, values| {
        b.iter(|| record::<L, boundhist_histogram::DynamicStorage>(&layout, values))
    });

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    group.bench_with_input(BenchmarkId::new("ascending", sorted.len()), &sorted, |b, sorted| {
        b.iter(|| {
            let mut histogram = Histogram::create_dynamic(layout.clone());
            let _ = histogram.add_ascending_sequence(|i| sorted[i as usize], sorted.len() as u64);
            histogram
        })
    });
    group.finish();
}

fn bench_recording(c: &mut Criterion) {
    let values = generate_latencies(NUM_VALUES, 42);
    bench_layout(
        c,
        "error_limiting1",
        ErrorLimitingLayout1::create(1e-5, 1e-2, -1e6, 1e6).unwrap(),
        &values,
    );
    bench_layout(
        c,
        "error_limiting2",
        ErrorLimitingLayout2::create(1e-5, 1e-2, -1e6, 1e6).unwrap(),
        &values,
    );
    bench_layout(
        c,
        "log_optimal",
        LogOptimalLayout::create(1e-5, 1e-2, -1e6, 1e6).unwrap(),
        &values,
    );
}

criterion_group!(benches, bench_recording);
criterion_main!(benches);
