//! Common test utilities for boundhist-histogram tests

#![allow(dead_code)]

use boundhist_histogram::{BinCounts, BinStorage, Histogram};
use boundhist_layout::{
    AnyLayout, CustomLayout, ErrorLimitingLayout1, ErrorLimitingLayout2, IntegerLayout, Layout,
    LogOptimalLayout,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Reproducible random source
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// 10µs or 1% over [0, 1e6], the usual latency setup
pub fn latency_layout() -> ErrorLimitingLayout2 {
    ErrorLimitingLayout2::create(1e-5, 1e-2, 0.0, 1e6).unwrap()
}

/// One layout of every kind
pub fn all_layouts() -> Vec<AnyLayout> {
    vec![
        ErrorLimitingLayout1::create(1e-3, 1e-2, -1e3, 1e3).unwrap().into(),
        ErrorLimitingLayout2::create(1e-3, 1e-2, -1e3, 1e3).unwrap().into(),
        LogOptimalLayout::create(1e-3, 5e-2, -1e3, 1e3).unwrap().into(),
        CustomLayout::new(&[-100.0, -1.0, 0.0, 0.5, 1.0, 10.0, 1000.0])
            .unwrap()
            .into(),
        IntegerLayout::new(-200, 200).unwrap().into(),
    ]
}

/// Values spread over several orders of magnitude, with signed zeros,
/// infinities and values outside the layouts' ranges mixed in
pub fn random_values(rng: &mut ChaCha8Rng, len: usize) -> Vec<f64> {
    (0..len)
        .map(|_| match rng.gen_range(0..20) {
            0 => 0.0,
            1 => -0.0,
            2 => f64::INFINITY,
            3 => f64::NEG_INFINITY,
            4 => rng.gen_range(-1e5..1e5),
            _ => {
                let magnitude = 10f64.powf(rng.gen_range(-4.0..3.0));
                if rng.gen_bool(0.3) {
                    -magnitude
                } else {
                    magnitude
                }
            }
        })
        .collect()
}

pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// Histogram holding `values`, recorded one by one
pub fn histogram_of<L: Layout, S: BinStorage>(layout: L, values: &[f64]) -> Histogram<L, S> {
    let mut histogram = Histogram::new(layout);
    for &value in values {
        histogram.add_value(value).unwrap();
    }
    histogram
}

/// Check the relations every histogram state must satisfy
pub fn assert_consistent<L: Layout, S: BinCounts>(histogram: &Histogram<L, S>) {
    let bins: Vec<_> = histogram.non_empty_bins().collect();
    let total: u64 = bins.iter().map(|bin| bin.bin_count).sum();
    assert_eq!(total, histogram.total_count());

    let mut less = 0;
    for bin in &bins {
        assert_eq!(bin.less_count, less, "bin {}", bin.bin_index);
        assert!(bin.bin_count > 0);
        assert!(bin.lower_bound <= bin.upper_bound, "bin {}", bin.bin_index);
        less += bin.bin_count;
        assert_eq!(bin.greater_count, total - less);
    }

    if histogram.is_empty() {
        assert_eq!(histogram.min(), f64::INFINITY);
        assert_eq!(histogram.max(), f64::NEG_INFINITY);
        return;
    }
    assert_eq!(
        histogram.value_estimate(0).unwrap().to_bits(),
        histogram.min().to_bits()
    );
    assert_eq!(
        histogram
            .value_estimate(histogram.total_count() - 1)
            .unwrap()
            .to_bits(),
        histogram.max().to_bits()
    );
    let mut previous = f64::NEG_INFINITY;
    for rank in 0..histogram.total_count() {
        let estimate = histogram.value_estimate(rank).unwrap();
        assert!(
            previous <= estimate,
            "estimate {estimate} at rank {rank} below {previous}"
        );
        previous = estimate;
    }
}
