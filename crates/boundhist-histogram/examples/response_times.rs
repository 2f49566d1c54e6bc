//! Record response times with a 1% error bound, then summarize them in
//! decade buckets.
//!
//! Run with `RUST_LOG=debug cargo run -p boundhist-histogram --example response_times`
//! to see the re-binning events.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use boundhist_histogram::{Histogram, Result};
use boundhist_layout::{CustomLayout, ErrorLimitingLayout2};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let layout = ErrorLimitingLayout2::create(1e-5, 1e-2, 0.0, 1e6)?;
    let mut response_times = Histogram::create_dynamic(layout);
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for i in 0..1_000_000u32 {
        response_times.add_value(rng.gen::<f64>() * f64::from(i))?;
    }

    println!("recorded {} response times", response_times.total_count());
    for q in [0.5, 0.9, 0.99, 0.999] {
        println!("  p{:<5} {:>14.3}", q * 100.0, response_times.quantile_estimate(q)?);
    }
    println!(
        "  footprint {} bytes",
        response_times.estimated_footprint_bytes()
    );

    let decades = CustomLayout::new(&[0.0, 1.0, 10.0, 100.0, 1_000.0, 10_000.0, 1_000_000.0])?;
    let mut summary = Histogram::create_dynamic(decades);
    summary.add_histogram(&response_times)?;

    println!("\nper decade:");
    for bin in summary.non_empty_bins() {
        println!(
            "  {:>24.17e} - {:>24.17e} : {:>10}",
            bin.lower_bound, bin.upper_bound, bin.bin_count
        );
    }
    Ok(())
}
