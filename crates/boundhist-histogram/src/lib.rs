//! Error-bounded histograms for recording large streams of observations
//!
//! A [`Histogram`] counts values in the bins of a
//! [`Layout`](boundhist_layout::Layout), keeping the exact minimum and maximum
//! alongside. Quantiles are estimated from the bin bounds, so their error is
//! bounded by the layout's bin width limits rather than by chance.
//!
//! # Key Features
//!
//! - **Two storage strategies**: dense [`StaticHistogram`] and lazily growing
//!   [`DynamicHistogram`], interchangeable in every operation
//! - **Bulk recording**: [`Histogram::add_ascending_sequence`] touches each
//!   bin once instead of each value
//! - **Merging across layouts**: [`Histogram::add_histogram`] re-bins when the
//!   layouts differ
//! - **Fast queries**: [`PreprocessedHistogram`] answers rank queries by
//!   binary search
//! - **Compact serialization**, readable into either storage strategy
//!
//! # Example
//!
//! ```rust
//! use boundhist_histogram::{Histogram, ValueEstimator};
//! use boundhist_layout::LogOptimalLayout;
//!
//! let layout = LogOptimalLayout::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
//! let mut latencies = Histogram::create_dynamic(layout.clone());
//! for millis in 1..=1000 {
//!     latencies.add_value(f64::from(millis) * 1e-3).unwrap();
//! }
//!
//! let p99 = latencies.quantile_estimate(0.99).unwrap();
//! assert!((p99 - 0.99).abs() <= 0.02);
//! let upper = latencies
//!     .quantile_estimate_with(0.99, ValueEstimator::UpperBound)
//!     .unwrap();
//! assert!(upper >= p99);
//!
//! let bytes = latencies.to_bytes().unwrap();
//! let restored = Histogram::read_as_static(layout, &mut bytes.as_slice()).unwrap();
//! assert_eq!(restored, latencies);
//! ```

pub mod bin;
pub mod config;
pub mod estimator;
pub mod histogram;
pub mod serialization;
pub mod storage;

pub use bin::{Bin, BinCursor, NonEmptyBins};
pub use config::{ConfiguredHistogram, HistogramConfig, StorageKind};
pub use estimator::ValueEstimator;
pub use histogram::{DynamicHistogram, Histogram, PreprocessedHistogram, StaticHistogram};
pub use storage::{BinCounts, BinStorage, DynamicStorage, PreprocessedStorage, StaticStorage};

pub use boundhist_core::{Error, ErrorKind, Result, MAX_TOTAL_COUNT};
