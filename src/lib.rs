//! Error-bounded histograms
//!
//! Facade over the workspace crates:
//!
//! - [`boundhist_core`]: error type, numeric helpers and wire primitives
//! - [`boundhist_layout`]: value-to-bin mappings with guaranteed bin widths
//! - [`boundhist_histogram`]: histograms, estimation, merging and serialization
//!
//! Most programs only need the [`prelude`].
//!
//! ```rust
//! use boundhist::prelude::*;
//!
//! let layout = LogOptimalLayout::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
//! let mut histogram = Histogram::create_dynamic(layout);
//! histogram.add_ascending_sequence(|i| i as f64 * 1e-3, 1_000).unwrap();
//! assert_eq!(histogram.total_count(), 1_000);
//! assert_eq!(histogram.quantile_estimate(1.0).unwrap(), 999.0 * 1e-3);
//! ```

pub use boundhist_core;
pub use boundhist_histogram;
pub use boundhist_layout;

pub mod prelude {
    pub use boundhist_core::{Error, ErrorKind, Result, MAX_TOTAL_COUNT};
    pub use boundhist_histogram::{
        Bin, BinCursor, ConfiguredHistogram, DynamicHistogram, Histogram, HistogramConfig,
        PreprocessedHistogram, StaticHistogram, StorageKind, ValueEstimator,
    };
    pub use boundhist_layout::{
        AnyLayout, CustomLayout, ErrorBounds, ErrorLimitingLayout1, ErrorLimitingLayout2,
        IntegerLayout, Layout, LayoutConfig, LogOptimalLayout,
    };
}
