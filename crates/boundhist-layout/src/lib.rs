//! Error-bounded value-to-bin mappings
//!
//! A [`Layout`] maps every double to an integer bin index and each bin index
//! back to the range of values it covers. Histograms use layouts to decide
//! which counter a value increments.
//!
//! # Available Layouts
//!
//! - [`ErrorLimitingLayout1`]: linear approximation of `log2`, fastest mapping
//! - [`ErrorLimitingLayout2`]: quadratic approximation of `log2`, fewer bins
//! - [`LogOptimalLayout`]: true logarithm, the fewest bins for a given bound
//! - [`CustomLayout`]: explicit boundaries, for reporting and re-binning
//! - [`IntegerLayout`]: one bin per integer
//! - [`AnyLayout`]: any of the above, chosen at runtime
//!
//! The error-bounded layouts guarantee that every regular bin `[l, u]`
//! satisfies `u - l <= max(absolute, relative * min(|l|, |u|))`.
//!
//! # Example
//!
//! ```rust
//! use boundhist_layout::{ErrorLimitingLayout2, Layout};
//!
//! // 10µs absolute or 1% relative error for latencies up to 1000s
//! let layout = ErrorLimitingLayout2::create(1e-5, 1e-2, 0.0, 1e3).unwrap();
//!
//! let index = layout.value_to_bin_index(0.25);
//! let lower = layout.bin_lower_bound(index);
//! let upper = layout.bin_upper_bound(index);
//! assert!(lower <= 0.25 && 0.25 <= upper);
//! assert!(upper - lower <= 0.01 * lower);
//! ```

mod bounded;

pub mod any;
pub mod config;
pub mod custom;
pub mod error_limiting;
pub mod integer;
pub mod log_optimal;
pub mod traits;

pub use any::AnyLayout;
pub use config::{ErrorBounds, LayoutConfig};
pub use custom::CustomLayout;
pub use error_limiting::{ErrorLimitingLayout1, ErrorLimitingLayout2};
pub use integer::IntegerLayout;
pub use log_optimal::LogOptimalLayout;
pub use traits::Layout;

pub use boundhist_core::{Error, ErrorKind, Result};
