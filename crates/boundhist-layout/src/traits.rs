//! The layout contract shared by all value-to-bin mappings

use std::fmt;

use boundhist_core::numeric::{
    f64_to_ordered, find_first, ordered_to_f64, NEGATIVE_INFINITY_ORDERED,
    POSITIVE_INFINITY_ORDERED,
};

/// Maps values to integer bin indices and bin indices back to value ranges
///
/// Indices `<= underflow_bin_index()` are collected by a histogram's underflow
/// counter and indices `>= overflow_bin_index()` by its overflow counter. The
/// indices strictly between are the regular bins.
///
/// `value_to_bin_index` must be monotone non-decreasing in the IEEE total order
/// (so `-0.0` never maps above `+0.0`) and must map `+inf` to an index
/// `>= overflow_bin_index()` and `-inf` to one `<= underflow_bin_index()`.
/// Under those conditions the provided [`bin_lower_bound`](Layout::bin_lower_bound)
/// and [`bin_upper_bound`](Layout::bin_upper_bound) are exact inverses of the
/// forward mapping.
pub trait Layout: fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static {
    /// Map a value to its bin index
    fn value_to_bin_index(&self, value: f64) -> i32;

    /// Largest index collected by the underflow counter
    fn underflow_bin_index(&self) -> i32;

    /// Smallest index collected by the overflow counter
    fn overflow_bin_index(&self) -> i32;

    /// Closed-form estimate of the smallest value mapped to `bin_index`
    ///
    /// Only used to seed the exact boundary search, so it may be off by a few
    /// ulps or even a few bins.
    fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64;

    /// Smallest value whose index is `>= bin_index`, `-inf` for the underflow bin
    fn bin_lower_bound(&self, bin_index: i32) -> f64 {
        if bin_index <= self.underflow_bin_index() {
            return f64::NEG_INFINITY;
        }
        let target = bin_index.min(self.overflow_bin_index());
        let approximation = self.bin_lower_bound_approximation(target);
        let guess = if approximation.is_nan() {
            0
        } else {
            f64_to_ordered(approximation)
        };
        let ordered = find_first(
            |candidate| self.value_to_bin_index(ordered_to_f64(candidate)) >= target,
            NEGATIVE_INFINITY_ORDERED,
            POSITIVE_INFINITY_ORDERED,
            guess,
        );
        ordered_to_f64(ordered)
    }

    /// Largest value whose index is `<= bin_index`, `+inf` for the overflow bin
    fn bin_upper_bound(&self, bin_index: i32) -> f64 {
        if bin_index >= self.overflow_bin_index() {
            return f64::INFINITY;
        }
        let next = bin_index.max(self.underflow_bin_index()) + 1;
        let ordered = f64_to_ordered(self.bin_lower_bound(next)) - 1;
        ordered_to_f64(ordered.max(NEGATIVE_INFINITY_ORDERED))
    }

    /// Clamp an index into `[underflow_bin_index, overflow_bin_index]`
    fn normalize_bin_index(&self, bin_index: i32) -> i32 {
        bin_index.clamp(self.underflow_bin_index(), self.overflow_bin_index())
    }

    /// Number of regular bins
    fn regular_bin_count(&self) -> u64 {
        (i64::from(self.overflow_bin_index()) - i64::from(self.underflow_bin_index()) - 1).max(0)
            as u64
    }
}
