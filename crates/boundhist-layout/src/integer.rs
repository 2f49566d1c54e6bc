//! Unit-width bins centred on the integers

use std::fmt;

use boundhist_core::Result;

use crate::bounded::validate_indices;
use crate::traits::Layout;

/// Layout mapping every value to its nearest integer
///
/// Suited to integer-valued observations such as queue depths or retry
/// counts. Bin `i` covers the values that round to `i` (halves round away
/// from zero).
///
/// # Example
///
/// ```rust
/// use boundhist_layout::{IntegerLayout, Layout};
///
/// let layout = IntegerLayout::new(-2, 2).unwrap();
/// assert_eq!(layout.value_to_bin_index(0.4), 0);
/// assert_eq!(layout.value_to_bin_index(0.5), 1);
/// assert_eq!(layout.bin_lower_bound(1), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerLayout {
    underflow_bin_index: i32,
    overflow_bin_index: i32,
}

impl IntegerLayout {
    pub fn new(underflow_bin_index: i32, overflow_bin_index: i32) -> Result<Self> {
        validate_indices(underflow_bin_index, overflow_bin_index)?;
        tracing::debug!(
            layout = "IntegerLayout",
            underflow_bin_index,
            overflow_bin_index,
            "created layout"
        );
        Ok(Self {
            underflow_bin_index,
            overflow_bin_index,
        })
    }
}

impl Layout for IntegerLayout {
    fn value_to_bin_index(&self, value: f64) -> i32 {
        if value.is_nan() {
            return i32::MAX;
        }
        // float-to-int casts saturate, infinities included
        value.round() as i32
    }

    fn underflow_bin_index(&self) -> i32 {
        self.underflow_bin_index
    }

    fn overflow_bin_index(&self) -> i32 {
        self.overflow_bin_index
    }

    fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64 {
        f64::from(bin_index) - 0.5
    }
}

impl fmt::Display for IntegerLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntegerLayout [underflow_bin_index={}, overflow_bin_index={}]",
            self.underflow_bin_index, self.overflow_bin_index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        let layout = IntegerLayout::new(-100, 100).unwrap();
        assert_eq!(layout.value_to_bin_index(-101.0), -101);
        assert_eq!(layout.value_to_bin_index(-0.5), -1);
        assert_eq!(layout.value_to_bin_index(-0.0), 0);
        assert_eq!(layout.value_to_bin_index(2.5), 3);
        assert_eq!(layout.value_to_bin_index(f64::INFINITY), i32::MAX);
        assert_eq!(layout.value_to_bin_index(f64::NEG_INFINITY), i32::MIN);
        assert_eq!(layout.value_to_bin_index(1e300), i32::MAX);
    }

    #[test]
    fn test_bounds() {
        let layout = IntegerLayout::new(-2, 2).unwrap();
        assert_eq!(layout.bin_lower_bound(-2), f64::NEG_INFINITY);
        assert_eq!(layout.bin_lower_bound(1), 0.5);
        assert_eq!(layout.bin_lower_bound(2), 1.5);
        assert_eq!(layout.bin_upper_bound(0), 0.5f64.next_down_compat());
        // -1.5 rounds to -2, so bin -1 starts just above it
        assert_eq!(layout.bin_lower_bound(-1), (-1.5f64).next_up_compat());
        assert_eq!(layout.bin_upper_bound(-1), -0.5);
        assert_eq!(layout.bin_upper_bound(2), f64::INFINITY);
    }

    #[test]
    fn test_invalid_range() {
        assert!(IntegerLayout::new(3, 3).is_err());
        assert!(IntegerLayout::new(4, -4).is_err());
    }

    #[test]
    fn test_display() {
        let layout = IntegerLayout::new(-2, 2).unwrap();
        assert_eq!(
            layout.to_string(),
            "IntegerLayout [underflow_bin_index=-2, overflow_bin_index=2]"
        );
    }

    trait Step {
        fn next_down_compat(self) -> f64;
        fn next_up_compat(self) -> f64;
    }

    impl Step for f64 {
        fn next_down_compat(self) -> f64 {
            use boundhist_core::numeric::{f64_to_ordered, ordered_to_f64};
            ordered_to_f64(f64_to_ordered(self) - 1)
        }

        fn next_up_compat(self) -> f64 {
            use boundhist_core::numeric::{f64_to_ordered, ordered_to_f64};
            ordered_to_f64(f64_to_ordered(self) + 1)
        }
    }
}
