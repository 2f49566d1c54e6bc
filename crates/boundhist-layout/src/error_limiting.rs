//! Error-limiting layouts backed by cheap approximations of the logarithm
//!
//! Both layouts read the exponent and mantissa straight from the IEEE bit
//! pattern instead of calling `ln`, which makes recording very fast. They pay
//! for it with a few more bins than [`LogOptimalLayout`](crate::LogOptimalLayout).

use crate::bounded::{impl_error_bounded_layout, Scale};

impl_error_bounded_layout!(
    /// Error-limiting layout using piecewise-linear interpolation of `log2`
    ///
    /// The cheapest mapping: about `1/relative` bins per octave.
    ///
    /// # Example
    ///
    /// ```rust
    /// use boundhist_layout::{ErrorLimitingLayout1, Layout};
    ///
    /// let layout = ErrorLimitingLayout1::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
    /// let index = layout.value_to_bin_index(42.0);
    /// assert!(layout.bin_lower_bound(index) <= 42.0);
    /// assert!(layout.bin_upper_bound(index) >= 42.0);
    /// ```
    ErrorLimitingLayout1,
    Scale::Linear
);

impl_error_bounded_layout!(
    /// Error-limiting layout using piecewise-quadratic interpolation of `log2`
    ///
    /// One extra multiplication compared to [`ErrorLimitingLayout1`] in exchange
    /// for roughly 25% fewer bins (about `0.75/relative` per octave).
    ErrorLimitingLayout2,
    Scale::Quadratic
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Layout;
    use boundhist_core::ErrorKind;

    #[test]
    fn test_unit_bins_without_relative_limit() {
        let layout = ErrorLimitingLayout2::create(1.0, 0.0, 0.0, 100.0).unwrap();
        assert_eq!(layout.underflow_bin_index(), -1);
        assert_eq!(layout.overflow_bin_index(), 101);
        for k in 0..100 {
            assert_eq!(layout.value_to_bin_index(k as f64), k);
            assert_eq!(layout.value_to_bin_index(k as f64 + 0.5), k);
            assert_eq!(layout.bin_lower_bound(k), k as f64);
        }
        assert_eq!(layout.bin_lower_bound(0).to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn test_range_is_covered_by_regular_bins() {
        let layout = ErrorLimitingLayout1::create(1e-5, 1e-2, -1e6, 1e6).unwrap();
        let lower = layout.value_to_bin_index(-1e6);
        let upper = layout.value_to_bin_index(1e6);
        assert_eq!(lower, layout.underflow_bin_index() + 1);
        assert_eq!(upper, layout.overflow_bin_index() - 1);
        assert_eq!(layout.value_to_bin_index(0.0), 0);
        assert_eq!(layout.value_to_bin_index(-0.0), -1);
    }

    #[test]
    fn test_quadratic_needs_fewer_bins() {
        let linear = ErrorLimitingLayout1::create(1e-9, 1e-2, 0.0, 1e9).unwrap();
        let quadratic = ErrorLimitingLayout2::create(1e-9, 1e-2, 0.0, 1e9).unwrap();
        assert!(quadratic.overflow_bin_index() < linear.overflow_bin_index());
    }

    #[test]
    fn test_infinities_and_nan() {
        let layout = ErrorLimitingLayout1::create(1e-3, 1e-2, 0.0, 10.0).unwrap();
        assert_eq!(layout.value_to_bin_index(f64::INFINITY), i32::MAX);
        assert_eq!(layout.value_to_bin_index(f64::NEG_INFINITY), i32::MIN);
        assert_eq!(layout.value_to_bin_index(f64::NAN), i32::MAX);
        assert_eq!(layout.bin_lower_bound(layout.underflow_bin_index()), f64::NEG_INFINITY);
        assert_eq!(layout.bin_upper_bound(layout.overflow_bin_index()), f64::INFINITY);
    }

    #[test]
    fn test_invalid_parameters() {
        let cases = [
            ErrorLimitingLayout1::create(-1.0, 1e-2, 0.0, 1.0),
            ErrorLimitingLayout1::create(1e-3, f64::INFINITY, 0.0, 1.0),
            ErrorLimitingLayout1::create(0.0, 0.0, 0.0, 1.0),
            ErrorLimitingLayout1::create(1e-3, 1e-2, 2.0, 1.0),
            ErrorLimitingLayout1::create(1e-3, 1e-2, 0.0, f64::NAN),
            ErrorLimitingLayout1::create(1e-300, 0.0, 0.0, 1e10),
            ErrorLimitingLayout1::from_indices(1e-3, 1e-2, 5, 5),
        ];
        for result in cases {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_equality_and_display() {
        let a = ErrorLimitingLayout2::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
        let b = ErrorLimitingLayout2::from_indices(
            1e-5,
            1e-2,
            a.underflow_bin_index(),
            a.overflow_bin_index(),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ErrorLimitingLayout2::create(1e-5, 1e-3, 0.0, 1e6).unwrap());
        assert_eq!(
            a.to_string(),
            format!(
                "ErrorLimitingLayout2 [absolute_bin_width_limit=0.00001, relative_bin_width_limit=0.01, underflow_bin_index={}, overflow_bin_index={}]",
                a.underflow_bin_index(),
                a.overflow_bin_index()
            )
        );
    }
}
