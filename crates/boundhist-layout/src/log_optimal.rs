//! Layout with the fewest bins satisfying a combined absolute and relative bound

use crate::bounded::{impl_error_bounded_layout, Scale};

impl_error_bounded_layout!(
    /// Logarithmic layout with bin ratio exactly `1 + relative`
    ///
    /// Below `absolute / relative` the bins are linear with width `absolute`,
    /// above it every bin is `relative` times its lower bound wide. The first
    /// logarithmic bin is exactly `absolute` wide, so the transition needs no
    /// search.
    ///
    /// # Example
    ///
    /// ```rust
    /// use boundhist_layout::{Layout, LogOptimalLayout};
    ///
    /// let layout = LogOptimalLayout::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
    /// let index = layout.value_to_bin_index(1000.0);
    /// let width = layout.bin_upper_bound(index) - layout.bin_lower_bound(index);
    /// assert!(width <= 1e-2 * layout.bin_lower_bound(index) * (1.0 + 1e-9));
    /// ```
    LogOptimalLayout,
    Scale::Logarithmic
);
