//! Navigation over non-empty bins

use std::fmt;

use boundhist_core::{Error, Result};
use boundhist_layout::Layout;

use crate::histogram::Histogram;
use crate::storage::BinCounts;

/// Snapshot of a non-empty bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub bin_index: i32,
    pub bin_count: u64,
    /// Number of values in bins below this one
    pub less_count: u64,
    /// Number of values in bins above this one
    pub greater_count: u64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub is_underflow_bin: bool,
    pub is_overflow_bin: bool,
}

/// Position on a non-empty bin of a histogram
///
/// Bounds are the layout's bin bounds narrowed to the recorded minimum and
/// maximum, so the first and last non-empty bins never reach beyond the data.
pub struct BinCursor<'a, L: Layout, S: BinCounts> {
    histogram: &'a Histogram<L, S>,
    bin_index: i32,
    bin_count: u64,
    less_count: u64,
}

impl<'a, L: Layout, S: BinCounts> BinCursor<'a, L, S> {
    fn new(histogram: &'a Histogram<L, S>, bin_index: i32, bin_count: u64, less_count: u64) -> Self {
        Self {
            histogram,
            bin_index,
            bin_count,
            less_count,
        }
    }

    fn underflow(histogram: &'a Histogram<L, S>) -> Self {
        Self::new(
            histogram,
            histogram.layout.underflow_bin_index(),
            histogram.underflow_count,
            0,
        )
    }

    fn overflow(histogram: &'a Histogram<L, S>) -> Self {
        Self::new(
            histogram,
            histogram.layout.overflow_bin_index(),
            histogram.overflow_count,
            histogram.total_count - histogram.overflow_count,
        )
    }

    fn regular(histogram: &'a Histogram<L, S>, bin_index: i32, less_count: u64) -> Self {
        Self::new(histogram, bin_index, histogram.storage.count(bin_index), less_count)
    }

    pub fn bin_index(&self) -> i32 {
        self.bin_index
    }

    pub fn bin_count(&self) -> u64 {
        self.bin_count
    }

    pub fn less_count(&self) -> u64 {
        self.less_count
    }

    pub fn greater_count(&self) -> u64 {
        self.histogram.total_count - self.less_count - self.bin_count
    }

    pub fn is_underflow_bin(&self) -> bool {
        self.bin_index == self.histogram.layout.underflow_bin_index()
    }

    pub fn is_overflow_bin(&self) -> bool {
        self.bin_index == self.histogram.layout.overflow_bin_index()
    }

    pub fn is_first_non_empty_bin(&self) -> bool {
        self.less_count == 0
    }

    pub fn is_last_non_empty_bin(&self) -> bool {
        self.greater_count() == 0
    }

    pub fn lower_bound(&self) -> f64 {
        let bound = self.histogram.layout.bin_lower_bound(self.bin_index);
        if bound.total_cmp(&self.histogram.min).is_lt() {
            self.histogram.min
        } else {
            bound
        }
    }

    pub fn upper_bound(&self) -> f64 {
        let bound = self.histogram.layout.bin_upper_bound(self.bin_index);
        if bound.total_cmp(&self.histogram.max).is_gt() {
            self.histogram.max
        } else {
            bound
        }
    }

    /// Cursor on the next non-empty bin
    pub fn next_bin(&self) -> Result<Self> {
        if self.is_last_non_empty_bin() {
            return Err(Error::IllegalState(
                "already at the last non-empty bin".to_string(),
            ));
        }
        let histogram = self.histogram;
        let next = if self.is_underflow_bin() {
            histogram.storage.first_non_empty()
        } else {
            histogram.storage.next_non_empty(self.bin_index)
        };
        let less_count = self.less_count + self.bin_count;
        Ok(match next {
            Some(index) => Self::regular(histogram, index, less_count),
            None => Self::overflow(histogram),
        })
    }

    /// Cursor on the previous non-empty bin
    pub fn previous_bin(&self) -> Result<Self> {
        if self.is_first_non_empty_bin() {
            return Err(Error::IllegalState(
                "already at the first non-empty bin".to_string(),
            ));
        }
        let histogram = self.histogram;
        let previous = if self.is_overflow_bin() {
            histogram.storage.last_non_empty()
        } else {
            histogram.storage.previous_non_empty(self.bin_index)
        };
        Ok(match previous {
            Some(index) => {
                let count = histogram.storage.count(index);
                Self::new(histogram, index, count, self.less_count - count)
            }
            None => Self::underflow(histogram),
        })
    }

    pub fn to_bin(&self) -> Bin {
        Bin {
            bin_index: self.bin_index,
            bin_count: self.bin_count,
            less_count: self.less_count,
            greater_count: self.greater_count(),
            lower_bound: self.lower_bound(),
            upper_bound: self.upper_bound(),
            is_underflow_bin: self.is_underflow_bin(),
            is_overflow_bin: self.is_overflow_bin(),
        }
    }
}

impl<L: Layout, S: BinCounts> Clone for BinCursor<'_, L, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: Layout, S: BinCounts> Copy for BinCursor<'_, L, S> {}

impl<L: Layout, S: BinCounts> fmt::Debug for BinCursor<'_, L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinCursor")
            .field("bin_index", &self.bin_index)
            .field("bin_count", &self.bin_count)
            .field("less_count", &self.less_count)
            .finish()
    }
}

/// Iterator over the non-empty bins in ascending order
pub struct NonEmptyBins<'a, L: Layout, S: BinCounts> {
    next: Option<BinCursor<'a, L, S>>,
}

impl<L: Layout, S: BinCounts> Iterator for NonEmptyBins<'_, L, S> {
    type Item = Bin;

    fn next(&mut self) -> Option<Bin> {
        let current = self.next.take()?;
        self.next = current.next_bin().ok();
        Some(current.to_bin())
    }
}

impl<L: Layout, S: BinCounts> Histogram<L, S> {
    /// Cursor on the lowest non-empty bin, including the underflow bin
    pub fn first_non_empty_bin(&self) -> Result<BinCursor<'_, L, S>> {
        if self.is_empty() {
            return Err(Error::empty_histogram());
        }
        if self.underflow_count > 0 {
            return Ok(BinCursor::underflow(self));
        }
        Ok(match self.storage.first_non_empty() {
            Some(index) => BinCursor::regular(self, index, 0),
            None => BinCursor::overflow(self),
        })
    }

    /// Cursor on the highest non-empty bin, including the overflow bin
    pub fn last_non_empty_bin(&self) -> Result<BinCursor<'_, L, S>> {
        if self.is_empty() {
            return Err(Error::empty_histogram());
        }
        if self.overflow_count > 0 {
            return Ok(BinCursor::overflow(self));
        }
        Ok(match self.storage.last_non_empty() {
            Some(index) => {
                let count = self.storage.count(index);
                BinCursor::new(self, index, count, self.total_count - count)
            }
            None => BinCursor::underflow(self),
        })
    }

    /// Cursor on the bin holding the value of zero-based `rank`
    pub fn bin_by_rank(&self, rank: u64) -> Result<BinCursor<'_, L, S>> {
        if self.is_empty() {
            return Err(Error::empty_histogram());
        }
        if rank >= self.total_count {
            return Err(Error::rank_out_of_range(rank, self.total_count));
        }
        if rank < self.underflow_count {
            return Ok(BinCursor::underflow(self));
        }
        if rank >= self.total_count - self.overflow_count {
            return Ok(BinCursor::overflow(self));
        }

        let regular_rank = rank - self.underflow_count;
        if let Some((index, before)) = self.storage.locate_rank(regular_rank) {
            return Ok(BinCursor::regular(self, index, self.underflow_count + before));
        }

        let regular_count = self.storage.regular_count();
        if regular_rank < regular_count / 2 {
            let mut before = 0;
            let mut current = self.storage.first_non_empty();
            while let Some(index) = current {
                let count = self.storage.count(index);
                if regular_rank < before + count {
                    return Ok(BinCursor::new(self, index, count, self.underflow_count + before));
                }
                before += count;
                current = self.storage.next_non_empty(index);
            }
        } else {
            let mut before = regular_count;
            let mut current = self.storage.last_non_empty();
            while let Some(index) = current {
                let count = self.storage.count(index);
                before -= count;
                if regular_rank >= before {
                    return Ok(BinCursor::new(self, index, count, self.underflow_count + before));
                }
                current = self.storage.previous_non_empty(index);
            }
        }
        Err(Error::IllegalState(format!(
            "bin counts inconsistent with total count {}",
            self.total_count
        )))
    }

    /// Iterate over the non-empty bins, underflow and overflow included
    pub fn non_empty_bins(&self) -> NonEmptyBins<'_, L, S> {
        NonEmptyBins {
            next: self.first_non_empty_bin().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Histogram;
    use boundhist_core::ErrorKind;
    use boundhist_layout::IntegerLayout;

    fn sample<S: crate::storage::BinStorage>() -> Histogram<IntegerLayout, S> {
        let mut histogram = Histogram::new(IntegerLayout::new(-100, 100).unwrap());
        histogram
            .add_value_with_count(-101.0, 3)
            .unwrap()
            .add_value_with_count(-53.0, 2)
            .unwrap()
            .add_value_with_count(3.0, 4)
            .unwrap()
            .add_value(106.0)
            .unwrap();
        histogram
    }

    fn triples<L: Layout, S: BinCounts>(histogram: &Histogram<L, S>) -> Vec<(i32, u64, u64, u64)> {
        histogram
            .non_empty_bins()
            .map(|bin| (bin.bin_index, bin.less_count, bin.bin_count, bin.greater_count))
            .collect()
    }

    #[test]
    fn test_non_empty_bins_with_under_and_overflow() {
        let expected = vec![(-100, 0, 3, 7), (-53, 3, 2, 5), (3, 5, 4, 1), (100, 9, 1, 0)];
        assert_eq!(triples(&sample::<crate::storage::StaticStorage>()), expected);
        assert_eq!(triples(&sample::<crate::storage::DynamicStorage>()), expected);
        assert_eq!(
            triples(&sample::<crate::storage::DynamicStorage>().preprocessed_copy()),
            expected
        );
    }

    #[test]
    fn test_walk_back_and_forth() {
        let histogram = sample::<crate::storage::DynamicStorage>();
        let last = histogram.last_non_empty_bin().unwrap();
        assert!(last.is_overflow_bin());
        assert_eq!(last.upper_bound(), 106.0);

        let previous = last.previous_bin().unwrap();
        assert_eq!(previous.bin_index(), 3);
        assert_eq!(previous.less_count(), 5);
        assert_eq!(previous.lower_bound(), 2.5);
        assert_eq!(previous.upper_bound(), 3.5f64.next_down_compat());

        let first = previous.previous_bin().unwrap().previous_bin().unwrap();
        assert!(first.is_underflow_bin());
        assert!(first.is_first_non_empty_bin());
        assert_eq!(first.lower_bound(), -101.0);
        assert_eq!(first.previous_bin().unwrap_err().kind(), ErrorKind::IllegalState);
        assert_eq!(first.next_bin().unwrap().bin_index(), -53);
    }

    #[test]
    fn test_bin_by_rank() {
        let histogram = sample::<crate::storage::StaticStorage>();
        let ranks: Vec<i32> = (0..10)
            .map(|rank| histogram.bin_by_rank(rank).unwrap().bin_index())
            .collect();
        assert_eq!(ranks, vec![-100, -100, -100, -53, -53, 3, 3, 3, 3, 100]);
        assert_eq!(
            histogram.bin_by_rank(10).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_single_bin_has_no_neighbours() {
        let mut histogram = Histogram::create_dynamic(IntegerLayout::new(-5, 5).unwrap());
        histogram.add_value_with_count(2.0, 7).unwrap();
        let bin = histogram.first_non_empty_bin().unwrap();
        assert!(bin.is_first_non_empty_bin());
        assert!(bin.is_last_non_empty_bin());
        assert_eq!(bin.lower_bound(), 2.0);
        assert_eq!(bin.upper_bound(), 2.0);
        assert_eq!(bin.next_bin().unwrap_err().kind(), ErrorKind::IllegalState);
        assert_eq!(bin.previous_bin().unwrap_err().kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn test_empty_histogram_has_no_bins() {
        let histogram = Histogram::create_static(IntegerLayout::new(-5, 5).unwrap());
        assert_eq!(
            histogram.first_non_empty_bin().unwrap_err().kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(
            histogram.bin_by_rank(0).unwrap_err().kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(histogram.non_empty_bins().count(), 0);
    }

    trait NextDown {
        fn next_down_compat(self) -> f64;
    }

    impl NextDown for f64 {
        fn next_down_compat(self) -> f64 {
            f64::from_bits(self.to_bits() - 1)
        }
    }
}
