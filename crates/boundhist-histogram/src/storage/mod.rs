//! Storage strategies for regular bin counts
//!
//! Read access goes through [`BinCounts`], write access through [`BinStorage`].
//! Preprocessed storage implements only the former, so histograms backed by it
//! expose no mutators.
//!
//! All storages index by the layout's bin index and only hold the regular bins
//! strictly between the underflow and overflow indices. Under- and overflow
//! counts live on the histogram itself.

mod dynamic;
mod packed;
mod preprocessed;
mod static_storage;

pub use dynamic::DynamicStorage;
pub use preprocessed::PreprocessedStorage;
pub use static_storage::StaticStorage;

use std::fmt;

use boundhist_core::Result;

/// Read access to regular bin counts
pub trait BinCounts: fmt::Debug + Clone + Send + Sync {
    /// Name used in the histogram's string representation
    const NAME: &'static str;

    /// Count of the bin at `index`, zero for empty or unknown bins
    fn count(&self, index: i32) -> u64;

    /// Smallest non-empty index
    fn first_non_empty(&self) -> Option<i32>;

    /// Largest non-empty index
    fn last_non_empty(&self) -> Option<i32>;

    /// Smallest non-empty index greater than `index`
    fn next_non_empty(&self, index: i32) -> Option<i32>;

    /// Largest non-empty index less than `index`
    fn previous_non_empty(&self, index: i32) -> Option<i32>;

    /// Visit all non-empty bins in ascending index order
    fn for_each_non_empty<F: FnMut(i32, u64)>(&self, f: F);

    /// Sum of all counts
    fn regular_count(&self) -> u64;

    /// Bin holding `rank` (zero-based among the regular counts) and the number
    /// of counts in bins before it
    ///
    /// Storages without an index for this return `None` and callers fall
    /// back to scanning.
    fn locate_rank(&self, _rank: u64) -> Option<(i32, u64)> {
        None
    }

    /// Approximate heap and inline memory used, in bytes
    fn estimated_footprint_bytes(&self) -> usize;
}

/// Mutable bin counts
pub trait BinStorage: BinCounts {
    /// Empty storage for the regular bins strictly between `underflow_bin_index`
    /// and `overflow_bin_index`
    fn with_range(underflow_bin_index: i32, overflow_bin_index: i32) -> Self;

    /// Like [`with_range`](Self::with_range), but fails with an I/O error of
    /// kind `OutOfMemory` when the storage cannot be allocated
    fn try_with_range(underflow_bin_index: i32, overflow_bin_index: i32) -> Result<Self> {
        Ok(Self::with_range(underflow_bin_index, overflow_bin_index))
    }

    /// Add `count` to the bin at `index`
    ///
    /// `index` must be a regular index and the caller guarantees that the
    /// resulting count does not exceed the total count limit.
    fn increment(&mut self, index: i32, count: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<S: BinStorage>() {
        let mut storage = S::with_range(-10, 1000);
        assert_eq!(storage.first_non_empty(), None);
        assert_eq!(storage.last_non_empty(), None);
        assert_eq!(storage.regular_count(), 0);

        storage.increment(5, 3);
        storage.increment(-9, 1);
        storage.increment(999, 7);
        storage.increment(5, 2);
        storage.increment(600, u64::from(u32::MAX) + 1);

        assert_eq!(storage.count(5), 5);
        assert_eq!(storage.count(6), 0);
        assert_eq!(storage.count(600), u64::from(u32::MAX) + 1);
        assert_eq!(storage.first_non_empty(), Some(-9));
        assert_eq!(storage.last_non_empty(), Some(999));
        assert_eq!(storage.next_non_empty(-9), Some(5));
        assert_eq!(storage.next_non_empty(5), Some(600));
        assert_eq!(storage.next_non_empty(999), None);
        assert_eq!(storage.previous_non_empty(5), Some(-9));
        assert_eq!(storage.previous_non_empty(-9), None);
        assert_eq!(storage.previous_non_empty(2000), Some(999));
        assert_eq!(storage.regular_count(), 13 + u64::from(u32::MAX));

        let mut visited = Vec::new();
        storage.for_each_non_empty(|index, count| visited.push((index, count)));
        assert_eq!(
            visited,
            vec![(-9, 1), (5, 5), (600, u64::from(u32::MAX) + 1), (999, 7)]
        );
        assert!(storage.estimated_footprint_bytes() > 0);
    }

    #[test]
    fn test_fallible_construction_matches() {
        let fixed = StaticStorage::try_with_range(-10, 1000).unwrap();
        assert_eq!(
            fixed.estimated_footprint_bytes(),
            StaticStorage::with_range(-10, 1000).estimated_footprint_bytes()
        );
        let dynamic = DynamicStorage::try_with_range(i32::MIN, i32::MAX).unwrap();
        assert_eq!(dynamic.first_non_empty(), None);
    }

    #[test]
    fn test_static_storage_contract() {
        exercise::<StaticStorage>();
    }

    #[test]
    fn test_dynamic_storage_contract() {
        exercise::<DynamicStorage>();
    }

    #[test]
    fn test_preprocessed_matches_source() {
        let mut storage = DynamicStorage::with_range(-10, 1000);
        for (index, count) in [(3, 2), (4, 1), (80, 5), (-2, 7)] {
            storage.increment(index, count);
        }
        let preprocessed = PreprocessedStorage::from_counts(&storage);
        assert_eq!(preprocessed.first_non_empty(), Some(-2));
        assert_eq!(preprocessed.last_non_empty(), Some(80));
        assert_eq!(preprocessed.next_non_empty(4), Some(80));
        assert_eq!(preprocessed.previous_non_empty(3), Some(-2));
        assert_eq!(preprocessed.count(80), 5);
        assert_eq!(preprocessed.count(81), 0);
        assert_eq!(preprocessed.regular_count(), 15);
        assert_eq!(preprocessed.locate_rank(0), Some((-2, 0)));
        assert_eq!(preprocessed.locate_rank(6), Some((-2, 0)));
        assert_eq!(preprocessed.locate_rank(7), Some((3, 7)));
        assert_eq!(preprocessed.locate_rank(9), Some((4, 9)));
        assert_eq!(preprocessed.locate_rank(14), Some((80, 10)));
        assert_eq!(preprocessed.locate_rank(15), None);
    }
}
