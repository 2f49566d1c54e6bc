use std::mem;

use super::BinCounts;

/// Read-only snapshot of non-empty bins with cumulative counts
///
/// Every lookup is a binary search, including rank lookups.
#[derive(Debug, Clone)]
pub struct PreprocessedStorage {
    indices: Vec<i32>,
    counts: Vec<u64>,
    /// Sum of the counts of all preceding bins
    cumulative: Vec<u64>,
    total: u64,
}

impl PreprocessedStorage {
    /// Snapshot the non-empty bins of `source`
    pub fn from_counts<S: BinCounts>(source: &S) -> Self {
        let mut indices = Vec::new();
        let mut counts = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0u64;
        source.for_each_non_empty(|index, count| {
            indices.push(index);
            counts.push(count);
            cumulative.push(total);
            total += count;
        });
        Self {
            indices,
            counts,
            cumulative,
            total,
        }
    }

    /// Number of non-empty bins
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl BinCounts for PreprocessedStorage {
    const NAME: &'static str = "PreprocessedHistogram";

    fn count(&self, index: i32) -> u64 {
        self.indices
            .binary_search(&index)
            .map_or(0, |position| self.counts[position])
    }

    fn first_non_empty(&self) -> Option<i32> {
        self.indices.first().copied()
    }

    fn last_non_empty(&self) -> Option<i32> {
        self.indices.last().copied()
    }

    fn next_non_empty(&self, index: i32) -> Option<i32> {
        let position = self.indices.partition_point(|&i| i <= index);
        self.indices.get(position).copied()
    }

    fn previous_non_empty(&self, index: i32) -> Option<i32> {
        let position = self.indices.partition_point(|&i| i < index);
        position.checked_sub(1).map(|p| self.indices[p])
    }

    fn for_each_non_empty<F: FnMut(i32, u64)>(&self, mut f: F) {
        for (&index, &count) in self.indices.iter().zip(&self.counts) {
            f(index, count);
        }
    }

    fn regular_count(&self) -> u64 {
        self.total
    }

    fn locate_rank(&self, rank: u64) -> Option<(i32, u64)> {
        if rank >= self.total {
            return None;
        }
        let position = self.cumulative.partition_point(|&c| c <= rank) - 1;
        Some((self.indices[position], self.cumulative[position]))
    }

    fn estimated_footprint_bytes(&self) -> usize {
        mem::size_of::<Self>()
            + self.indices.capacity() * mem::size_of::<i32>()
            + (self.counts.capacity() + self.cumulative.capacity()) * mem::size_of::<u64>()
    }
}
