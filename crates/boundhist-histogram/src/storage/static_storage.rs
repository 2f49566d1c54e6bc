use std::{io, mem};

use boundhist_core::{Error, Result};

use super::{BinCounts, BinStorage};

/// Dense counters for every regular bin, allocated up front
///
/// Constant-time access at the cost of memory proportional to the layout's
/// full index range.
#[derive(Debug, Clone)]
pub struct StaticStorage {
    offset: i32,
    counts: Vec<u64>,
    first: Option<i32>,
    last: Option<i32>,
    total: u64,
}

impl StaticStorage {
    fn with_counts(underflow_bin_index: i32, counts: Vec<u64>) -> Self {
        Self {
            offset: underflow_bin_index.saturating_add(1),
            counts,
            first: None,
            last: None,
            total: 0,
        }
    }

    #[inline]
    fn slot(&self, index: i32) -> Option<usize> {
        let slot = i64::from(index) - i64::from(self.offset);
        if slot < 0 || slot as usize >= self.counts.len() {
            None
        } else {
            Some(slot as usize)
        }
    }

    #[inline]
    fn index_of(&self, slot: usize) -> i32 {
        (i64::from(self.offset) + slot as i64) as i32
    }
}

impl BinCounts for StaticStorage {
    const NAME: &'static str = "StaticHistogram";

    fn count(&self, index: i32) -> u64 {
        self.slot(index).map_or(0, |slot| self.counts[slot])
    }

    fn first_non_empty(&self) -> Option<i32> {
        self.first
    }

    fn last_non_empty(&self) -> Option<i32> {
        self.last
    }

    fn next_non_empty(&self, index: i32) -> Option<i32> {
        let last = self.last?;
        if index >= last {
            return None;
        }
        let first = self.first?;
        let start = self.slot(index.max(first - 1) + 1)?;
        let end = self.slot(last)?;
        (start..=end)
            .find(|&slot| self.counts[slot] > 0)
            .map(|slot| self.index_of(slot))
    }

    fn previous_non_empty(&self, index: i32) -> Option<i32> {
        let first = self.first?;
        if index <= first {
            return None;
        }
        let last = self.last?;
        let start = self.slot(first)?;
        let end = self.slot(index.min(last + 1) - 1)?;
        (start..=end)
            .rev()
            .find(|&slot| self.counts[slot] > 0)
            .map(|slot| self.index_of(slot))
    }

    fn for_each_non_empty<F: FnMut(i32, u64)>(&self, mut f: F) {
        let (Some(first), Some(last)) = (self.first, self.last) else {
            return;
        };
        let (Some(start), Some(end)) = (self.slot(first), self.slot(last)) else {
            return;
        };
        for slot in start..=end {
            let count = self.counts[slot];
            if count > 0 {
                f(self.index_of(slot), count);
            }
        }
    }

    fn regular_count(&self) -> u64 {
        self.total
    }

    fn estimated_footprint_bytes(&self) -> usize {
        mem::size_of::<Self>() + self.counts.capacity() * mem::size_of::<u64>()
    }
}

fn regular_len(underflow_bin_index: i32, overflow_bin_index: i32) -> usize {
    (i64::from(overflow_bin_index) - i64::from(underflow_bin_index) - 1).max(0) as usize
}

impl BinStorage for StaticStorage {
    fn with_range(underflow_bin_index: i32, overflow_bin_index: i32) -> Self {
        Self::with_counts(
            underflow_bin_index,
            vec![0; regular_len(underflow_bin_index, overflow_bin_index)],
        )
    }

    fn try_with_range(underflow_bin_index: i32, overflow_bin_index: i32) -> Result<Self> {
        let len = regular_len(underflow_bin_index, overflow_bin_index);
        let mut counts = Vec::new();
        counts.try_reserve_exact(len).map_err(|err| {
            Error::Io(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("cannot allocate {len} bin counts: {err}"),
            ))
        })?;
        counts.resize(len, 0);
        Ok(Self::with_counts(underflow_bin_index, counts))
    }

    fn increment(&mut self, index: i32, count: u64) {
        if count == 0 {
            return;
        }
        let Some(slot) = self.slot(index) else {
            debug_assert!(false, "index {index} outside the regular range");
            return;
        };
        self.counts[slot] += count;
        self.total += count;
        self.first = Some(self.first.map_or(index, |first| first.min(index)));
        self.last = Some(self.last.map_or(index, |last| last.max(index)));
    }
}
