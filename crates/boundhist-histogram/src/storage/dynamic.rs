use std::collections::BTreeMap;
use std::mem;
use std::ops::Bound::{Excluded, Unbounded};

use super::packed::{mode_for, PackedArray};
use super::{BinCounts, BinStorage};

/// Pack once the non-empty bins fill at least 1/16 of their span
const PACK_DENSITY: i64 = 16;

/// Return to the sparse map once the span exceeds 64 slots per non-empty bin
const UNPACK_DENSITY: i64 = 64;

/// Rough per-entry cost of a `BTreeMap<i32, u64>`
const SPARSE_ENTRY_BYTES: usize = 32;

#[derive(Debug, Clone)]
enum Repr {
    Sparse(BTreeMap<i32, u64>),
    Packed { array: PackedArray, entries: usize },
}

/// Counters allocated lazily for the observed index span
///
/// Starts as a sparse map and switches to a bit-packed array once the
/// non-empty bins are dense enough. The representation never affects
/// observable state, only the memory footprint.
#[derive(Debug, Clone)]
pub struct DynamicStorage {
    min_index: i32,
    max_index: i32,
    repr: Repr,
    first: Option<i32>,
    last: Option<i32>,
    total: u64,
}

impl DynamicStorage {
    /// Whether the counts are currently held in the packed array
    pub fn is_packed(&self) -> bool {
        matches!(self.repr, Repr::Packed { .. })
    }

    fn span(first: i32, last: i32) -> i64 {
        i64::from(last) - i64::from(first) + 1
    }

    fn maybe_pack(&mut self) {
        let Repr::Sparse(map) = &self.repr else {
            return;
        };
        let (Some(first), Some(last)) = (self.first, self.last) else {
            return;
        };
        let span = Self::span(first, last);
        if span > PACK_DENSITY * map.len() as i64 {
            return;
        }
        let entries = map.len();
        let max_count = map.values().copied().max().unwrap_or(0);
        let mut array = PackedArray::new(first, span as usize, mode_for(max_count));
        for (&index, &count) in map {
            array.add(index, count);
        }
        tracing::trace!(entries, span, "switching to packed bin counts");
        self.repr = Repr::Packed { array, entries };
    }

    /// Make the packed array cover `index`, or fall back to the sparse map
    /// when that would make it too sparse
    fn cover(&mut self, index: i32) {
        let Repr::Packed { array, entries } = &self.repr else {
            return;
        };
        let start = i64::from(array.offset()).min(i64::from(index));
        let end = array.end().max(i64::from(index) + 1);
        let span = end - start;
        if span > UNPACK_DENSITY * (*entries as i64 + 1) {
            let mut map = BTreeMap::new();
            let mut slot = 0;
            while let Some(found) = array.next_non_empty_slot(slot) {
                let bin = array.index_of(found);
                map.insert(bin, array.get(bin));
                slot = found + 1;
            }
            tracing::trace!(entries = map.len(), span, "switching to sparse bin counts");
            self.repr = Repr::Sparse(map);
            return;
        }
        let headroom = (span / 4).max(8);
        let (start, end) = if i64::from(index) < i64::from(array.offset()) {
            ((start - headroom).max(i64::from(self.min_index)), end)
        } else {
            (start, (end + headroom).min(i64::from(self.max_index) + 1))
        };
        let resized = array.relocated(start as i32, (end - start) as usize, array.mode());
        if let Repr::Packed { array, .. } = &mut self.repr {
            *array = resized;
        }
    }
}

impl BinCounts for DynamicStorage {
    const NAME: &'static str = "DynamicHistogram";

    fn count(&self, index: i32) -> u64 {
        match &self.repr {
            Repr::Sparse(map) => map.get(&index).copied().unwrap_or(0),
            Repr::Packed { array, .. } => array.get(index),
        }
    }

    fn first_non_empty(&self) -> Option<i32> {
        self.first
    }

    fn last_non_empty(&self) -> Option<i32> {
        self.last
    }

    fn next_non_empty(&self, index: i32) -> Option<i32> {
        match &self.repr {
            Repr::Sparse(map) => map.range((Excluded(index), Unbounded)).next().map(|(&i, _)| i),
            Repr::Packed { array, .. } => {
                if i64::from(index) + 1 >= array.end() {
                    return None;
                }
                let from = if index < array.offset() {
                    0
                } else {
                    array.slot_of(index) + 1
                };
                array.next_non_empty_slot(from).map(|slot| array.index_of(slot))
            }
        }
    }

    fn previous_non_empty(&self, index: i32) -> Option<i32> {
        match &self.repr {
            Repr::Sparse(map) => map.range(..index).next_back().map(|(&i, _)| i),
            Repr::Packed { array, .. } => {
                if index <= array.offset() {
                    return None;
                }
                let to = if i64::from(index) > array.end() {
                    usize::MAX
                } else {
                    array.slot_of(index) - 1
                };
                array.previous_non_empty_slot(to).map(|slot| array.index_of(slot))
            }
        }
    }

    fn for_each_non_empty<F: FnMut(i32, u64)>(&self, mut f: F) {
        match &self.repr {
            Repr::Sparse(map) => {
                for (&index, &count) in map {
                    f(index, count);
                }
            }
            Repr::Packed { array, .. } => {
                let mut slot = 0;
                while let Some(found) = array.next_non_empty_slot(slot) {
                    let index = array.index_of(found);
                    f(index, array.get(index));
                    slot = found + 1;
                }
            }
        }
    }

    fn regular_count(&self) -> u64 {
        self.total
    }

    fn estimated_footprint_bytes(&self) -> usize {
        mem::size_of::<Self>()
            + match &self.repr {
                Repr::Sparse(map) => map.len() * SPARSE_ENTRY_BYTES,
                Repr::Packed { array, .. } => array.estimated_footprint_bytes(),
            }
    }
}

impl BinStorage for DynamicStorage {
    fn with_range(underflow_bin_index: i32, overflow_bin_index: i32) -> Self {
        Self {
            min_index: underflow_bin_index.saturating_add(1),
            max_index: overflow_bin_index.saturating_sub(1),
            repr: Repr::Sparse(BTreeMap::new()),
            first: None,
            last: None,
            total: 0,
        }
    }

    fn increment(&mut self, index: i32, count: u64) {
        if count == 0 {
            return;
        }
        debug_assert!(
            (self.min_index..=self.max_index).contains(&index),
            "index {index} outside the regular range"
        );
        self.first = Some(self.first.map_or(index, |first| first.min(index)));
        self.last = Some(self.last.map_or(index, |last| last.max(index)));
        self.total += count;

        let outside_packed =
            matches!(&self.repr, Repr::Packed { array, .. } if !array.contains(index));
        if outside_packed {
            self.cover(index);
        }
        let inserted = match &mut self.repr {
            Repr::Sparse(map) => {
                let entry = map.entry(index).or_insert(0);
                let inserted = *entry == 0;
                *entry += count;
                inserted
            }
            Repr::Packed { array, entries } => {
                if array.add(index, count) == 0 {
                    *entries += 1;
                }
                false
            }
        };
        if inserted {
            self.maybe_pack();
        }
    }
}
