//! Contiguous counts packed with a variable number of bits per entry
//!
//! Every entry uses `1 << mode` bits, with `mode` in `0..=6`. The width only
//! ever grows, when a count no longer fits.

use std::mem;

const MAX_MODE: u8 = 6;

#[derive(Debug, Clone)]
pub(super) struct PackedArray {
    offset: i32,
    len: usize,
    mode: u8,
    words: Vec<u64>,
}

/// Smallest mode whose entries can hold `value`
pub(super) fn mode_for(value: u64) -> u8 {
    let bits = u64::BITS - value.leading_zeros();
    if bits <= 1 {
        0
    } else {
        ((bits - 1).ilog2() + 1) as u8
    }
}

#[inline]
fn entry_mask(mode: u8) -> u64 {
    if mode == MAX_MODE {
        u64::MAX
    } else {
        (1u64 << (1u32 << mode)) - 1
    }
}

#[inline]
fn words_for(len: usize, mode: u8) -> usize {
    let slots_per_word_log = (MAX_MODE - mode) as u32;
    (len + (1 << slots_per_word_log) - 1) >> slots_per_word_log
}

impl PackedArray {
    pub(super) fn new(offset: i32, len: usize, mode: u8) -> Self {
        Self {
            offset,
            len,
            mode,
            words: vec![0; words_for(len, mode)],
        }
    }

    pub(super) fn offset(&self) -> i32 {
        self.offset
    }

    /// One past the last covered index
    pub(super) fn end(&self) -> i64 {
        i64::from(self.offset) + self.len as i64
    }

    pub(super) fn mode(&self) -> u8 {
        self.mode
    }

    pub(super) fn contains(&self, index: i32) -> bool {
        index >= self.offset && i64::from(index) < self.end()
    }

    #[inline]
    fn slots_per_word_log(&self) -> u32 {
        (MAX_MODE - self.mode) as u32
    }

    #[inline]
    fn locate(&self, slot: usize) -> (usize, u32) {
        let log = self.slots_per_word_log();
        let word = slot >> log;
        let shift = ((slot & ((1 << log) - 1)) as u32) << self.mode;
        (word, shift)
    }

    #[inline]
    pub(super) fn slot_of(&self, index: i32) -> usize {
        (i64::from(index) - i64::from(self.offset)) as usize
    }

    #[inline]
    pub(super) fn index_of(&self, slot: usize) -> i32 {
        (i64::from(self.offset) + slot as i64) as i32
    }

    fn get_slot(&self, slot: usize) -> u64 {
        let (word, shift) = self.locate(slot);
        (self.words[word] >> shift) & entry_mask(self.mode)
    }

    fn set_slot(&mut self, slot: usize, value: u64) {
        let (word, shift) = self.locate(slot);
        let mask = entry_mask(self.mode) << shift;
        self.words[word] = (self.words[word] & !mask) | ((value << shift) & mask);
    }

    pub(super) fn get(&self, index: i32) -> u64 {
        if self.contains(index) {
            self.get_slot(self.slot_of(index))
        } else {
            0
        }
    }

    /// Add `count` to a covered index, returning the previous count
    pub(super) fn add(&mut self, index: i32, count: u64) -> u64 {
        let slot = self.slot_of(index);
        let previous = self.get_slot(slot);
        let updated = previous + count;
        let required = mode_for(updated);
        if required > self.mode {
            tracing::trace!(from = 1u32 << self.mode, to = 1u32 << required, "widening packed counts");
            *self = self.relocated(self.offset, self.len, required);
        }
        self.set_slot(slot, updated);
        previous
    }

    /// Copy with a different span and entry width
    ///
    /// The new span must cover every non-empty slot.
    pub(super) fn relocated(&self, offset: i32, len: usize, mode: u8) -> Self {
        let mut target = Self::new(offset, len, mode.max(self.mode));
        let mut slot = 0;
        while let Some(found) = self.next_non_empty_slot(slot) {
            let index = self.index_of(found);
            target.set_slot(target.slot_of(index), self.get_slot(found));
            slot = found + 1;
        }
        target
    }

    /// First non-empty slot at or after `from`
    pub(super) fn next_non_empty_slot(&self, from: usize) -> Option<usize> {
        let log = self.slots_per_word_log();
        let mut slot = from;
        while slot < self.len {
            let (word_index, shift) = self.locate(slot);
            let remaining = self.words[word_index] & (u64::MAX << shift);
            if remaining != 0 {
                let found = (word_index << log) + (remaining.trailing_zeros() >> self.mode) as usize;
                return (found < self.len).then_some(found);
            }
            slot = (word_index + 1) << log;
        }
        None
    }

    /// Last non-empty slot at or before `to`
    pub(super) fn previous_non_empty_slot(&self, to: usize) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let log = self.slots_per_word_log();
        let mut slot = to.min(self.len - 1);
        loop {
            let (word_index, shift) = self.locate(slot);
            let end = shift + (1u32 << self.mode);
            let word = self.words[word_index];
            let kept = if end >= u64::BITS {
                word
            } else {
                word & ((1u64 << end) - 1)
            };
            if kept != 0 {
                let bit = u64::BITS - 1 - kept.leading_zeros();
                return Some((word_index << log) + (bit >> self.mode) as usize);
            }
            if word_index == 0 {
                return None;
            }
            slot = (word_index << log) - 1;
        }
    }

    pub(super) fn estimated_footprint_bytes(&self) -> usize {
        mem::size_of::<Self>() + self.words.capacity() * mem::size_of::<u64>()
    }
}
