//! Compact binary encoding of histograms
//!
//! The layout is not part of the encoding, only its underflow and overflow
//! indices, which are checked on read. Histograms over [`AnyLayout`] can
//! carry their layout along with [`Histogram::write_with_layout`].
//!
//! Encoding, version 0:
//!
//! ```text
//! u8       serial version
//! varint   zig-zag underflow bin index
//! varint   zig-zag overflow bin index
//! u8       flags
//! f64      minimum                          if non-empty
//! f64      maximum                          if its bits differ from the minimum
//! varint   underflow count                  if non-zero
//! varint   overflow count                   if non-zero
//! varint   number n of non-empty regular bins, if any
//! n times  bin index, count                 first index zig-zag, then gap - 1
//! ```
//!
//! Floats are big-endian, varints LEB128.

use std::io::{Read, Write};
use std::sync::Arc;

use boundhist_core::wire::{
    read_f64, read_i32, read_u8, read_varint, write_f64, write_signed_varint, write_u8,
    write_varint, zigzag_decode,
};
use boundhist_core::{Error, Result, MAX_TOTAL_COUNT};
use boundhist_layout::{AnyLayout, Layout};
use tracing::debug;

use crate::histogram::{DynamicHistogram, Histogram, PreprocessedHistogram, StaticHistogram};
use crate::storage::{BinCounts, BinStorage, DynamicStorage};

const SERIAL_VERSION: u8 = 0;

const FLAG_NON_EMPTY: u8 = 0x01;
const FLAG_DISTINCT_MAX: u8 = 0x02;
const FLAG_UNDERFLOW: u8 = 0x04;
const FLAG_OVERFLOW: u8 = 0x08;
const FLAG_REGULAR: u8 = 0x10;
const KNOWN_FLAGS: u8 = FLAG_NON_EMPTY | FLAG_DISTINCT_MAX | FLAG_UNDERFLOW | FLAG_OVERFLOW | FLAG_REGULAR;

impl<L: Layout, S: BinCounts> Histogram<L, S> {
    /// Write the histogram without its layout
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        write_u8(writer, SERIAL_VERSION)?;
        write_signed_varint(writer, i64::from(self.layout.underflow_bin_index()))?;
        write_signed_varint(writer, i64::from(self.layout.overflow_bin_index()))?;

        let mut entries = Vec::new();
        self.storage
            .for_each_non_empty(|index, count| entries.push((index, count)));

        let mut flags = 0;
        if !self.is_empty() {
            flags |= FLAG_NON_EMPTY;
            if self.max.to_bits() != self.min.to_bits() {
                flags |= FLAG_DISTINCT_MAX;
            }
        }
        if self.underflow_count > 0 {
            flags |= FLAG_UNDERFLOW;
        }
        if self.overflow_count > 0 {
            flags |= FLAG_OVERFLOW;
        }
        if !entries.is_empty() {
            flags |= FLAG_REGULAR;
        }
        write_u8(writer, flags)?;

        if flags & FLAG_NON_EMPTY != 0 {
            write_f64(writer, self.min)?;
        }
        if flags & FLAG_DISTINCT_MAX != 0 {
            write_f64(writer, self.max)?;
        }
        if flags & FLAG_UNDERFLOW != 0 {
            write_varint(writer, self.underflow_count)?;
        }
        if flags & FLAG_OVERFLOW != 0 {
            write_varint(writer, self.overflow_count)?;
        }
        if flags & FLAG_REGULAR != 0 {
            write_varint(writer, entries.len() as u64)?;
            let mut previous: Option<i32> = None;
            for &(index, count) in &entries {
                match previous {
                    None => write_signed_varint(writer, i64::from(index))?,
                    Some(previous) => {
                        write_varint(writer, (i64::from(index) - i64::from(previous) - 1) as u64)?
                    }
                }
                write_varint(writer, count)?;
                previous = Some(index);
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write(&mut bytes)?;
        Ok(bytes)
    }
}

impl<L: Layout, S: BinStorage> Histogram<L, S> {
    /// Read a histogram written by [`Histogram::write`] for an equal layout
    ///
    /// Every structural constraint is validated. Inconsistent input fails
    /// with [`Error::Corrupt`], truncated input with an [`Error::Io`].
    pub fn read<R: Read + ?Sized>(layout: L, reader: &mut R) -> Result<Self> {
        Self::read_shared(Arc::new(layout), reader)
    }

    pub fn read_shared<R: Read + ?Sized>(layout: Arc<L>, reader: &mut R) -> Result<Self> {
        let result = Self::read_body(layout, reader);
        if let Err(err) = &result {
            debug!(error = %err, "rejected serialized histogram");
        }
        result
    }

    /// Read from a byte slice that must hold exactly one histogram
    pub fn from_bytes(layout: L, mut bytes: &[u8]) -> Result<Self> {
        let histogram = Self::read(layout, &mut bytes)?;
        if !bytes.is_empty() {
            debug!(trailing = bytes.len(), "rejected serialized histogram");
            return Err(Error::corrupt(format!(
                "{} trailing bytes after histogram",
                bytes.len()
            )));
        }
        Ok(histogram)
    }

    fn read_body<R: Read + ?Sized>(layout: Arc<L>, reader: &mut R) -> Result<Self> {
        let version = read_u8(reader)?;
        if version != SERIAL_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let underflow_index = read_i32(reader)?;
        let overflow_index = read_i32(reader)?;
        if underflow_index != layout.underflow_bin_index()
            || overflow_index != layout.overflow_bin_index()
        {
            return Err(Error::corrupt(format!(
                "bin index range ({underflow_index}, {overflow_index}) does not match layout {layout}"
            )));
        }

        let flags = read_u8(reader)?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(Error::corrupt(format!("unknown flags {flags:#04x}")));
        }
        let mut histogram = Self::try_with_shared_layout(layout)?;
        if flags & FLAG_NON_EMPTY == 0 {
            if flags != 0 {
                return Err(Error::corrupt(format!("flags {flags:#04x} set on empty histogram")));
            }
            return Ok(histogram);
        }

        let min = read_f64(reader)?;
        let max = if flags & FLAG_DISTINCT_MAX != 0 {
            read_f64(reader)?
        } else {
            min
        };
        if min.is_nan() || max.is_nan() {
            return Err(Error::corrupt("NaN extremum"));
        }
        if min.total_cmp(&max).is_gt() {
            return Err(Error::corrupt(format!("minimum {min} exceeds maximum {max}")));
        }
        if flags & FLAG_DISTINCT_MAX != 0 && min.to_bits() == max.to_bits() {
            return Err(Error::corrupt("maximum flagged distinct but equals minimum"));
        }

        let mut total = 0u64;
        let mut accumulate = |count: u64| -> Result<u64> {
            if count == 0 {
                return Err(Error::corrupt("zero count"));
            }
            total = total
                .checked_add(count)
                .filter(|&total| total <= MAX_TOTAL_COUNT)
                .ok_or_else(|| Error::corrupt("total count exceeds the maximum"))?;
            Ok(count)
        };

        if flags & FLAG_UNDERFLOW != 0 {
            histogram.underflow_count = accumulate(read_varint(reader)?)?;
        }
        if flags & FLAG_OVERFLOW != 0 {
            histogram.overflow_count = accumulate(read_varint(reader)?)?;
        }
        if flags & FLAG_REGULAR != 0 {
            let entries = read_varint(reader)?;
            if entries == 0 || entries > histogram.layout.regular_bin_count() {
                return Err(Error::corrupt(format!("invalid number of bins {entries}")));
            }
            let mut index = i64::MIN;
            for position in 0..entries {
                let raw = read_varint(reader)?;
                index = if position == 0 {
                    zigzag_decode(raw)
                } else {
                    i64::try_from(raw)
                        .ok()
                        .and_then(|gap| index.checked_add(gap)?.checked_add(1))
                        .ok_or_else(|| Error::corrupt("bin index gap too large"))?
                };
                if index <= i64::from(underflow_index) || index >= i64::from(overflow_index) {
                    return Err(Error::corrupt(format!("regular bin index {index} out of range")));
                }
                let count = accumulate(read_varint(reader)?)?;
                histogram.storage.increment(index as i32, count);
            }
        }
        if total == 0 {
            return Err(Error::corrupt("non-empty flag set without counts"));
        }
        histogram.total_count = total;
        histogram.min = min;
        histogram.max = max;

        let first = histogram.first_non_empty_bin()?.bin_index();
        let last = histogram.last_non_empty_bin()?.bin_index();
        let layout = histogram.layout.as_ref();
        if layout.normalize_bin_index(layout.value_to_bin_index(min)) != first {
            return Err(Error::corrupt(format!("minimum {min} outside the first non-empty bin")));
        }
        if layout.normalize_bin_index(layout.value_to_bin_index(max)) != last {
            return Err(Error::corrupt(format!("maximum {max} outside the last non-empty bin")));
        }
        Ok(histogram)
    }
}

impl<L: Layout> Histogram<L, DynamicStorage> {
    pub fn read_as_dynamic<R: Read + ?Sized>(layout: L, reader: &mut R) -> Result<DynamicHistogram<L>> {
        DynamicHistogram::read(layout, reader)
    }

    pub fn read_as_static<R: Read + ?Sized>(layout: L, reader: &mut R) -> Result<StaticHistogram<L>> {
        StaticHistogram::read(layout, reader)
    }

    pub fn read_as_preprocessed<R: Read + ?Sized>(
        layout: L,
        reader: &mut R,
    ) -> Result<PreprocessedHistogram<L>> {
        Ok(DynamicHistogram::read(layout, reader)?.preprocessed_copy())
    }
}

impl<S: BinCounts> Histogram<AnyLayout, S> {
    /// Write the layout followed by the histogram
    pub fn write_with_layout<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        self.layout.write(writer)?;
        self.write(writer)
    }
}

impl<S: BinStorage> Histogram<AnyLayout, S> {
    /// Read a histogram written by [`Histogram::write_with_layout`]
    pub fn read_with_layout<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let layout = AnyLayout::read(reader)?;
        Self::read(layout, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundhist_core::ErrorKind;
    use boundhist_layout::IntegerLayout;

    fn layout() -> IntegerLayout {
        IntegerLayout::new(-10, 10).unwrap()
    }

    #[test]
    fn test_empty_encoding() {
        let histogram = Histogram::create_dynamic(layout());
        let bytes = histogram.to_bytes().unwrap();
        // version, zig-zag -10, zig-zag 10, flags
        assert_eq!(bytes, vec![0, 19, 20, 0]);
        let read = DynamicHistogram::from_bytes(layout(), &bytes).unwrap();
        assert_eq!(read, histogram);
    }

    #[test]
    fn test_single_value_encoding() {
        let mut histogram = Histogram::create_dynamic(layout());
        histogram.add_value_with_count(3.0, 2).unwrap();
        let bytes = histogram.to_bytes().unwrap();
        let mut expected = vec![0, 19, 20, FLAG_NON_EMPTY | FLAG_REGULAR];
        expected.extend_from_slice(&3.0f64.to_be_bytes());
        expected.extend_from_slice(&[1, 6, 2]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_round_trip_across_storages() {
        let mut histogram = Histogram::create_static(layout());
        for value in [-50.0, -0.0, 0.0, 2.0, 2.0, 7.0, 9.0, 30.0] {
            histogram.add_value(value).unwrap();
        }
        let bytes = histogram.to_bytes().unwrap();
        let dynamic = Histogram::read_as_dynamic(layout(), &mut bytes.as_slice()).unwrap();
        let preprocessed = Histogram::read_as_preprocessed(layout(), &mut bytes.as_slice()).unwrap();
        assert_eq!(dynamic, histogram);
        assert_eq!(preprocessed, histogram);
        assert_eq!(preprocessed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_rejects_mismatched_layout() {
        let mut histogram = Histogram::create_dynamic(layout());
        histogram.add_value(1.0).unwrap();
        let bytes = histogram.to_bytes().unwrap();
        let err = DynamicHistogram::from_bytes(IntegerLayout::new(-10, 11).unwrap(), &bytes)
            .unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }

    #[test]
    fn test_rejects_unknown_version_and_truncation() {
        let err = DynamicHistogram::from_bytes(layout(), &[1]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(1)));
        assert_eq!(err.kind(), ErrorKind::Io);

        let mut histogram = Histogram::create_dynamic(layout());
        histogram.add_value(1.0).unwrap().add_value(4.0).unwrap();
        let bytes = histogram.to_bytes().unwrap();
        for len in 0..bytes.len() {
            let err = DynamicHistogram::from_bytes(layout(), &bytes[..len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Io, "prefix of length {len}");
        }
    }

    #[test]
    fn test_rejects_inconsistent_content() {
        let header = [0u8, 19, 20];
        let with = |tail: &[u8]| {
            let mut bytes = header.to_vec();
            bytes.extend_from_slice(tail);
            DynamicHistogram::from_bytes(layout(), &bytes).unwrap_err()
        };
        // unknown flag
        assert!(matches!(with(&[0x20]), Error::Corrupt(_)));
        // flags on an empty histogram
        assert!(matches!(with(&[FLAG_UNDERFLOW]), Error::Corrupt(_)));

        let mut tail = vec![FLAG_NON_EMPTY | FLAG_REGULAR];
        tail.extend_from_slice(&3.0f64.to_be_bytes());
        // zero count
        let mut zero = tail.clone();
        zero.extend_from_slice(&[1, 6, 0]);
        assert!(matches!(with(&zero), Error::Corrupt(_)));
        // index outside the regular range
        let mut outside = tail.clone();
        outside.extend_from_slice(&[1, 40, 1]);
        assert!(matches!(with(&outside), Error::Corrupt(_)));
        // minimum not in the first bin
        let mut misplaced = tail.clone();
        misplaced.extend_from_slice(&[1, 8, 1]);
        assert!(matches!(with(&misplaced), Error::Corrupt(_)));
        // non-empty without any counts
        let mut countless = vec![FLAG_NON_EMPTY];
        countless.extend_from_slice(&3.0f64.to_be_bytes());
        assert!(matches!(with(&countless), Error::Corrupt(_)));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let histogram = Histogram::create_dynamic(layout());
        let mut bytes = histogram.to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            DynamicHistogram::from_bytes(layout(), &bytes).unwrap_err(),
            Error::Corrupt(_)
        ));
    }

    #[test]
    fn test_round_trip_with_layout() {
        let layout = AnyLayout::from(boundhist_layout::LogOptimalLayout::create(1e-5, 1e-2, 0.0, 1e6).unwrap());
        let mut histogram: DynamicHistogram<AnyLayout> = Histogram::new(layout);
        for value in [0.0, 1e-3, 0.5, 42.0, 1e7] {
            histogram.add_value(value).unwrap();
        }
        let mut bytes = Vec::new();
        histogram.write_with_layout(&mut bytes).unwrap();
        let read = StaticHistogram::<AnyLayout>::read_with_layout(&mut bytes.as_slice()).unwrap();
        assert_eq!(read, histogram);
    }

    #[test]
    fn test_unreachable_layout_range_is_rejected_before_allocating() {
        let layout = boundhist_layout::ErrorLimitingLayout2::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
        let header = AnyLayout::from(layout).to_bytes().unwrap();
        // tag, version and both error limits, then an index range no value reaches
        let mut bytes = header[..18].to_vec();
        write_signed_varint(&mut bytes, -2_000_000_000).unwrap();
        write_signed_varint(&mut bytes, 2_000_000_000).unwrap();
        // empty histogram over the same range
        write_u8(&mut bytes, SERIAL_VERSION).unwrap();
        write_signed_varint(&mut bytes, -2_000_000_000).unwrap();
        write_signed_varint(&mut bytes, 2_000_000_000).unwrap();
        write_u8(&mut bytes, 0).unwrap();
        assert_eq!(bytes.len(), 40);

        let err = StaticHistogram::<AnyLayout>::read_with_layout(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)), "{err:?}");
        let err = DynamicHistogram::<AnyLayout>::read_with_layout(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)), "{err:?}");
    }
}
