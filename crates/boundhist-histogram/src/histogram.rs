//! The histogram type and its recording operations

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use boundhist_core::numeric::find_first;
use boundhist_core::{Error, Result, MAX_TOTAL_COUNT};
use boundhist_layout::Layout;
use tracing::debug;

use crate::estimator::ValueEstimator;
use crate::storage::{BinCounts, BinStorage, DynamicStorage, PreprocessedStorage, StaticStorage};

/// Histogram with error-bounded bins
///
/// Values are mapped to bins by the layout `L`, regular bin counts are kept in
/// the storage `S`. Values mapped at or below the layout's underflow index and
/// at or above its overflow index are counted separately. The exact minimum
/// and maximum are tracked as well, distinguishing `-0.0` from `+0.0`.
///
/// # Example
///
/// ```rust
/// use boundhist_histogram::Histogram;
/// use boundhist_layout::ErrorLimitingLayout2;
///
/// let layout = ErrorLimitingLayout2::create(1e-5, 1e-2, 0.0, 1e6).unwrap();
/// let mut histogram = Histogram::create_dynamic(layout);
/// histogram.add_value(0.25).unwrap();
/// histogram.add_value_with_count(1.5, 3).unwrap();
///
/// assert_eq!(histogram.total_count(), 4);
/// assert_eq!(histogram.min(), 0.25);
/// let median = histogram.quantile_estimate(0.5).unwrap();
/// assert!((median - 1.5).abs() <= 1.5 * 1e-2);
/// ```
pub struct Histogram<L: Layout, S: BinCounts = DynamicStorage> {
    pub(crate) layout: Arc<L>,
    pub(crate) storage: S,
    pub(crate) underflow_count: u64,
    pub(crate) overflow_count: u64,
    pub(crate) total_count: u64,
    pub(crate) min: f64,
    pub(crate) max: f64,
}

/// Histogram with dense, preallocated storage
pub type StaticHistogram<L> = Histogram<L, StaticStorage>;

/// Histogram with lazily allocated storage
pub type DynamicHistogram<L> = Histogram<L, DynamicStorage>;

/// Read-only histogram with logarithmic-time rank queries
pub type PreprocessedHistogram<L> = Histogram<L, PreprocessedStorage>;

impl<L: Layout> Histogram<L, DynamicStorage> {
    /// Create an empty histogram with dynamic storage
    pub fn create_dynamic(layout: L) -> DynamicHistogram<L> {
        DynamicHistogram::new(layout)
    }

    /// Create an empty histogram with static storage
    pub fn create_static(layout: L) -> StaticHistogram<L> {
        StaticHistogram::new(layout)
    }
}

impl<L: Layout, S: BinStorage> Histogram<L, S> {
    pub fn new(layout: L) -> Self {
        Self::with_shared_layout(Arc::new(layout))
    }

    /// Create an empty histogram sharing `layout` with other histograms
    pub fn with_shared_layout(layout: Arc<L>) -> Self {
        let storage = S::with_range(layout.underflow_bin_index(), layout.overflow_bin_index());
        Self::from_parts(layout, storage)
    }

    /// Like [`with_shared_layout`](Self::with_shared_layout), failing when the
    /// storage cannot be allocated
    pub(crate) fn try_with_shared_layout(layout: Arc<L>) -> Result<Self> {
        let storage =
            S::try_with_range(layout.underflow_bin_index(), layout.overflow_bin_index())?;
        Ok(Self::from_parts(layout, storage))
    }

    pub(crate) fn from_parts(layout: Arc<L>, storage: S) -> Self {
        Self {
            layout,
            storage,
            underflow_count: 0,
            overflow_count: 0,
            total_count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Record a single value
    pub fn add_value(&mut self, value: f64) -> Result<&mut Self> {
        self.add_value_with_count(value, 1)
    }

    /// Record `value` with multiplicity `count`
    ///
    /// Fails with an invalid argument for NaN and with an overflow when the
    /// total count would exceed [`MAX_TOTAL_COUNT`]. A zero count is
    /// validated and then ignored.
    pub fn add_value_with_count(&mut self, value: f64, count: u64) -> Result<&mut Self> {
        if value.is_nan() {
            return Err(Error::nan_value());
        }
        if count == 0 {
            return Ok(self);
        }
        self.check_total(count)?;
        let index = self.layout.value_to_bin_index(value);
        self.increment_bin(index, count);
        self.total_count += count;
        self.update_extrema(value, value);
        Ok(self)
    }

    /// Record `length` values given by `values(0), values(1), ..`
    ///
    /// The values must be non-decreasing. Each bin boundary is located by
    /// galloping search, so only a logarithmic number of values per non-empty
    /// bin is evaluated. Zeros are evaluated one by one, as `-0.0` and `+0.0`
    /// compare equal but may map to different bins. The result equals
    /// recording every value with [`add_value`](Self::add_value). NaN and
    /// descending values detected along the way fail the call without
    /// modifying the histogram.
    pub fn add_ascending_sequence<F>(&mut self, values: F, length: u64) -> Result<&mut Self>
    where
        F: Fn(u64) -> f64,
    {
        if length == 0 {
            return Ok(self);
        }
        self.check_total(length)?;

        let layout = self.layout.as_ref();
        let overflow = layout.overflow_bin_index();
        let bin_of = |value: f64| layout.normalize_bin_index(layout.value_to_bin_index(value));

        let mut runs: Vec<(i32, u64)> = Vec::new();
        let mut extrema = Extrema::default();
        let mut previous = f64::NEG_INFINITY;
        let mut position = 0u64;
        while position < length {
            let value = values(position);
            check_ascending(previous, value)?;
            extrema.include(value);
            let bin = bin_of(value);
            if value == 0.0 {
                push_run(&mut runs, bin, 1);
                previous = value;
                position += 1;
                continue;
            }

            let end = if value > 0.0 && bin == overflow {
                length
            } else {
                // a negative run also ends where the zeros begin
                let negative = value < 0.0;
                find_first(
                    |p| {
                        p as u64 >= length || {
                            let next = values(p as u64);
                            (negative && next >= 0.0) || bin_of(next) > bin
                        }
                    },
                    (position + 1) as i64,
                    length as i64,
                    (position + 1) as i64,
                ) as u64
            };
            push_run(&mut runs, bin, end - position);
            previous = if end - 1 == position {
                value
            } else {
                let last = values(end - 1);
                check_ascending(value, last)?;
                extrema.include(last);
                last
            };
            position = end;
        }

        self.commit_runs(&runs, length, extrema);
        Ok(self)
    }

    /// Record the non-decreasing values of an exact-size iterator
    ///
    /// Forward-only companion of [`add_ascending_sequence`](Self::add_ascending_sequence):
    /// every value is visited once and consecutive values in the same bin are
    /// recorded as a single increment.
    pub fn add_ascending_values<I>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        self.check_total(values.len() as u64)?;

        let layout = self.layout.as_ref();
        let mut runs: Vec<(i32, u64)> = Vec::new();
        let mut extrema = Extrema::default();
        let mut previous = f64::NEG_INFINITY;
        let mut length = 0u64;
        for value in values {
            check_ascending(previous, value)?;
            extrema.include(value);
            let bin = layout.normalize_bin_index(layout.value_to_bin_index(value));
            push_run(&mut runs, bin, 1);
            previous = value;
            length += 1;
        }
        if length == 0 {
            return Ok(self);
        }
        self.check_total(length)?;
        self.commit_runs(&runs, length, extrema);
        Ok(self)
    }

    /// Merge `other` into this histogram
    ///
    /// With an equal layout the counts are added bin by bin. Otherwise each of
    /// `other`'s observations is re-binned at its [`ValueEstimator::Uniform`]
    /// estimate, which keeps the extrema exact.
    pub fn add_histogram<M, T>(&mut self, other: &Histogram<M, T>) -> Result<&mut Self>
    where
        M: Layout,
        T: BinCounts,
    {
        if other.is_empty() {
            return Ok(self);
        }
        self.check_total(other.total_count)?;

        let same_layout = (other.layout.as_ref() as &dyn Any)
            .downcast_ref::<L>()
            .is_some_and(|layout| layout == self.layout.as_ref());
        if same_layout {
            self.underflow_count += other.underflow_count;
            self.overflow_count += other.overflow_count;
            let storage = &mut self.storage;
            other
                .storage
                .for_each_non_empty(|index, count| storage.increment(index, count));
            self.total_count += other.total_count;
            self.update_extrema(other.min, other.max);
            return Ok(self);
        }

        debug!(
            from = %other.layout,
            to = %self.layout,
            total_count = other.total_count,
            "re-binning histogram into a different layout"
        );
        let snapshot = other.preprocessed_copy();
        self.add_ascending_sequence(
            |rank| {
                snapshot
                    .estimate_rank(rank, ValueEstimator::Uniform)
                    .unwrap_or(f64::NAN)
            },
            other.total_count,
        )
    }

    fn check_total(&self, count: u64) -> Result<()> {
        match self.total_count.checked_add(count) {
            Some(total) if total <= MAX_TOTAL_COUNT => Ok(()),
            _ => Err(Error::count_overflow("total count")),
        }
    }

    fn increment_bin(&mut self, index: i32, count: u64) {
        if index <= self.layout.underflow_bin_index() {
            self.underflow_count += count;
        } else if index >= self.layout.overflow_bin_index() {
            self.overflow_count += count;
        } else {
            self.storage.increment(index, count);
        }
    }

    fn commit_runs(&mut self, runs: &[(i32, u64)], length: u64, extrema: Extrema) {
        for &(bin, count) in runs {
            self.increment_bin(bin, count);
        }
        self.total_count += length;
        self.update_extrema(extrema.min, extrema.max);
    }

    fn update_extrema(&mut self, min: f64, max: f64) {
        if min.total_cmp(&self.min).is_lt() {
            self.min = min;
        }
        if max.total_cmp(&self.max).is_gt() {
            self.max = max;
        }
    }
}

/// Extrema in IEEE total order, so `-0.0` following `+0.0` still counts as the minimum
struct Extrema {
    min: f64,
    max: f64,
}

impl Default for Extrema {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Extrema {
    fn include(&mut self, value: f64) {
        if value.total_cmp(&self.min).is_lt() {
            self.min = value;
        }
        if value.total_cmp(&self.max).is_gt() {
            self.max = value;
        }
    }
}

fn push_run(runs: &mut Vec<(i32, u64)>, bin: i32, count: u64) {
    match runs.last_mut() {
        Some((last_bin, total)) if *last_bin == bin => *total += count,
        _ => runs.push((bin, count)),
    }
}

fn check_ascending(previous: f64, value: f64) -> Result<()> {
    if value.is_nan() {
        return Err(Error::nan_value());
    }
    if value < previous {
        return Err(Error::InvalidArgument(format!(
            "values must be ascending, found {value} after {previous}"
        )));
    }
    Ok(())
}

impl<L: Layout, S: BinCounts> Histogram<L, S> {
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// The layout, for sharing with further histograms
    pub fn shared_layout(&self) -> &Arc<L> {
        &self.layout
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn underflow_count(&self) -> u64 {
        self.underflow_count
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    /// Smallest recorded value, `+inf` when empty
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest recorded value, `-inf` when empty
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Count of the bin at `bin_index`
    ///
    /// Indices at or beyond the underflow or overflow index report the
    /// underflow or overflow count.
    pub fn count(&self, bin_index: i32) -> u64 {
        if bin_index <= self.layout.underflow_bin_index() {
            self.underflow_count
        } else if bin_index >= self.layout.overflow_bin_index() {
            self.overflow_count
        } else {
            self.storage.count(bin_index)
        }
    }

    pub fn estimated_footprint_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.storage.estimated_footprint_bytes()
    }

    /// Equal read-only copy with logarithmic-time rank queries
    pub fn preprocessed_copy(&self) -> PreprocessedHistogram<L> {
        Histogram {
            layout: Arc::clone(&self.layout),
            storage: PreprocessedStorage::from_counts(&self.storage),
            underflow_count: self.underflow_count,
            overflow_count: self.overflow_count,
            total_count: self.total_count,
            min: self.min,
            max: self.max,
        }
    }

    fn regular_bins_equal<T: BinCounts>(&self, other: &T) -> bool {
        let mut left = self.storage.first_non_empty();
        let mut right = other.first_non_empty();
        loop {
            match (left, right) {
                (None, None) => return true,
                (Some(a), Some(b)) if a == b && self.storage.count(a) == other.count(b) => {
                    left = self.storage.next_non_empty(a);
                    right = other.next_non_empty(b);
                }
                _ => return false,
            }
        }
    }
}

impl<L: Layout, S: BinCounts> Clone for Histogram<L, S> {
    fn clone(&self) -> Self {
        Self {
            layout: Arc::clone(&self.layout),
            storage: self.storage.clone(),
            underflow_count: self.underflow_count,
            overflow_count: self.overflow_count,
            total_count: self.total_count,
            min: self.min,
            max: self.max,
        }
    }
}

impl<L: Layout, S: BinCounts> fmt::Debug for Histogram<L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(S::NAME)
            .field("layout", &self.layout)
            .field("storage", &self.storage)
            .field("underflow_count", &self.underflow_count)
            .field("overflow_count", &self.overflow_count)
            .field("total_count", &self.total_count)
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}

/// Equal by value, whatever the storage strategies
impl<L: Layout, A: BinCounts, B: BinCounts> PartialEq<Histogram<L, B>> for Histogram<L, A> {
    fn eq(&self, other: &Histogram<L, B>) -> bool {
        self.layout == other.layout
            && self.total_count == other.total_count
            && self.underflow_count == other.underflow_count
            && self.overflow_count == other.overflow_count
            && self.min.to_bits() == other.min.to_bits()
            && self.max.to_bits() == other.max.to_bits()
            && self.regular_bins_equal(&other.storage)
    }
}

impl<L: Layout + Eq, S: BinCounts> Eq for Histogram<L, S> {}

impl<L: Layout + Hash, S: BinCounts> Hash for Histogram<L, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.layout.hash(state);
        self.total_count.hash(state);
        self.underflow_count.hash(state);
        self.overflow_count.hash(state);
        self.min.to_bits().hash(state);
        self.max.to_bits().hash(state);
        self.storage.for_each_non_empty(|index, count| {
            index.hash(state);
            count.hash(state);
        });
    }
}

impl<L: Layout, S: BinCounts> fmt::Display for Histogram<L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [layout={}, underflow_count={}, overflow_count={}, total_count={}, min={}, max={}, counts={{",
            S::NAME,
            self.layout,
            self.underflow_count,
            self.overflow_count,
            self.total_count,
            self.min,
            self.max
        )?;
        let mut result = Ok(());
        let mut separator = "";
        self.storage.for_each_non_empty(|index, count| {
            if result.is_ok() {
                result = write!(f, "{separator}{index}: {count}");
                separator = ", ";
            }
        });
        result?;
        write!(f, "}}]")
    }
}
