//! Runtime-configured histograms

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use boundhist_core::Result;
use boundhist_layout::{AnyLayout, Layout, LayoutConfig};

use crate::bin::Bin;
use crate::estimator::ValueEstimator;
use crate::histogram::{DynamicHistogram, Histogram, PreprocessedHistogram, StaticHistogram};
use crate::storage::BinCounts;

/// Storage strategy for regular bin counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Dense counters for the full index range
    Static,
    /// Counters allocated for the observed index span
    #[default]
    Dynamic,
}

impl StorageKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Layout and storage of a histogram
///
/// ```rust
/// use boundhist_histogram::{HistogramConfig, StorageKind};
///
/// let config: HistogramConfig = serde_json::from_str(
///     r#"{"layout": {"kind": "integer", "underflow_bin_index": -10, "overflow_bin_index": 10},
///         "storage": "static"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.storage, StorageKind::Static);
///
/// let mut histogram = config.build().unwrap();
/// histogram.add_value(3.0).unwrap();
/// assert_eq!(histogram.total_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub layout: LayoutConfig,
    pub storage: StorageKind,
}

impl HistogramConfig {
    pub fn new(layout: LayoutConfig, storage: StorageKind) -> Self {
        Self { layout, storage }
    }

    /// Validate the layout parameters and create an empty histogram
    pub fn build(&self) -> Result<ConfiguredHistogram> {
        let layout = self.layout.build()?;
        Ok(match self.storage {
            StorageKind::Static => ConfiguredHistogram::Static(StaticHistogram::new(layout)),
            StorageKind::Dynamic => ConfiguredHistogram::Dynamic(DynamicHistogram::new(layout)),
        })
    }
}

/// Histogram whose layout and storage were chosen at runtime
#[derive(Debug, Clone)]
pub enum ConfiguredHistogram {
    Static(StaticHistogram<AnyLayout>),
    Dynamic(DynamicHistogram<AnyLayout>),
}

macro_rules! delegate {
    ($self:expr, $histogram:ident => $body:expr) => {
        match $self {
            ConfiguredHistogram::Static($histogram) => $body,
            ConfiguredHistogram::Dynamic($histogram) => $body,
        }
    };
}

impl ConfiguredHistogram {
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            Self::Static(_) => StorageKind::Static,
            Self::Dynamic(_) => StorageKind::Dynamic,
        }
    }

    pub fn layout(&self) -> &AnyLayout {
        delegate!(self, histogram => histogram.layout())
    }

    pub fn add_value(&mut self, value: f64) -> Result<&mut Self> {
        delegate!(self, histogram => { histogram.add_value(value)?; });
        Ok(self)
    }

    pub fn add_value_with_count(&mut self, value: f64, count: u64) -> Result<&mut Self> {
        delegate!(self, histogram => { histogram.add_value_with_count(value, count)?; });
        Ok(self)
    }

    pub fn add_ascending_sequence<F>(&mut self, values: F, length: u64) -> Result<&mut Self>
    where
        F: Fn(u64) -> f64,
    {
        delegate!(self, histogram => { histogram.add_ascending_sequence(values, length)?; });
        Ok(self)
    }

    pub fn add_histogram<L: Layout, S: BinCounts>(&mut self, other: &Histogram<L, S>) -> Result<&mut Self> {
        delegate!(self, histogram => { histogram.add_histogram(other)?; });
        Ok(self)
    }

    pub fn total_count(&self) -> u64 {
        delegate!(self, histogram => histogram.total_count())
    }

    pub fn underflow_count(&self) -> u64 {
        delegate!(self, histogram => histogram.underflow_count())
    }

    pub fn overflow_count(&self) -> u64 {
        delegate!(self, histogram => histogram.overflow_count())
    }

    pub fn min(&self) -> f64 {
        delegate!(self, histogram => histogram.min())
    }

    pub fn max(&self) -> f64 {
        delegate!(self, histogram => histogram.max())
    }

    pub fn is_empty(&self) -> bool {
        delegate!(self, histogram => histogram.is_empty())
    }

    pub fn value_estimate(&self, rank: u64) -> Result<f64> {
        delegate!(self, histogram => histogram.value_estimate(rank))
    }

    pub fn value_estimate_with(&self, rank: u64, estimator: ValueEstimator) -> Result<f64> {
        delegate!(self, histogram => histogram.value_estimate_with(rank, estimator))
    }

    pub fn quantile_estimate(&self, q: f64) -> Result<f64> {
        delegate!(self, histogram => histogram.quantile_estimate(q))
    }

    pub fn quantile_estimate_with(&self, q: f64, estimator: ValueEstimator) -> Result<f64> {
        delegate!(self, histogram => histogram.quantile_estimate_with(q, estimator))
    }

    /// Snapshot of the lowest non-empty bin
    pub fn first_non_empty_bin(&self) -> Result<Bin> {
        delegate!(self, histogram => histogram.first_non_empty_bin().map(|bin| bin.to_bin()))
    }

    /// Snapshot of the highest non-empty bin
    pub fn last_non_empty_bin(&self) -> Result<Bin> {
        delegate!(self, histogram => histogram.last_non_empty_bin().map(|bin| bin.to_bin()))
    }

    /// Snapshot of the bin holding `rank`
    pub fn bin_by_rank(&self, rank: u64) -> Result<Bin> {
        delegate!(self, histogram => histogram.bin_by_rank(rank).map(|bin| bin.to_bin()))
    }

    pub fn non_empty_bins(&self) -> Vec<Bin> {
        delegate!(self, histogram => histogram.non_empty_bins().collect())
    }

    pub fn preprocessed_copy(&self) -> PreprocessedHistogram<AnyLayout> {
        delegate!(self, histogram => histogram.preprocessed_copy())
    }

    pub fn estimated_footprint_bytes(&self) -> usize {
        delegate!(self, histogram => histogram.estimated_footprint_bytes())
    }

    /// Write the histogram without its layout
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        delegate!(self, histogram => histogram.write(writer))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        delegate!(self, histogram => histogram.to_bytes())
    }

    /// Write the layout followed by the histogram
    pub fn write_with_layout<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        delegate!(self, histogram => histogram.write_with_layout(writer))
    }

    /// Read a histogram written by [`write_with_layout`](Self::write_with_layout)
    /// into the given storage
    pub fn read_with_layout<R: Read + ?Sized>(reader: &mut R, storage: StorageKind) -> Result<Self> {
        Ok(match storage {
            StorageKind::Static => Self::Static(StaticHistogram::read_with_layout(reader)?),
            StorageKind::Dynamic => Self::Dynamic(DynamicHistogram::read_with_layout(reader)?),
        })
    }
}

impl std::fmt::Display for ConfiguredHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        delegate!(self, histogram => std::fmt::Display::fmt(histogram, f))
    }
}
