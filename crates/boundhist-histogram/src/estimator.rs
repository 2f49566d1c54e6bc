//! Value and quantile estimation

use boundhist_core::numeric::{interpolate, interpolate_between};
use boundhist_core::{Error, Result};
use boundhist_layout::Layout;
use serde::{Deserialize, Serialize};

use crate::bin::BinCursor;
use crate::histogram::Histogram;
use crate::storage::BinCounts;

/// How a value is placed inside its bin
///
/// Whatever the estimator, the smallest rank estimates to the recorded
/// minimum and the largest rank to the recorded maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueEstimator {
    /// Spread the values of a bin evenly across its bounds
    #[default]
    Uniform,
    LowerBound,
    UpperBound,
    MidPoint,
}

impl ValueEstimator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::LowerBound => "lower_bound",
            Self::UpperBound => "upper_bound",
            Self::MidPoint => "mid_point",
        }
    }

    fn estimate<L: Layout, S: BinCounts>(&self, bin: &BinCursor<'_, L, S>, rank: u64) -> f64 {
        let lower = bin.lower_bound();
        let upper = bin.upper_bound();
        match self {
            Self::LowerBound => lower,
            Self::UpperBound => upper,
            Self::MidPoint => interpolate(lower, upper, 0.5),
            Self::Uniform => {
                // the minimum and maximum occupy one rank each at the ends
                let reserved_low = u64::from(bin.is_first_non_empty_bin());
                let reserved_high = u64::from(bin.is_last_non_empty_bin());
                let spread = bin
                    .bin_count()
                    .saturating_sub(reserved_low + reserved_high)
                    .max(1);
                let offset = (rank - bin.less_count()).saturating_sub(reserved_low);
                let p = (offset as f64 + 0.5) / spread as f64;
                interpolate(lower, upper, p)
            }
        }
    }
}

impl<L: Layout, S: BinCounts> Histogram<L, S> {
    /// Estimate the value of zero-based `rank` with the uniform estimator
    pub fn value_estimate(&self, rank: u64) -> Result<f64> {
        self.value_estimate_with(rank, ValueEstimator::default())
    }

    pub fn value_estimate_with(&self, rank: u64, estimator: ValueEstimator) -> Result<f64> {
        if self.is_empty() {
            return Err(Error::empty_histogram());
        }
        if rank >= self.total_count {
            return Err(Error::rank_out_of_range(rank, self.total_count));
        }
        self.estimate_rank(rank, estimator)
    }

    /// Estimate the `q`-quantile with the uniform estimator
    ///
    /// The quantile sits at fractional rank `q * (total_count - 1)` and is
    /// interpolated between the estimates of the neighbouring ranks.
    pub fn quantile_estimate(&self, q: f64) -> Result<f64> {
        self.quantile_estimate_with(q, ValueEstimator::default())
    }

    pub fn quantile_estimate_with(&self, q: f64, estimator: ValueEstimator) -> Result<f64> {
        if !(0.0..=1.0).contains(&q) {
            return Err(Error::invalid_quantile(q));
        }
        if self.is_empty() {
            return Err(Error::empty_histogram());
        }
        let last_rank = self.total_count - 1;
        let position = q * last_rank as f64;
        let lower_rank = (position.floor() as u64).min(last_rank);
        let upper_rank = (position.ceil() as u64).min(last_rank);
        let lower_value = self.estimate_rank(lower_rank, estimator)?;
        if lower_rank == upper_rank {
            return Ok(lower_value);
        }
        let upper_value = self.estimate_rank(upper_rank, estimator)?;
        Ok(interpolate_between(
            position,
            lower_rank as f64,
            lower_value,
            upper_rank as f64,
            upper_value,
        ))
    }

    pub(crate) fn estimate_rank(&self, rank: u64, estimator: ValueEstimator) -> Result<f64> {
        if rank == 0 {
            return Ok(self.min);
        }
        if rank + 1 == self.total_count {
            return Ok(self.max);
        }
        let bin = self.bin_by_rank(rank)?;
        Ok(estimator.estimate(&bin, rank))
    }
}
