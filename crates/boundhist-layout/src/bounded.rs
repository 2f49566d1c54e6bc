//! Shared machinery of the error-bounded layouts
//!
//! Magnitudes below the transition point `absolute / relative` get linear bins
//! of width `absolute`. Above it, bins are equally wide on a logarithm-like
//! [`Scale`], with a scale factor chosen so each bin is at most `relative`
//! times its lower bound wide. Negative values mirror positive ones.

use boundhist_core::{Error, Result};

const MANTISSA_BITS: u32 = 52;
const MANTISSA_MASK: u64 = (1 << MANTISSA_BITS) - 1;
const MAX_EXPONENT_FIELD: i64 = 0x7FF;
const INFINITY_BITS: u64 = 0x7FF0_0000_0000_0000;

/// Logarithm-like scale used above the transition point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scale {
    /// Exponent plus mantissa fraction, read straight from the bit pattern
    Linear,
    /// Exponent plus quadratically interpolated mantissa
    Quadratic,
    /// Natural logarithm
    Logarithmic,
}

/// `g(t) = t + t(1 - t)/3`, the mantissa interpolation of [`Scale::Quadratic`]
#[inline]
fn quadratic(t: f64) -> f64 {
    t * (4.0 - t) / 3.0
}

/// Inverse of [`quadratic`] on `[0, 1]`
#[inline]
fn quadratic_inverse(g: f64) -> f64 {
    (2.0 - (4.0 - 3.0 * g).max(0.0).sqrt()).clamp(0.0, 1.0)
}

impl Scale {
    /// Number of scale units per octave relative to `1 + 1/relative`
    fn factor(self, relative: f64) -> f64 {
        match self {
            Scale::Linear => 1.0 + 1.0 / relative,
            Scale::Quadratic => (1.0 + 1.0 / relative) * 0.75,
            Scale::Logarithmic => 1.0 / relative.ln_1p(),
        }
    }

    /// Scale position of `x` measured from `origin`, both positive
    fn distance(self, origin: f64, x: f64) -> f64 {
        match self {
            Scale::Linear => {
                let delta = x.to_bits() as i64 - origin.to_bits() as i64;
                delta as f64 / (1u64 << MANTISSA_BITS) as f64
            }
            Scale::Quadratic => {
                let (e, m) = split(x);
                let (e0, m0) = split(origin);
                ((e - e0) as f64 + quadratic(m)) - quadratic(m0)
            }
            Scale::Logarithmic => x.ln() - origin.ln(),
        }
    }

    /// Value at scale distance `distance` from `origin`
    fn advance(self, origin: f64, distance: f64) -> f64 {
        match self {
            Scale::Linear => {
                let bits = origin.to_bits() as f64 + distance * (1u64 << MANTISSA_BITS) as f64;
                f64::from_bits(bits.clamp(0.0, INFINITY_BITS as f64) as u64)
            }
            Scale::Quadratic => {
                let (e0, m0) = split(origin);
                let position = e0 as f64 + quadratic(m0) + distance;
                let exponent = position.floor();
                if exponent >= MAX_EXPONENT_FIELD as f64 {
                    return f64::INFINITY;
                }
                if exponent < 0.0 {
                    return 0.0;
                }
                let mantissa = quadratic_inverse(position - exponent);
                let fraction = ((mantissa * (1u64 << MANTISSA_BITS) as f64) as u64).min(MANTISSA_MASK);
                f64::from_bits(((exponent as u64) << MANTISSA_BITS) | fraction)
            }
            Scale::Logarithmic => origin * distance.exp(),
        }
    }
}

/// Exponent field and mantissa fraction of a non-negative double
#[inline]
fn split(x: f64) -> (i64, f64) {
    let bits = x.to_bits();
    let exponent = (bits >> MANTISSA_BITS) as i64;
    let mantissa = (bits & MANTISSA_MASK) as f64 / (1u64 << MANTISSA_BITS) as f64;
    (exponent, mantissa)
}

/// Error-bounded value-to-index mapping
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundedMapping {
    scale: Scale,
    absolute: f64,
    transition: f64,
    first_scaled_index: i64,
    factor: f64,
}

impl BoundedMapping {
    pub(crate) fn new(scale: Scale, absolute_limit: f64, relative_limit: f64) -> Result<Self> {
        validate_limits(absolute_limit, relative_limit)?;
        let absolute = absolute_limit.max(f64::MIN_POSITIVE);
        let (transition, factor) = if relative_limit > 0.0 {
            (absolute / relative_limit, scale.factor(relative_limit))
        } else {
            (f64::INFINITY, 0.0)
        };
        let first_scaled_index = (transition / absolute).ceil() as i64;
        Ok(Self {
            scale,
            absolute,
            transition,
            first_scaled_index,
            factor,
        })
    }

    fn magnitude_index(&self, x: f64) -> i64 {
        if x < self.transition {
            return (x / self.absolute) as i64;
        }
        let steps = (self.factor * self.scale.distance(self.transition, x)).floor();
        self.first_scaled_index.saturating_add(steps as i64)
    }

    fn magnitude_lower_bound(&self, index: i64) -> f64 {
        if index < self.first_scaled_index {
            return index as f64 * self.absolute;
        }
        let distance = (index - self.first_scaled_index) as f64 / self.factor;
        self.scale.advance(self.transition, distance)
    }

    /// Unclamped index of a finite value
    pub(crate) fn index(&self, value: f64) -> i64 {
        if value.is_sign_negative() {
            -1 - self.magnitude_index(-value)
        } else {
            self.magnitude_index(value)
        }
    }

    /// Total mapping onto `i32`
    pub(crate) fn bin_index(&self, value: f64) -> i32 {
        if value.is_nan() || value == f64::INFINITY {
            return i32::MAX;
        }
        if value == f64::NEG_INFINITY {
            return i32::MIN;
        }
        self.index(value)
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    pub(crate) fn lower_bound_approximation(&self, bin_index: i32) -> f64 {
        let index = i64::from(bin_index);
        if index >= 0 {
            self.magnitude_lower_bound(index)
        } else {
            -self.magnitude_lower_bound(-index)
        }
    }

    /// Underflow and overflow indices for the closed range `[lower, upper]`
    pub(crate) fn range_indices(&self, lower: f64, upper: f64) -> Result<(i32, i32)> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "value range [{lower}, {upper}] must be finite"
            )));
        }
        if lower > upper {
            return Err(Error::InvalidParameter(format!(
                "value range lower bound {lower} exceeds upper bound {upper}"
            )));
        }
        let underflow = self.index(lower).saturating_sub(1);
        let overflow = self.index(upper).saturating_add(1);
        let underflow = i32::try_from(underflow).map_err(|_| {
            Error::InvalidParameter(format!("underflow index {underflow} exceeds i32 range"))
        })?;
        let overflow = i32::try_from(overflow).map_err(|_| {
            Error::InvalidParameter(format!("overflow index {overflow} exceeds i32 range"))
        })?;
        Ok((underflow, overflow))
    }
}

impl BoundedMapping {
    /// Outermost underflow and overflow indices any finite value range can produce
    pub(crate) fn reachable_indices(&self) -> (i64, i64) {
        (
            self.index(-f64::MAX).saturating_sub(1),
            self.index(f64::MAX).saturating_add(1),
        )
    }

    /// Reject index ranges no value range maps to
    pub(crate) fn validate_reachable(&self, underflow: i32, overflow: i32) -> Result<()> {
        let (lowest, highest) = self.reachable_indices();
        if i64::from(underflow) < lowest || i64::from(overflow) > highest {
            return Err(Error::InvalidParameter(format!(
                "bin index range ({underflow}, {overflow}) exceeds reachable range ({lowest}, {highest})"
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_limits(absolute: f64, relative: f64) -> Result<()> {
    if !absolute.is_finite() || absolute < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "absolute bin width limit {absolute} must be finite and non-negative"
        )));
    }
    if !relative.is_finite() || relative < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "relative bin width limit {relative} must be finite and non-negative"
        )));
    }
    if absolute == 0.0 && relative == 0.0 {
        return Err(Error::InvalidParameter(
            "absolute and relative bin width limits must not both be zero".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_indices(underflow: i32, overflow: i32) -> Result<()> {
    if underflow >= overflow {
        return Err(Error::InvalidParameter(format!(
            "underflow index {underflow} must be less than overflow index {overflow}"
        )));
    }
    Ok(())
}


/// Struct definition and trait impls shared by the error-bounded layouts
macro_rules! impl_error_bounded_layout {
    ($(#[$meta:meta])* $layout:ident, $scale:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $layout {
            absolute_bin_width_limit: f64,
            relative_bin_width_limit: f64,
            underflow_bin_index: i32,
            overflow_bin_index: i32,
            mapping: $crate::bounded::BoundedMapping,
        }

        impl $layout {
            /// Create a layout whose regular bins cover
            /// `[value_range_lower_bound, value_range_upper_bound]`
            ///
            /// Every regular bin `[l, u]` satisfies
            /// `u - l <= max(absolute_bin_width_limit, relative_bin_width_limit * min(|l|, |u|))`.
            pub fn create(
                absolute_bin_width_limit: f64,
                relative_bin_width_limit: f64,
                value_range_lower_bound: f64,
                value_range_upper_bound: f64,
            ) -> boundhist_core::Result<Self> {
                let mapping = $crate::bounded::BoundedMapping::new(
                    $scale,
                    absolute_bin_width_limit,
                    relative_bin_width_limit,
                )?;
                let (underflow_bin_index, overflow_bin_index) =
                    mapping.range_indices(value_range_lower_bound, value_range_upper_bound)?;
                tracing::debug!(
                    layout = stringify!($layout),
                    underflow_bin_index,
                    overflow_bin_index,
                    "created layout"
                );
                Ok(Self {
                    absolute_bin_width_limit,
                    relative_bin_width_limit,
                    underflow_bin_index,
                    overflow_bin_index,
                    mapping,
                })
            }

            /// Create a layout from its error limits and explicit index range
            pub fn from_indices(
                absolute_bin_width_limit: f64,
                relative_bin_width_limit: f64,
                underflow_bin_index: i32,
                overflow_bin_index: i32,
            ) -> boundhist_core::Result<Self> {
                let mapping = $crate::bounded::BoundedMapping::new(
                    $scale,
                    absolute_bin_width_limit,
                    relative_bin_width_limit,
                )?;
                $crate::bounded::validate_indices(underflow_bin_index, overflow_bin_index)?;
                mapping.validate_reachable(underflow_bin_index, overflow_bin_index)?;
                Ok(Self {
                    absolute_bin_width_limit,
                    relative_bin_width_limit,
                    underflow_bin_index,
                    overflow_bin_index,
                    mapping,
                })
            }

            pub fn absolute_bin_width_limit(&self) -> f64 {
                self.absolute_bin_width_limit
            }

            pub fn relative_bin_width_limit(&self) -> f64 {
                self.relative_bin_width_limit
            }
        }

        impl $crate::traits::Layout for $layout {
            #[inline]
            fn value_to_bin_index(&self, value: f64) -> i32 {
                self.mapping.bin_index(value)
            }

            fn underflow_bin_index(&self) -> i32 {
                self.underflow_bin_index
            }

            fn overflow_bin_index(&self) -> i32 {
                self.overflow_bin_index
            }

            fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64 {
                self.mapping.lower_bound_approximation(bin_index)
            }
        }

        impl PartialEq for $layout {
            fn eq(&self, other: &Self) -> bool {
                self.absolute_bin_width_limit.to_bits() == other.absolute_bin_width_limit.to_bits()
                    && self.relative_bin_width_limit.to_bits()
                        == other.relative_bin_width_limit.to_bits()
                    && self.underflow_bin_index == other.underflow_bin_index
                    && self.overflow_bin_index == other.overflow_bin_index
            }
        }

        impl Eq for $layout {}

        impl std::hash::Hash for $layout {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.absolute_bin_width_limit.to_bits().hash(state);
                self.relative_bin_width_limit.to_bits().hash(state);
                self.underflow_bin_index.hash(state);
                self.overflow_bin_index.hash(state);
            }
        }

        impl std::fmt::Display for $layout {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    "{} [absolute_bin_width_limit={}, relative_bin_width_limit={}, underflow_bin_index={}, overflow_bin_index={}]",
                    stringify!($layout),
                    self.absolute_bin_width_limit,
                    self.relative_bin_width_limit,
                    self.underflow_bin_index,
                    self.overflow_bin_index
                )
            }
        }
    };
}

pub(crate) use impl_error_bounded_layout;
