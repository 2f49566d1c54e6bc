//! Configuration types for layouts

use serde::{Deserialize, Serialize};

use boundhist_core::Result;

use crate::any::AnyLayout;
use crate::custom::CustomLayout;
use crate::error_limiting::{ErrorLimitingLayout1, ErrorLimitingLayout2};
use crate::integer::IntegerLayout;
use crate::log_optimal::LogOptimalLayout;

/// Construction parameters of any built-in layout
///
/// Deserializes from a tagged map, e.g. in JSON:
///
/// ```rust
/// use boundhist_layout::{Layout, LayoutConfig};
///
/// let config: LayoutConfig = serde_json::from_str(
///     r#"{"kind": "log_optimal", "absolute_bin_width_limit": 1e-5,
///         "relative_bin_width_limit": 1e-2,
///         "value_range_lower_bound": 0, "value_range_upper_bound": 1e6}"#,
/// )
/// .unwrap();
/// let layout = config.build().unwrap();
/// assert!(layout.overflow_bin_index() > 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutConfig {
    /// [`ErrorLimitingLayout1`]
    #[serde(rename = "error_limiting1")]
    ErrorLimiting1(ErrorBounds),
    /// [`ErrorLimitingLayout2`]
    #[serde(rename = "error_limiting2")]
    ErrorLimiting2(ErrorBounds),
    /// [`LogOptimalLayout`]
    LogOptimal(ErrorBounds),
    /// [`CustomLayout`]
    Custom { boundaries: Vec<f64> },
    /// [`IntegerLayout`]
    Integer {
        underflow_bin_index: i32,
        overflow_bin_index: i32,
    },
}

/// Error limits and covered value range of an error-bounded layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorBounds {
    pub absolute_bin_width_limit: f64,
    pub relative_bin_width_limit: f64,
    pub value_range_lower_bound: f64,
    pub value_range_upper_bound: f64,
}

impl Default for ErrorBounds {
    /// 10µs absolute and 1% relative error over `[0, 1e6]`
    fn default() -> Self {
        Self {
            absolute_bin_width_limit: 1e-5,
            relative_bin_width_limit: 1e-2,
            value_range_lower_bound: 0.0,
            value_range_upper_bound: 1e6,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::ErrorLimiting2(ErrorBounds::default())
    }
}

impl LayoutConfig {
    /// Validate the parameters and construct the layout
    pub fn build(&self) -> Result<AnyLayout> {
        let layout = match self {
            Self::ErrorLimiting1(b) => ErrorLimitingLayout1::create(
                b.absolute_bin_width_limit,
                b.relative_bin_width_limit,
                b.value_range_lower_bound,
                b.value_range_upper_bound,
            )?
            .into(),
            Self::ErrorLimiting2(b) => ErrorLimitingLayout2::create(
                b.absolute_bin_width_limit,
                b.relative_bin_width_limit,
                b.value_range_lower_bound,
                b.value_range_upper_bound,
            )?
            .into(),
            Self::LogOptimal(b) => LogOptimalLayout::create(
                b.absolute_bin_width_limit,
                b.relative_bin_width_limit,
                b.value_range_lower_bound,
                b.value_range_upper_bound,
            )?
            .into(),
            Self::Custom { boundaries } => CustomLayout::new(boundaries)?.into(),
            Self::Integer {
                underflow_bin_index,
                overflow_bin_index,
            } => IntegerLayout::new(*underflow_bin_index, *overflow_bin_index)?.into(),
        };
        Ok(layout)
    }

    /// Get the name of this layout kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::ErrorLimiting1(_) => "error_limiting1",
            Self::ErrorLimiting2(_) => "error_limiting2",
            Self::LogOptimal(_) => "log_optimal",
            Self::Custom { .. } => "custom",
            Self::Integer { .. } => "integer",
        }
    }
}
