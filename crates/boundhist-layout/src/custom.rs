//! Layout with caller-supplied bin boundaries

use std::fmt;
use std::hash::{Hash, Hasher};

use boundhist_core::{Error, Result};

use crate::traits::Layout;

/// Layout defined by an explicit, strictly increasing list of boundaries
///
/// With boundaries `b_0 < b_1 < ... < b_{n-1}`, regular bin `i` (for
/// `1 <= i < n`) is `[b_{i-1}, b_i)`. Values below `b_0` map to the underflow
/// index `0`, values from `b_{n-1}` upwards to the overflow index `n`.
///
/// Mostly used as a reporting layout: record with an error-bounded layout,
/// then merge into a histogram with human-chosen bin edges.
///
/// # Example
///
/// ```rust
/// use boundhist_layout::{CustomLayout, Layout};
///
/// let layout = CustomLayout::new(&[0.0, 1.0, 10.0, 100.0]).unwrap();
/// assert_eq!(layout.value_to_bin_index(-5.0), 0);
/// assert_eq!(layout.value_to_bin_index(5.0), 2);
/// assert_eq!(layout.value_to_bin_index(100.0), 4);
/// assert_eq!(layout.bin_lower_bound(2), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct CustomLayout {
    boundaries: Vec<f64>,
}

impl CustomLayout {
    pub fn new(boundaries: &[f64]) -> Result<Self> {
        if boundaries.is_empty() {
            return Err(Error::InvalidParameter(
                "custom layout needs at least one boundary".to_string(),
            ));
        }
        if boundaries.iter().any(|b| b.is_nan()) {
            return Err(Error::InvalidParameter(
                "custom layout boundaries must not be NaN".to_string(),
            ));
        }
        if let Some(pair) = boundaries
            .windows(2)
            .find(|pair| pair[0].total_cmp(&pair[1]).is_ge())
        {
            return Err(Error::InvalidParameter(format!(
                "custom layout boundaries must be strictly increasing, found {} before {}",
                pair[0], pair[1]
            )));
        }
        if i32::try_from(boundaries.len()).is_err() {
            return Err(Error::InvalidParameter(format!(
                "custom layout supports at most {} boundaries",
                i32::MAX
            )));
        }
        tracing::debug!(
            layout = "CustomLayout",
            boundaries = boundaries.len(),
            "created layout"
        );
        Ok(Self {
            boundaries: boundaries.to_vec(),
        })
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }
}

impl Layout for CustomLayout {
    fn value_to_bin_index(&self, value: f64) -> i32 {
        if value.is_nan() {
            return self.overflow_bin_index();
        }
        // -0.0 sorts below +0.0 so a +0.0 boundary excludes -0.0
        self.boundaries
            .partition_point(|boundary| boundary.total_cmp(&value).is_le()) as i32
    }

    fn underflow_bin_index(&self) -> i32 {
        0
    }

    fn overflow_bin_index(&self) -> i32 {
        self.boundaries.len() as i32
    }

    fn bin_lower_bound_approximation(&self, bin_index: i32) -> f64 {
        if bin_index <= 0 {
            return f64::NEG_INFINITY;
        }
        let position = (bin_index as usize - 1).min(self.boundaries.len() - 1);
        self.boundaries[position]
    }

    fn bin_lower_bound(&self, bin_index: i32) -> f64 {
        self.bin_lower_bound_approximation(bin_index)
    }
}

impl PartialEq for CustomLayout {
    fn eq(&self, other: &Self) -> bool {
        self.boundaries.len() == other.boundaries.len()
            && self
                .boundaries
                .iter()
                .zip(&other.boundaries)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for CustomLayout {}

impl Hash for CustomLayout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.boundaries.len().hash(state);
        for boundary in &self.boundaries {
            boundary.to_bits().hash(state);
        }
    }
}

impl fmt::Display for CustomLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomLayout [boundaries=[")?;
        for (i, boundary) in self.boundaries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{boundary}")?;
        }
        write!(f, "]]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundhist_core::ErrorKind;

    #[test]
    fn test_indices_and_bounds() {
        let layout = CustomLayout::new(&[-1.0, 0.0, 2.5, 7.0]).unwrap();
        assert_eq!(layout.underflow_bin_index(), 0);
        assert_eq!(layout.overflow_bin_index(), 4);
        assert_eq!(layout.value_to_bin_index(f64::NEG_INFINITY), 0);
        assert_eq!(layout.value_to_bin_index(-1.0), 1);
        assert_eq!(layout.value_to_bin_index(-0.0), 1);
        assert_eq!(layout.value_to_bin_index(0.0), 2);
        assert_eq!(layout.value_to_bin_index(2.4), 2);
        assert_eq!(layout.value_to_bin_index(7.0), 4);
        assert_eq!(layout.value_to_bin_index(f64::INFINITY), 4);
        assert_eq!(layout.value_to_bin_index(f64::NAN), 4);

        assert_eq!(layout.bin_lower_bound(0), f64::NEG_INFINITY);
        assert_eq!(layout.bin_lower_bound(1), -1.0);
        assert_eq!(layout.bin_lower_bound(3), 2.5);
        assert_eq!(layout.bin_lower_bound(4), 7.0);
        assert_eq!(layout.bin_upper_bound(1).to_bits(), (-0.0f64).to_bits());
        assert_eq!(layout.bin_upper_bound(4), f64::INFINITY);
    }

    #[test]
    fn test_invalid_boundaries() {
        for boundaries in [
            vec![],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![0.0, f64::NAN],
            vec![0.0, -0.0],
        ] {
            let err = CustomLayout::new(&boundaries).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert!(CustomLayout::new(&[f64::NEG_INFINITY, -0.0, 0.0, f64::INFINITY]).is_ok());
    }

    #[test]
    fn test_display_and_equality() {
        let layout = CustomLayout::new(&[0.0, 1.0, 10.0]).unwrap();
        assert_eq!(layout.to_string(), "CustomLayout [boundaries=[0, 1, 10]]");
        assert_eq!(layout, CustomLayout::new(&[0.0, 1.0, 10.0]).unwrap());
        assert_ne!(layout, CustomLayout::new(&[-0.0, 1.0, 10.0]).unwrap());
    }
}
