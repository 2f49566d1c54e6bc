//! Floating-point helpers shared by layouts and estimators
//!
//! The order-preserving mapping between `f64` and `i64` lets bin boundaries be
//! found by integer search over every representable double, so that layout
//! bounds are exact inverses of the forward mapping.

/// Map a double to an `i64` whose natural order matches the IEEE total order
///
/// `-0.0` maps to `-1` and `+0.0` to `0`. The mapping is its own inverse,
/// see [`ordered_to_f64`].
#[inline]
pub fn f64_to_ordered(value: f64) -> i64 {
    let bits = value.to_bits() as i64;
    bits ^ ((((bits >> 63) as u64) >> 1) as i64)
}

/// Inverse of [`f64_to_ordered`]
#[inline]
pub fn ordered_to_f64(ordered: i64) -> f64 {
    f64::from_bits((ordered ^ ((((ordered >> 63) as u64) >> 1) as i64)) as u64)
}

/// Ordered representation of `-inf`
pub const NEGATIVE_INFINITY_ORDERED: i64 = -0x7FF0_0000_0000_0001;

/// Ordered representation of `+inf`
pub const POSITIVE_INFINITY_ORDERED: i64 = 0x7FF0_0000_0000_0000;

/// Find the smallest `x` in `[lo, hi]` for which `pred(x)` holds
///
/// `pred` must be monotone (false then true) on `[lo, hi]` and `pred(hi)` must
/// hold. The search gallops outward from `guess` and then bisects, so a good
/// guess costs only a handful of predicate evaluations.
pub fn find_first<P>(pred: P, lo: i64, hi: i64, guess: i64) -> i64
where
    P: Fn(i64) -> bool,
{
    let lo = lo as i128;
    let hi = hi as i128;
    let guess = (guess as i128).clamp(lo, hi);

    // pred(low) is false (or low is lo - 1), pred(high) is true
    let mut low;
    let mut high;
    let mut step: i128 = 1;
    if pred(guess as i64) {
        high = guess;
        loop {
            let candidate = high - step;
            if candidate < lo {
                low = lo - 1;
                break;
            }
            if pred(candidate as i64) {
                high = candidate;
                step <<= 1;
            } else {
                low = candidate;
                break;
            }
        }
    } else {
        low = guess;
        loop {
            let candidate = low + step;
            if candidate >= hi {
                high = hi;
                break;
            }
            if pred(candidate as i64) {
                high = candidate;
                break;
            }
            low = candidate;
            step <<= 1;
        }
    }

    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if pred(mid as i64) {
            high = mid;
        } else {
            low = mid;
        }
    }
    high as i64
}

/// Interpolate between `lower` and `upper` at fraction `p` in `[0, 1]`
///
/// Infinite endpoints never produce NaN: an infinite side wins unless both
/// sides are infinite, in which case `p` decides.
pub fn interpolate(lower: f64, upper: f64, p: f64) -> f64 {
    if lower == upper {
        return lower;
    }
    match (lower == f64::NEG_INFINITY, upper == f64::INFINITY) {
        (true, true) => {
            if p < 0.5 {
                f64::NEG_INFINITY
            } else if p > 0.5 {
                f64::INFINITY
            } else {
                0.0
            }
        }
        (true, false) => f64::NEG_INFINITY,
        (false, true) => f64::INFINITY,
        (false, false) => {
            let width = upper - lower;
            let value = if width.is_finite() {
                lower + width * p
            } else {
                lower * (1.0 - p) + upper * p
            };
            value.clamp(lower, upper)
        }
    }
}

/// Linear interpolation of `y` at `x` on the line through `(x1, y1)` and `(x2, y2)`
///
/// Equal ordinates are returned unchanged, and infinite ordinates resolve to
/// the nearer side, so monotone inputs give monotone outputs.
pub fn interpolate_between(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if y1 == y2 || x1 == x2 {
        return y1;
    }
    let p = ((x - x1) / (x2 - x1)).clamp(0.0, 1.0);
    if y1.is_infinite() || y2.is_infinite() {
        return if p < 0.5 { y1 } else { y2 };
    }
    interpolate(y1, y2, p)
}
