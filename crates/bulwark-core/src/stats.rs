//! Helpers shared by the stats snapshots of every pattern.

/// Rounds a value to two decimal places.
///
/// ```
/// use bulwark_core::round2;
///
/// assert_eq!(round2(66.666_666), 66.67);
/// assert_eq!(round2(0.0), 0.0);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns `part / whole * 100`, rounded to two decimals.
///
/// A zero `whole` yields `0.0` rather than `NaN`.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}
