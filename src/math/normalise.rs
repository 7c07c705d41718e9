//! Normalisation helpers for age distributions.
//!
//! A profile whose total is zero (or not finite) has no probability mass to
//! spread. Dividing by the total would produce NaN everywhere, so such profiles
//! normalise to all zeros instead.

/// Divide every element by the sum of the slice.
///
/// All-zero input stays all-zero.
pub fn normalise(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}

/// Round to two decimals, ties to even (matches the rounding used to compare
/// bin labels and column totals).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
