//! The BPASS age axis.
//!
//! Population models are tabulated on 51 logarithmic age bins, log(age/yr)
//! from 6.0 to 11.0 in steps of 0.1. Each bin spans 0.1 dex centred on its
//! label, so the number of years it covers is
//!
//! `dt_i = 10^(t_i + 0.05) - 10^(t_i - 0.05)`
//!
//! Multiplying a per-dex model plane by `dt_i` turns it into a population count
//! ("time weighting").

use crate::error::AppError;

/// Number of age bins in every model grid.
pub const N_BINS: usize = 51;

/// Label of the first bin, log(age/yr).
pub const LOG_AGE_MIN: f64 = 6.0;

/// Spacing between bin labels, dex.
pub const LOG_AGE_STEP: f64 = 0.1;

/// Stack bounds above this are read as linear years when the unit is inferred.
pub const YEARS_THRESHOLD: f64 = 999_999.0;

/// Upper edge of the axis used by an open-ended stack (one past the last label).
pub const LOG_AGE_UPPER_EDGE: f64 = 11.1;

/// Bin labels: `6.0, 6.1, …, 11.0`.
pub fn time_bins() -> Vec<f64> {
    linear_axis(LOG_AGE_MIN, LOG_AGE_STEP, N_BINS)
}

/// Years spanned by each bin.
pub fn time_intervals() -> Vec<f64> {
    time_bins()
        .into_iter()
        .map(|t| 10f64.powf(t + LOG_AGE_STEP / 2.0) - 10f64.powf(t - LOG_AGE_STEP / 2.0))
        .collect()
}

/// Signed bin position of a log age: `round(10 * (log_age - 6))`, ties to even.
///
/// The result is not range-checked; see [`bin_for_log_age`].
pub fn bin_position(log_age: f64) -> i64 {
    (10.0 * (log_age - LOG_AGE_MIN)).round_ties_even() as i64
}

/// Bin index of a log age, rejecting anything outside `[0, N_BINS)`.
pub fn bin_for_log_age(log_age: f64) -> Result<usize, AppError> {
    if !log_age.is_finite() {
        return Err(AppError::validation(format!("Invalid log age: {log_age}.")));
    }
    let pos = bin_position(log_age);
    if pos < 0 || pos >= N_BINS as i64 {
        return Err(AppError::validation(format!(
            "log age {log_age} resolves to bin {pos}, outside the model axis (6.0 to 11.0)."
        )));
    }
    Ok(pos as usize)
}

/// `n` evenly spaced values `start, start + step, …` (each computed as
/// `start + i * step` so errors do not accumulate).
pub fn linear_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_bins_span_six_to_eleven() {
        let bins = time_bins();
        assert_eq!(bins.len(), N_BINS);
        assert_eq!(bins[0], 6.0);
        assert!((bins[50] - 11.0).abs() < 1e-12);
        assert!((bins[10] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn intervals_grow_with_age() {
        let dt = time_intervals();
        assert_eq!(dt.len(), N_BINS);
        let expected_first = 10f64.powf(6.05) - 10f64.powf(5.95);
        assert!((dt[0] - expected_first).abs() < 1e-6);
        assert!(dt.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn bin_for_log_age_rounds_to_nearest() {
        assert_eq!(bin_for_log_age(6.0).unwrap(), 0);
        assert_eq!(bin_for_log_age(7.04).unwrap(), 10);
        assert_eq!(bin_for_log_age(11.0).unwrap(), 50);
    }

    #[test]
    fn bin_for_log_age_rejects_out_of_range() {
        assert!(bin_for_log_age(5.9).is_err());
        assert!(bin_for_log_age(11.1).is_err());
        assert!(bin_for_log_age(f64::NAN).is_err());
    }
}
