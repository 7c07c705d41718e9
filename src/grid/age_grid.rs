//! Time-weighted, three-component population grid.
//!
//! An `AgeGrid` holds one plane per age bin for each hydrogen-abundance class.
//! The planes handed to the constructor are per-dex densities; the grid keeps
//! them and, once, multiplies every plane by the number of years its bin spans.
//! All lookups (`weighted`, `total`, `at_log_age`, `stack`) work on the
//! weighted planes.
//!
//! Invariant: `weighted(c, i) == raw(c, i) * time_intervals()[i]` for every
//! class and bin, for the whole lifetime of the grid. Only `stack` mutates the
//! grid, and it only replaces the cached stacked planes.

use std::ops::{Index, Range};

use nalgebra::DMatrix;

use crate::domain::{Abundance, AgeUnit};
use crate::error::AppError;
use crate::grid::time_bins::{
    bin_for_log_age, bin_position, time_bins, time_intervals, LOG_AGE_MIN, LOG_AGE_UPPER_EDGE,
    N_BINS, YEARS_THRESHOLD,
};

/// One 2-D model plane (rows = first diagram axis, columns = second).
pub type Plane = DMatrix<f64>;

/// Planes at a single age bin.
#[derive(Debug, Clone, Copy)]
pub struct AgeSlice<'a> {
    pub bin: usize,
    pub log_age: f64,
    /// Sum of the three abundance classes.
    pub all: &'a Plane,
    pub high: &'a Plane,
    pub medium: &'a Plane,
    pub low: &'a Plane,
}

/// Weighted planes summed over a range of bins.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedGrids {
    /// Bins that were summed (`start` inclusive, `end` exclusive).
    pub bins: Range<usize>,
    pub high: Plane,
    pub medium: Plane,
    pub low: Plane,
    pub all: Plane,
}

#[derive(Debug, Clone)]
pub struct AgeGrid {
    raw: [Vec<Plane>; 3],
    weighted: [Vec<Plane>; 3],
    all: Vec<Plane>,
    time_bins: Vec<f64>,
    intervals: Vec<f64>,
    shape: (usize, usize),
    stacked: Option<StackedGrids>,
}

fn class_slot(class: Abundance) -> usize {
    match class {
        Abundance::High => 0,
        Abundance::Medium => 1,
        Abundance::Low => 2,
    }
}

impl AgeGrid {
    /// Build a grid from per-dex planes, applying the time weighting.
    ///
    /// Each class must provide exactly [`N_BINS`] planes, all with the same
    /// shape and finite values.
    pub fn new(high: Vec<Plane>, medium: Vec<Plane>, low: Vec<Plane>) -> Result<Self, AppError> {
        let shape = high
            .first()
            .map(|p| p.shape())
            .ok_or_else(|| AppError::format("High-H grid has no age bins."))?;

        for class in Abundance::ALL {
            let planes = match class {
                Abundance::High => &high,
                Abundance::Medium => &medium,
                Abundance::Low => &low,
            };
            if planes.len() != N_BINS {
                return Err(AppError::format(format!(
                    "{} grid has {} age bins; expected {N_BINS}.",
                    class.display_name(),
                    planes.len()
                )));
            }
            for (bin, plane) in planes.iter().enumerate() {
                if plane.shape() != shape {
                    return Err(AppError::format(format!(
                        "{} grid bin {bin} has shape {:?}; expected {:?}.",
                        class.display_name(),
                        plane.shape(),
                        shape
                    )));
                }
                if plane.iter().any(|v| !v.is_finite()) {
                    return Err(AppError::format(format!(
                        "{} grid bin {bin} contains non-finite values.",
                        class.display_name()
                    )));
                }
            }
        }

        let intervals = time_intervals();
        let raw = [high, medium, low];
        let weighted = raw.clone().map(|planes| {
            planes
                .iter()
                .zip(intervals.iter())
                .map(|(plane, &dt)| plane * dt)
                .collect::<Vec<_>>()
        });
        let all = (0..N_BINS)
            .map(|bin| &weighted[0][bin] + &weighted[1][bin] + &weighted[2][bin])
            .collect();

        log::debug!("built age grid: {N_BINS} bins of {}x{} cells", shape.0, shape.1);

        Ok(Self {
            raw,
            weighted,
            all,
            time_bins: time_bins(),
            intervals,
            shape,
            stacked: None,
        })
    }

    /// Plane shape `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn time_bins(&self) -> &[f64] {
        &self.time_bins
    }

    pub fn time_intervals(&self) -> &[f64] {
        &self.intervals
    }

    /// The unweighted plane for a class and bin, as given to the constructor.
    ///
    /// # Panics
    /// Panics if `bin >= N_BINS`.
    pub fn raw(&self, class: Abundance, bin: usize) -> &Plane {
        &self.raw[class_slot(class)][bin]
    }

    /// The time-weighted plane for a class and bin.
    ///
    /// # Panics
    /// Panics if `bin >= N_BINS`.
    pub fn weighted(&self, class: Abundance, bin: usize) -> &Plane {
        &self.weighted[class_slot(class)][bin]
    }

    /// All three classes summed at one bin.
    ///
    /// # Panics
    /// Panics if `bin >= N_BINS`.
    pub fn total(&self, bin: usize) -> &Plane {
        &self.all[bin]
    }

    /// Planes at the bin nearest to `log_age`.
    ///
    /// A log age that does not land on one of the 51 bins is rejected rather
    /// than clamped to the axis edge.
    pub fn at_log_age(&self, log_age: f64) -> Result<AgeSlice<'_>, AppError> {
        let bin = bin_for_log_age(log_age)?;
        Ok(AgeSlice {
            bin,
            log_age: self.time_bins[bin],
            all: &self.all[bin],
            high: &self.weighted[0][bin],
            medium: &self.weighted[1][bin],
            low: &self.weighted[2][bin],
        })
    }

    /// Sum the weighted planes between two ages, inferring the bound units.
    ///
    /// See [`AgeGrid::stack_with_unit`].
    pub fn stack(&mut self, age_min: Option<f64>, age_max: Option<f64>) -> Result<&StackedGrids, AppError> {
        self.stack_with_unit(age_min, age_max, AgeUnit::Auto)
    }

    /// Sum the weighted planes of bins `[bin(age_min), bin(age_max))` per class.
    ///
    /// Omitted bounds default to the axis edges. A given bound must land in
    /// `[6.0, 11.1]` once read as a log age, whatever its unit. The result
    /// replaces any previous stack, so repeated calls with the same bounds are
    /// idempotent.
    pub fn stack_with_unit(
        &mut self,
        age_min: Option<f64>,
        age_max: Option<f64>,
        unit: AgeUnit,
    ) -> Result<&StackedGrids, AppError> {
        let (log_min, log_max) = resolve_stack_bounds(age_min, age_max, unit)?;

        let clamp = |pos: i64| pos.clamp(0, N_BINS as i64) as usize;
        let bin_min = clamp(bin_position(log_min));
        let bin_max = clamp(bin_position(log_max)).max(bin_min);
        let bins = bin_min..bin_max;

        let (rows, cols) = self.shape;
        let mut sums = [
            Plane::zeros(rows, cols),
            Plane::zeros(rows, cols),
            Plane::zeros(rows, cols),
        ];
        for (slot, sum) in sums.iter_mut().enumerate() {
            for plane in &self.weighted[slot][bins.clone()] {
                *sum += plane;
            }
        }
        let [high, medium, low] = sums;
        let all = &high + &medium + &low;

        log::debug!("stacked bins {}..{} (log age {log_min:.2} to {log_max:.2})", bins.start, bins.end);

        Ok(&*self.stacked.insert(StackedGrids {
            bins,
            high,
            medium,
            low,
            all,
        }))
    }

    /// The most recent stack, if any.
    pub fn stacked(&self) -> Option<&StackedGrids> {
        self.stacked.as_ref()
    }
}

impl Index<usize> for AgeGrid {
    type Output = Plane;

    fn index(&self, bin: usize) -> &Plane {
        self.total(bin)
    }
}

/// Slack for bounds given in years, whose `log10` can miss the axis edge by rounding.
const AXIS_TOLERANCE: f64 = 1e-9;

/// Resolve optional stack bounds into log ages.
fn resolve_stack_bounds(
    age_min: Option<f64>,
    age_max: Option<f64>,
    unit: AgeUnit,
) -> Result<(f64, f64), AppError> {
    for bound in [age_min, age_max].into_iter().flatten() {
        if !bound.is_finite() {
            return Err(AppError::validation(format!("Invalid stack bound: {bound}.")));
        }
    }

    if let (Some(lo), Some(hi)) = (age_min, age_max) {
        if lo >= hi {
            return Err(AppError::validation(format!(
                "age_max ({hi}) should be greater than age_min ({lo})."
            )));
        }
    }

    let unit = match (unit, age_min, age_max) {
        (AgeUnit::Auto, Some(lo), Some(hi)) => {
            if lo >= LOG_AGE_MIN && hi <= LOG_AGE_UPPER_EDGE {
                AgeUnit::Log
            } else if lo > YEARS_THRESHOLD && hi > YEARS_THRESHOLD {
                log::info!("stack bounds look like years; converting to log ages");
                AgeUnit::Years
            } else {
                return Err(AppError::validation(format!(
                    "Cannot tell the units of stack bounds ({lo}, {hi}): give log ages in [6.0, 11.1] or years above 1e6."
                )));
            }
        }
        (AgeUnit::Auto, Some(v), None) | (AgeUnit::Auto, None, Some(v)) => {
            if v > YEARS_THRESHOLD { AgeUnit::Years } else { AgeUnit::Log }
        }
        (unit, _, _) => unit,
    };

    let to_log = |v: f64| -> Result<f64, AppError> {
        match unit {
            AgeUnit::Years => {
                if v <= 0.0 {
                    return Err(AppError::validation(format!("Age in years must be > 0, got {v}.")));
                }
                Ok(v.log10())
            }
            _ => Ok(v),
        }
    };

    let in_axis = |v: f64| -> Result<f64, AppError> {
        let log_age = to_log(v)?;
        if !(LOG_AGE_MIN - AXIS_TOLERANCE..=LOG_AGE_UPPER_EDGE + AXIS_TOLERANCE).contains(&log_age) {
            return Err(AppError::validation(format!(
                "Stack bound {v} is log age {log_age:.3}, outside [{LOG_AGE_MIN:.1}, {LOG_AGE_UPPER_EDGE:.1}]."
            )));
        }
        Ok(log_age)
    };

    let time_bins = time_bins();
    let first = time_bins[0];
    let last = time_bins[N_BINS - 1];

    let log_min = match age_min {
        Some(v) => in_axis(v)?,
        None => first,
    };
    let log_max = match age_max {
        Some(v) => in_axis(v)?,
        None => LOG_AGE_UPPER_EDGE,
    };

    if age_max.is_none() && log_min >= last {
        return Err(AppError::validation("age_min should be smaller than the maximum age (11.0)."));
    }
    if age_min.is_none() && log_max <= first {
        return Err(AppError::validation("age_max should be greater than the minimum age (6.0)."));
    }

    Ok((log_min, log_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 51 planes of shape 2x2 where cell `(i, j)` at bin `b` is `f(b, i, j)`.
    fn planes(f: impl Fn(usize, usize, usize) -> f64) -> Vec<Plane> {
        (0..N_BINS)
            .map(|b| Plane::from_fn(2, 2, |i, j| f(b, i, j)))
            .collect()
    }

    fn ones_grid() -> AgeGrid {
        AgeGrid::new(
            planes(|_, _, _| 1.0),
            planes(|_, _, _| 2.0),
            planes(|_, _, _| 3.0),
        )
        .unwrap()
    }

    #[test]
    fn weighting_is_applied_once_per_bin() {
        let grid = ones_grid();
        let dt = time_intervals();
        for bin in [0, 17, 50] {
            let w = grid.weighted(Abundance::High, bin);
            assert!(w.iter().all(|&v| (v - dt[bin]).abs() <= 1e-9 * dt[bin]));
            let w = grid.weighted(Abundance::Low, bin);
            assert!(w.iter().all(|&v| (v - 3.0 * dt[bin]).abs() <= 1e-9 * dt[bin]));
            assert_eq!(grid.raw(Abundance::Medium, bin)[(1, 1)], 2.0);
        }
    }

    #[test]
    fn total_and_index_sum_all_classes() {
        let grid = ones_grid();
        let dt = time_intervals();
        assert!((grid.total(5)[(0, 1)] - 6.0 * dt[5]).abs() <= 1e-9 * dt[5]);
        assert_eq!(grid[5], *grid.total(5));
    }

    #[test]
    fn at_log_age_returns_matching_bin() {
        let grid = AgeGrid::new(
            planes(|b, _, _| b as f64),
            planes(|_, _, _| 0.0),
            planes(|_, _, _| 0.0),
        )
        .unwrap();
        let slice = grid.at_log_age(7.0).unwrap();
        assert_eq!(slice.bin, 10);
        assert!((slice.log_age - 7.0).abs() < 1e-12);
        assert_eq!(slice.all, grid.total(10));
        assert_eq!(slice.high, grid.weighted(Abundance::High, 10));
        assert!(slice.low.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn at_log_age_rejects_out_of_range() {
        let grid = ones_grid();
        let err = grid.at_log_age(12.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(grid.at_log_age(5.0).is_err());
    }

    #[test]
    fn new_rejects_wrong_bin_count_and_shape() {
        let short: Vec<Plane> = planes(|_, _, _| 1.0).into_iter().take(50).collect();
        assert!(AgeGrid::new(short, planes(|_, _, _| 1.0), planes(|_, _, _| 1.0)).is_err());

        let mut odd = planes(|_, _, _| 1.0);
        odd[3] = Plane::zeros(3, 2);
        assert!(AgeGrid::new(planes(|_, _, _| 1.0), odd, planes(|_, _, _| 1.0)).is_err());
    }

    #[test]
    fn stack_is_idempotent() {
        let mut grid = ones_grid();
        let first = grid.stack(Some(7.0), Some(8.0)).unwrap().clone();
        let second = grid.stack(Some(7.0), Some(8.0)).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.bins, 10..20);
    }

    #[test]
    fn stack_sums_weighted_bins() {
        let mut grid = ones_grid();
        let dt = time_intervals();
        let expected: f64 = dt[10..20].iter().sum();
        let stacked = grid.stack(Some(7.0), Some(8.0)).unwrap();
        assert!((stacked.high[(0, 0)] - expected).abs() <= 1e-9 * expected);
        assert!((stacked.all[(0, 0)] - 6.0 * expected).abs() <= 1e-9 * expected);
    }

    #[test]
    fn stack_without_bounds_covers_every_bin() {
        let mut grid = ones_grid();
        let stacked = grid.stack(None, None).unwrap();
        assert_eq!(stacked.bins, 0..N_BINS);
        let open_max = grid.stack(Some(10.0), None).unwrap();
        assert_eq!(open_max.bins, 40..N_BINS);
    }

    #[test]
    fn stack_accepts_years() {
        let mut grid = ones_grid();
        let in_years = grid.stack(Some(1e7), Some(1e8)).unwrap().clone();
        let in_logs = grid.stack(Some(7.0), Some(8.0)).unwrap().clone();
        assert_eq!(in_years, in_logs);
    }

    #[test]
    fn stack_with_explicit_units() {
        let mut grid = ones_grid();
        let logs = grid.stack_with_unit(Some(7.0), Some(8.0), AgeUnit::Log).unwrap().clone();
        assert_eq!(logs.bins, 10..20);
        let years = grid.stack_with_unit(Some(1e7), Some(1e8), AgeUnit::Years).unwrap().clone();
        assert_eq!(years, logs);
        let open = grid.stack_with_unit(None, Some(1e7), AgeUnit::Years).unwrap();
        assert_eq!(open.bins, 0..10);
    }

    #[test]
    fn stack_rejects_bounds_off_the_axis() {
        let mut grid = ones_grid();
        let err = grid.stack(None, Some(5.0e5)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(grid.stack(Some(50.0), None).is_err());
        assert!(grid.stack_with_unit(Some(3.0), Some(4.0), AgeUnit::Log).is_err());
        assert!(grid.stack_with_unit(Some(10.0), Some(100.0), AgeUnit::Years).is_err());
        assert!(grid.stack_with_unit(Some(7.0), Some(8.0), AgeUnit::Years).is_err());
        assert!(grid.stack_with_unit(None, Some(1e12), AgeUnit::Years).is_err());
        assert!(grid.stacked().is_none());
    }

    #[test]
    fn stack_accepts_the_axis_edges() {
        let mut grid = ones_grid();
        let full = grid.stack_with_unit(Some(6.0), Some(11.1), AgeUnit::Log).unwrap().clone();
        assert_eq!(full.bins, 0..N_BINS);
        let in_years = grid
            .stack_with_unit(Some(1e6), Some(10f64.powf(11.1)), AgeUnit::Years)
            .unwrap();
        assert_eq!(in_years.bins, 0..N_BINS);
    }

    #[test]
    fn stack_rejects_inverted_or_ambiguous_bounds() {
        let mut grid = ones_grid();
        let err = grid.stack(Some(8.0), Some(7.0)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(grid.stack(Some(100.0), Some(200.0)).is_err());
        assert!(grid.stack(Some(11.0), None).is_err());
        assert!(grid.stacked().is_none());
    }
}
