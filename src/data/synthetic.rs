//! Seeded synthetic HRD population.
//!
//! The model is a Gaussian blob in (logT, logL) whose centre slides down a
//! straight track as the population ages: hot and luminous at log(age) = 6,
//! cool and faint at 11. Each plane is scaled by the inverse of its bin width
//! so that, after the grid's time weighting, every bin holds the same number
//! of stars. Observations are drawn around the track position of one chosen
//! age, so the engine should recover that age.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::ObservationTable;
use crate::error::AppError;
use crate::grid::{bin_for_log_age, linear_axis, time_intervals, AgeGrid, HrDiagram, Plane, N_BINS};

/// Blob width along logT (dex).
const SIGMA_T: f64 = 0.08;
/// Blob width along logL (dex).
const SIGMA_L: f64 = 0.3;
/// Relative amplitude of the high / medium / low abundance classes.
const CLASS_AMPLITUDE: [f64; 3] = [1.0, 0.6, 0.3];
/// Multiplicative cell jitter (1 sigma).
const CELL_JITTER: f64 = 0.02;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Cells per axis.
    pub cells: usize,
    pub n_sources: usize,
    /// log10(age / yr) the observations are drawn around.
    pub log_age: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            cells: 40,
            n_sources: 30,
            log_age: 8.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticPopulation {
    pub model: HrDiagram,
    pub observations: ObservationTable,
    /// Bin the observations were drawn from.
    pub true_bin: usize,
}

/// Track centre `(logT, logL)` at an age bin.
pub fn track_centre(bin: usize) -> (f64, f64) {
    let frac = bin as f64 / (N_BINS - 1) as f64;
    (4.7 - 1.0 * frac, 4.0 - 3.5 * frac)
}

/// Generate the model and a batch of observations.
pub fn generate_population(config: &SyntheticConfig) -> Result<SyntheticPopulation, AppError> {
    if config.cells < 2 {
        return Err(AppError::validation("Synthetic grid needs at least 2 cells per axis."));
    }
    if config.n_sources == 0 {
        return Err(AppError::validation("Synthetic source count must be > 0."));
    }
    let true_bin = bin_for_log_age(config.log_age)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let unit = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::fatal(format!("Noise distribution error: {e}")))?;

    let model = synthetic_model(config.cells, &mut rng, &unit)?;
    let observations = synthetic_observations(true_bin, config.n_sources, &mut rng, &unit);
    log::info!(
        "generated synthetic population: {}x{} cells, {} sources around log(age)={:.1}",
        config.cells,
        config.cells,
        config.n_sources,
        config.log_age
    );

    Ok(SyntheticPopulation {
        model,
        observations,
        true_bin,
    })
}

fn synthetic_model(cells: usize, rng: &mut StdRng, unit: &Normal<f64>) -> Result<HrDiagram, AppError> {
    // Axes cover the whole track plus 3 sigma either side.
    let t_step = (4.7 - 3.7 + 6.0 * SIGMA_T) / (cells - 1) as f64;
    let l_step = (4.0 - 0.5 + 6.0 * SIGMA_L) / (cells - 1) as f64;
    let t_axis = linear_axis(3.7 - 3.0 * SIGMA_T, t_step, cells);
    let l_axis = linear_axis(0.5 - 3.0 * SIGMA_L, l_step, cells);
    let dt = time_intervals();

    let mut classes: [Vec<Plane>; 3] = Default::default();
    for (class, amplitude) in classes.iter_mut().zip(CLASS_AMPLITUDE) {
        for (bin, width) in dt.iter().enumerate() {
            let (tc, lc) = track_centre(bin);
            let plane = Plane::from_fn(cells, cells, |i, j| {
                let zt = (t_axis[i] - tc) / SIGMA_T;
                let zl = (l_axis[j] - lc) / SIGMA_L;
                let jitter = (1.0 + CELL_JITTER * unit.sample(rng)).max(0.0);
                amplitude * (-0.5 * (zt * zt + zl * zl)).exp() * jitter / width
            });
            class.push(plane);
        }
    }

    let [high, medium, low] = classes;
    let grid = AgeGrid::new(high, medium, low)?;
    HrDiagram::new(t_axis, l_axis, grid)
}

fn synthetic_observations(bin: usize, n: usize, rng: &mut StdRng, unit: &Normal<f64>) -> ObservationTable {
    let (tc, lc) = track_centre(bin);
    let points: Vec<(f64, f64)> = (0..n)
        .map(|_| {
            let t = tc + SIGMA_T * unit.sample(rng);
            let l = lc + SIGMA_L * unit.sample(rng);
            ((t * 1e4).round() / 1e4, (l * 1e4).round() / 1e4)
        })
        .collect();
    let names: Vec<String> = (0..n).map(|i| format!("syn{i:03}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    ObservationTable::from_hrd_points(&points, Some(&names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::AgeWizard;
    use crate::domain::Abundance;
    use crate::grid::time_bins;

    #[test]
    fn same_seed_same_population() {
        let config = SyntheticConfig::default();
        let a = generate_population(&config).unwrap();
        let b = generate_population(&config).unwrap();
        assert_eq!(a.observations, b.observations);
        assert_eq!(a.model.grid().raw(Abundance::Low, 12), b.model.grid().raw(Abundance::Low, 12));

        let other = generate_population(&SyntheticConfig { seed: 7, ..config }).unwrap();
        assert_ne!(a.observations, other.observations);
    }

    #[test]
    fn model_bins_hold_comparable_mass() {
        let population = generate_population(&SyntheticConfig::default()).unwrap();
        let grid = population.model.grid();
        let first = grid.total(10).sum();
        let last = grid.total(40).sum();
        assert!(first > 0.0);
        assert!((first / last - 1.0).abs() < 0.1, "{first} vs {last}");
    }

    #[test]
    fn wizard_recovers_the_drawn_age() {
        let config = SyntheticConfig {
            n_sources: 50,
            ..SyntheticConfig::default()
        };
        let population = generate_population(&config).unwrap();
        let mut wizard = AgeWizard::new(population.observations, population.model).unwrap();
        wizard.combine(&[], true);
        let age = wizard.most_likely_age().unwrap();
        assert_eq!(population.true_bin, 20);
        assert!((age - time_bins()[20]).abs() <= 0.25, "recovered {age}");
    }

    #[test]
    fn rejects_out_of_range_age() {
        let config = SyntheticConfig {
            log_age: 12.0,
            ..SyntheticConfig::default()
        };
        assert!(generate_population(&config).is_err());
    }
}
