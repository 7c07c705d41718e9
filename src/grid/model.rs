//! Model grids the age engine can be matched against.
//!
//! A model is one of a closed set of diagram kinds, chosen once when the model
//! is built:
//!
//! - `Hrd`: a time-weighted [`AgeGrid`] over (logT, logL), planes indexed `[T, L]`
//! - `Cmd`: combined planes over (colour, magnitude), indexed `[mag, col]`
//!
//! Both expose the same two primitives to the engine: the axis coordinate
//! arrays (for nearest-cell resolution) and the combined plane at an age bin
//! (for PDF construction).

use crate::domain::DiagramKind;
use crate::error::AppError;
use crate::grid::age_grid::{AgeGrid, Plane};
use crate::grid::time_bins::{linear_axis, time_bins, N_BINS};

/// Cells per axis in a BPASS HR diagram.
pub const BPASS_HRD_CELLS: usize = 100;

/// Standard BPASS logT axis: `0.1, 0.2, …, 10.0`.
pub fn bpass_log_t_axis() -> Vec<f64> {
    linear_axis(0.1, 0.1, BPASS_HRD_CELLS)
}

/// Standard BPASS logL axis: `-2.9, -2.8, …, 7.0`.
pub fn bpass_log_l_axis() -> Vec<f64> {
    linear_axis(-2.9, 0.1, BPASS_HRD_CELLS)
}

/// Hertzsprung-Russell diagram model.
#[derive(Debug, Clone)]
pub struct HrDiagram {
    t_axis: Vec<f64>,
    l_axis: Vec<f64>,
    grid: AgeGrid,
}

impl HrDiagram {
    /// Build an HRD from explicit axes. Plane rows follow `t_axis`, columns `l_axis`.
    pub fn new(t_axis: Vec<f64>, l_axis: Vec<f64>, grid: AgeGrid) -> Result<Self, AppError> {
        validate_axis("logT", &t_axis)?;
        validate_axis("logL", &l_axis)?;
        let (rows, cols) = grid.shape();
        if rows != t_axis.len() || cols != l_axis.len() {
            return Err(AppError::format(format!(
                "HRD planes are {rows}x{cols} but the axes have {} (logT) x {} (logL) cells.",
                t_axis.len(),
                l_axis.len()
            )));
        }
        Ok(Self { t_axis, l_axis, grid })
    }

    /// Build an HRD on the standard BPASS axes (100x100 cells).
    pub fn bpass(grid: AgeGrid) -> Result<Self, AppError> {
        Self::new(bpass_log_t_axis(), bpass_log_l_axis(), grid)
    }

    pub fn t_axis(&self) -> &[f64] {
        &self.t_axis
    }

    pub fn l_axis(&self) -> &[f64] {
        &self.l_axis
    }

    pub fn grid(&self) -> &AgeGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut AgeGrid {
        &mut self.grid
    }
}

/// Colour-magnitude diagram model.
///
/// CMD models carry only the combined (all-abundance) planes.
#[derive(Debug, Clone)]
pub struct ColourMagnitudeDiagram {
    col_range: Vec<f64>,
    mag_range: Vec<f64>,
    planes: Vec<Plane>,
}

impl ColourMagnitudeDiagram {
    /// Build a CMD. Every plane must be `mag_range.len()` x `col_range.len()`.
    pub fn new(col_range: Vec<f64>, mag_range: Vec<f64>, planes: Vec<Plane>) -> Result<Self, AppError> {
        validate_axis("colour", &col_range)?;
        validate_axis("magnitude", &mag_range)?;
        if planes.len() != N_BINS {
            return Err(AppError::format(format!(
                "CMD has {} age bins; expected {N_BINS}.",
                planes.len()
            )));
        }
        let expected = (mag_range.len(), col_range.len());
        for (bin, plane) in planes.iter().enumerate() {
            if plane.shape() != expected {
                return Err(AppError::format(format!(
                    "CMD bin {bin} has shape {:?}; expected {expected:?} (mag x col).",
                    plane.shape()
                )));
            }
            if plane.iter().any(|v| !v.is_finite()) {
                return Err(AppError::format(format!("CMD bin {bin} contains non-finite values.")));
            }
        }
        Ok(Self {
            col_range,
            mag_range,
            planes,
        })
    }

    pub fn col_range(&self) -> &[f64] {
        &self.col_range
    }

    pub fn mag_range(&self) -> &[f64] {
        &self.mag_range
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }
}

/// A loaded model of either diagram kind.
#[derive(Debug, Clone)]
pub enum ModelGrid {
    Hrd(HrDiagram),
    Cmd(ColourMagnitudeDiagram),
}

impl ModelGrid {
    pub fn kind(&self) -> DiagramKind {
        match self {
            ModelGrid::Hrd(_) => DiagramKind::Hrd,
            ModelGrid::Cmd(_) => DiagramKind::Cmd,
        }
    }

    /// Axis coordinates in the order of `DiagramKind::required_columns`:
    /// `(logT, logL)` for HRD, `(colour, magnitude)` for CMD.
    pub fn axes(&self) -> (&[f64], &[f64]) {
        match self {
            ModelGrid::Hrd(hrd) => (hrd.t_axis(), hrd.l_axis()),
            ModelGrid::Cmd(cmd) => (cmd.col_range(), cmd.mag_range()),
        }
    }

    /// Combined plane at an age bin, indexed `[x, y]`.
    ///
    /// # Panics
    /// Panics if `bin >= N_BINS`.
    pub fn plane(&self, bin: usize) -> &Plane {
        match self {
            ModelGrid::Hrd(hrd) => hrd.grid().total(bin),
            ModelGrid::Cmd(cmd) => &cmd.planes[bin],
        }
    }

    /// Plane shape `(x cells, y cells)`.
    pub fn shape(&self) -> (usize, usize) {
        self.plane(0).shape()
    }

    /// Values of cell `(x, y)` across every age bin, or `None` if the cell is
    /// outside the planes.
    pub fn cell_profile(&self, x: usize, y: usize) -> Option<Vec<f64>> {
        let (rows, cols) = self.shape();
        if x >= rows || y >= cols {
            return None;
        }
        Some((0..N_BINS).map(|bin| self.plane(bin)[(x, y)]).collect())
    }

    pub fn time_bins(&self) -> Vec<f64> {
        time_bins()
    }

    pub fn as_hrd_mut(&mut self) -> Option<&mut HrDiagram> {
        match self {
            ModelGrid::Hrd(hrd) => Some(hrd),
            ModelGrid::Cmd(_) => None,
        }
    }
}

impl From<HrDiagram> for ModelGrid {
    fn from(value: HrDiagram) -> Self {
        ModelGrid::Hrd(value)
    }
}

impl From<ColourMagnitudeDiagram> for ModelGrid {
    fn from(value: ColourMagnitudeDiagram) -> Self {
        ModelGrid::Cmd(value)
    }
}

fn validate_axis(label: &str, axis: &[f64]) -> Result<(), AppError> {
    if axis.is_empty() {
        return Err(AppError::format(format!("The {label} axis is empty.")));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(AppError::format(format!("The {label} axis contains non-finite values.")));
    }
    if axis.windows(2).any(|w| w[1] < w[0]) {
        return Err(AppError::format(format!("The {label} axis must be ascending.")));
    }
    Ok(())
}
