//! Model loading and routing.
//!
//! Callers hand the engine either an already built [`ModelGrid`] or a path.
//! Paths are routed on the file name:
//!
//! - names containing `hrs` are BPASS HR-diagram grids, read in this crate's
//!   plain-text layout (see [`write_hrd_text`]): 153 whitespace-separated rows
//!   of 100x100 cells, 51 high-H bins, then 51 medium-H, then 51 low-H, each
//!   row a row-major `[T, L]` plane
//! - anything else must be a CMD JSON file (`CmdFile`)
//!
//! A path that fits neither is a fatal configuration error.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Abundance;
use crate::error::AppError;
use crate::grid::{AgeGrid, ColourMagnitudeDiagram, HrDiagram, ModelGrid, Plane, BPASS_HRD_CELLS, N_BINS};

/// Where the model comes from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    Grid(ModelGrid),
    Path(PathBuf),
}

impl From<ModelGrid> for ModelSource {
    fn from(value: ModelGrid) -> Self {
        ModelSource::Grid(value)
    }
}

impl From<HrDiagram> for ModelSource {
    fn from(value: HrDiagram) -> Self {
        ModelSource::Grid(value.into())
    }
}

impl From<ColourMagnitudeDiagram> for ModelSource {
    fn from(value: ColourMagnitudeDiagram) -> Self {
        ModelSource::Grid(value.into())
    }
}

impl From<PathBuf> for ModelSource {
    fn from(value: PathBuf) -> Self {
        ModelSource::Path(value)
    }
}

impl From<&Path> for ModelSource {
    fn from(value: &Path) -> Self {
        ModelSource::Path(value.to_path_buf())
    }
}

/// Serialized CMD model (JSON).
///
/// `grids[bin][mag][col]`, one plane per age bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdFile {
    pub col_range: Vec<f64>,
    pub mag_range: Vec<f64>,
    pub grids: Vec<Vec<Vec<f64>>>,
}

/// Resolve a model source into a model grid.
pub fn load_model(source: ModelSource) -> Result<ModelGrid, AppError> {
    match source {
        ModelSource::Grid(model) => Ok(model),
        ModelSource::Path(path) => load_model_path(&path),
    }
}

fn load_model_path(path: &Path) -> Result<ModelGrid, AppError> {
    let is_hrs = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains("hrs"));

    if is_hrs {
        log::info!("loading BPASS HR diagram from {}", path.display());
        return Ok(read_bpass_hrd(path)?.into());
    }

    log::info!("loading CMD model from {}", path.display());
    read_cmd_json(path).map(ModelGrid::from).map_err(|e| {
        AppError::fatal(format!(
            "Could not load model '{}': {e}\nThe model should be a path to a BPASS HR diagram output (name containing `hrs`) or a CMD JSON file.",
            path.display()
        ))
    })
}

/// Read a BPASS HR-diagram output file on the standard 100x100 axes.
pub fn read_bpass_hrd(path: &Path) -> Result<HrDiagram, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read HR diagram '{}': {e}", path.display())))?;
    HrDiagram::bpass(parse_hrd_grid(&text, BPASS_HRD_CELLS, BPASS_HRD_CELLS)?)
}

/// Parse HR-diagram text onto the given axes.
pub fn parse_hrd_text(text: &str, t_axis: Vec<f64>, l_axis: Vec<f64>) -> Result<HrDiagram, AppError> {
    let grid = parse_hrd_grid(text, t_axis.len(), l_axis.len())?;
    HrDiagram::new(t_axis, l_axis, grid)
}

/// Expects `3 * N_BINS` non-empty rows of `n_t * n_l` values.
fn parse_hrd_grid(text: &str, n_t: usize, n_l: usize) -> Result<AgeGrid, AppError> {
    let mut planes: Vec<Plane> = Vec::with_capacity(3 * N_BINS);

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| AppError::format(format!("HR diagram line {}: {e}", idx + 1)))?;
        if values.len() != n_t * n_l {
            return Err(AppError::format(format!(
                "HR diagram line {} has {} values; expected {} ({n_t}x{n_l}).",
                idx + 1,
                values.len(),
                n_t * n_l
            )));
        }
        planes.push(Plane::from_row_slice(n_t, n_l, &values));
    }

    if planes.len() != 3 * N_BINS {
        return Err(AppError::format(format!(
            "HR diagram has {} rows; expected {} (51 age bins x 3 abundance classes).",
            planes.len(),
            3 * N_BINS
        )));
    }

    let low = planes.split_off(2 * N_BINS);
    let medium = planes.split_off(N_BINS);
    AgeGrid::new(planes, medium, low)
}

/// Write an HRD's unweighted planes in the BPASS text layout.
pub fn write_hrd_text(path: &Path, hrd: &HrDiagram) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create HR diagram '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    for class in Abundance::ALL {
        for bin in 0..N_BINS {
            let plane = hrd.grid().raw(class, bin);
            let (rows, cols) = plane.shape();
            let mut line = String::with_capacity(rows * cols * 8);
            for i in 0..rows {
                for j in 0..cols {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(&plane[(i, j)].to_string());
                }
            }
            writeln!(out, "{line}")
                .map_err(|e| AppError::io(format!("Failed to write HR diagram row: {e}")))?;
        }
    }
    out.flush()
        .map_err(|e| AppError::io(format!("Failed to write HR diagram: {e}")))?;
    Ok(())
}

/// Read a CMD JSON file.
pub fn read_cmd_json(path: &Path) -> Result<ColourMagnitudeDiagram, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CMD JSON '{}': {e}", path.display())))?;
    let cmd: CmdFile =
        serde_json::from_reader(file).map_err(|e| AppError::format(format!("Invalid CMD JSON: {e}")))?;
    cmd_from_file(cmd)
}

/// Write a CMD JSON file.
pub fn write_cmd_json(path: &Path, cmd: &ColourMagnitudeDiagram) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create CMD JSON '{}': {e}", path.display())))?;
    let grids: Vec<Vec<Vec<f64>>> = cmd
        .planes()
        .iter()
        .map(|p| (0..p.nrows()).map(|i| p.row(i).iter().copied().collect()).collect())
        .collect();
    let out = CmdFile {
        col_range: cmd.col_range().to_vec(),
        mag_range: cmd.mag_range().to_vec(),
        grids,
    };
    serde_json::to_writer(file, &out).map_err(|e| AppError::io(format!("Failed to write CMD JSON: {e}")))?;
    Ok(())
}

fn cmd_from_file(cmd: CmdFile) -> Result<ColourMagnitudeDiagram, AppError> {
    let (n_mag, n_col) = (cmd.mag_range.len(), cmd.col_range.len());
    let mut planes = Vec::with_capacity(cmd.grids.len());
    for (bin, rows) in cmd.grids.iter().enumerate() {
        if rows.len() != n_mag || rows.iter().any(|r| r.len() != n_col) {
            return Err(AppError::format(format!(
                "CMD bin {bin} is not a {n_mag}x{n_col} (mag x col) plane."
            )));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        planes.push(Plane::from_row_slice(n_mag, n_col, &flat));
    }
    ColourMagnitudeDiagram::new(cmd.col_range, cmd.mag_range, planes)
}
