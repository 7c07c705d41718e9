//! Nearest-cell coordinate resolution.
//!
//! Each observation is matched to the model cell whose axis coordinates are
//! closest, one axis at a time:
//!
//! - the raw cell is read as a number; a cell that is not a finite number
//!   leaves that axis unresolved and records a diagnostic (the batch goes on)
//! - otherwise the index with the smallest `|axis[i] - value|` is taken,
//!   scanning upwards, so equidistant candidates resolve to the lower index
//!
//! The two axes are independent: a bad `logT` does not prevent `logL` from
//! being resolved. Sources are processed in parallel and keep row order.

use rayon::prelude::*;

use crate::domain::{Diagnostic, DiagnosticKind, DiagramKind, ObservationTable, NAME_COLUMN};
use crate::error::AppError;
use crate::grid::ModelGrid;
use crate::math::nearest_index;

/// Resolved axis indices for every observation.
///
/// `first`/`second` follow the resolver's natural order: `(T, L)` for HRD and
/// `(colour, magnitude)` for CMD. Use [`ResolvedCoordinates::cell`] for the
/// `(x, y)` order the model planes are indexed with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCoordinates {
    kind: DiagramKind,
    first: Vec<Option<usize>>,
    second: Vec<Option<usize>>,
    diagnostics: Vec<Diagnostic>,
}

impl ResolvedCoordinates {
    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// `logT` indices (HRD) or colour indices (CMD).
    pub fn first(&self) -> &[Option<usize>] {
        &self.first
    }

    /// `logL` indices (HRD) or magnitude indices (CMD).
    pub fn second(&self) -> &[Option<usize>] {
        &self.second
    }

    /// Plane indices `(x, y)` of source `i`: `(T, L)` for HRD, `(mag, col)` for CMD.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn cell(&self, i: usize) -> (Option<usize>, Option<usize>) {
        match self.kind {
            DiagramKind::Hrd => (self.first[i], self.second[i]),
            DiagramKind::Cmd => (self.second[i], self.first[i]),
        }
    }

    /// Fully resolved plane indices per source (`None` if either axis failed).
    pub fn cells(&self) -> Vec<Option<(usize, usize)>> {
        (0..self.len())
            .map(|i| match self.cell(i) {
                (Some(x), Some(y)) => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Resolve every observation to its nearest model cell.
///
/// Fails only on structural problems (a required column is missing). Bad
/// values in individual cells are recorded as diagnostics.
pub fn resolve_coordinates(obs: &ObservationTable, model: &ModelGrid) -> Result<ResolvedCoordinates, AppError> {
    let kind = model.kind();
    let [first_col, second_col] = kind.required_columns();
    let [first_label, second_label] = kind.axis_labels();

    let first_cells = obs.column(first_col)?;
    let second_cells = obs.column(second_col)?;
    let names = obs.column(NAME_COLUMN).ok();
    let (first_axis, second_axis) = model.axes();

    let resolved: Vec<(Option<usize>, Option<usize>, Vec<Diagnostic>)> = first_cells
        .par_iter()
        .zip(second_cells.par_iter())
        .enumerate()
        .map(|(i, (a, b))| {
            let source = names
                .and_then(|n| n.get(i))
                .cloned()
                .unwrap_or_else(|| format!("s{i}"));
            let mut diagnostics = Vec::new();
            let first = resolve_axis(a, first_axis, first_label, &source, &mut diagnostics);
            let second = resolve_axis(b, second_axis, second_label, &source, &mut diagnostics);
            (first, second, diagnostics)
        })
        .collect();

    let mut first = Vec::with_capacity(resolved.len());
    let mut second = Vec::with_capacity(resolved.len());
    let mut diagnostics = Vec::new();
    for (a, b, d) in resolved {
        first.push(a);
        second.push(b);
        diagnostics.extend(d);
    }

    log::debug!(
        "resolved {} {} observations ({} axis failures)",
        first.len(),
        kind.display_name(),
        diagnostics.len()
    );

    Ok(ResolvedCoordinates {
        kind,
        first,
        second,
        diagnostics,
    })
}

fn resolve_axis(
    cell: &str,
    axis: &[f64],
    label: &str,
    source: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<usize> {
    match coerce(cell) {
        Some(value) => nearest_index(axis, value),
        None => {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::CoordinateCoercion,
                Some(source),
                format!("{label}={cell:?} cannot be converted to a number (source {source})."),
            ));
            None
        }
    }
}

fn coerce(cell: &str) -> Option<f64> {
    let v = cell.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{AgeGrid, ColourMagnitudeDiagram, HrDiagram, Plane, N_BINS};

    fn planes(rows: usize, cols: usize) -> Vec<Plane> {
        (0..N_BINS).map(|_| Plane::from_element(rows, cols, 1.0)).collect()
    }

    fn hrd_model() -> ModelGrid {
        let grid = AgeGrid::new(planes(3, 4), planes(3, 4), planes(3, 4)).unwrap();
        HrDiagram::new(vec![3.5, 4.0, 4.5], vec![2.0, 3.0, 4.0, 5.0], grid)
            .unwrap()
            .into()
    }

    #[test]
    fn exact_coordinates_resolve_to_exact_indices() {
        let obs = ObservationTable::from_hrd_points(&[(4.5, 5.0), (3.5, 2.0), (4.0, 3.0)], None);
        let coords = resolve_coordinates(&obs, &hrd_model()).unwrap();
        assert_eq!(coords.first(), [Some(2), Some(0), Some(1)]);
        assert_eq!(coords.second(), [Some(3), Some(0), Some(1)]);
        assert!(coords.diagnostics().is_empty());
    }

    #[test]
    fn equidistant_values_take_lower_index() {
        let obs = ObservationTable::from_hrd_points(&[(3.75, 2.5)], None);
        let coords = resolve_coordinates(&obs, &hrd_model()).unwrap();
        assert_eq!(coords.cell(0), (Some(0), Some(0)));
    }

    #[test]
    fn bad_cell_only_fails_its_own_axis() {
        let obs = ObservationTable::new(
            vec!["name".into(), "logT".into(), "logL".into()],
            vec![
                vec!["a".into(), "hot".into(), "4.1".into()],
                vec!["b".into(), "4.4".into(), "".into()],
                vec!["c".into(), "4.0".into(), "3.0".into()],
            ],
        );
        let coords = resolve_coordinates(&obs, &hrd_model()).unwrap();
        assert_eq!(coords.first(), [None, Some(2), Some(1)]);
        assert_eq!(coords.second(), [Some(2), None, Some(1)]);
        assert_eq!(coords.cells(), vec![None, None, Some((1, 1))]);

        let diagnostics = coords.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].source.as_deref(), Some("a"));
        assert_eq!(diagnostics[0].kind, DiagnosticKind::CoordinateCoercion);
        assert_eq!(diagnostics[1].source.as_deref(), Some("b"));
    }

    #[test]
    fn missing_column_is_a_format_error() {
        let obs = ObservationTable::from_cmd_points(&[(0.1, 12.0)], None);
        let err = resolve_coordinates(&obs, &hrd_model()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }

    #[test]
    fn cmd_cells_are_mag_then_colour() {
        let cmd = ColourMagnitudeDiagram::new(vec![-0.5, 0.0, 0.5], vec![10.0, 11.0], planes(2, 3)).unwrap();
        let model = ModelGrid::from(cmd);
        let obs = ObservationTable::from_cmd_points(&[(0.5, 10.2)], None);
        let coords = resolve_coordinates(&obs, &model).unwrap();
        assert_eq!(coords.first(), [Some(2)]);
        assert_eq!(coords.second(), [Some(0)]);
        assert_eq!(coords.cell(0), (Some(0), Some(2)));
    }
}
