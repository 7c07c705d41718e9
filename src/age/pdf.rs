//! Per-source age probability distributions.
//!
//! For a resolved source the PDF is the model's combined weight at the
//! source's cell, read across all 51 age bins and normalised to unit sum. A
//! source with an unresolved axis gets an all-zero distribution: it has no
//! counterpart in the model, so its probability mass is missing rather than
//! spread uniformly.

use rayon::prelude::*;

use crate::age::coords::ResolvedCoordinates;
use crate::domain::{Diagnostic, DiagnosticKind, ObservationTable};
use crate::error::AppError;
use crate::grid::{ModelGrid, N_BINS};
use crate::math::{argmax, normalise, round2};

/// Age PDFs for a batch of sources, plus the shared age axis.
///
/// The age axis is kept apart from the source columns so per-source iteration
/// never picks it up; exports write it as a trailing `time_bins` column.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfTable {
    sources: Vec<String>,
    columns: Vec<Vec<f64>>,
    time_bins: Vec<f64>,
}

impl PdfTable {
    /// Build a table from named columns. Every column must match the age axis length.
    pub fn new(sources: Vec<String>, columns: Vec<Vec<f64>>, time_bins: Vec<f64>) -> Result<Self, AppError> {
        if sources.len() != columns.len() {
            return Err(AppError::format(format!(
                "{} source names for {} PDF columns.",
                sources.len(),
                columns.len()
            )));
        }
        if let Some((name, col)) = sources.iter().zip(&columns).find(|(_, c)| c.len() != time_bins.len()) {
            return Err(AppError::format(format!(
                "PDF for `{name}` has {} bins; expected {}.",
                col.len(),
                time_bins.len()
            )));
        }
        Ok(Self {
            sources,
            columns,
            time_bins,
        })
    }

    /// Number of source columns.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn time_bins(&self) -> &[f64] {
        &self.time_bins
    }

    /// First column with the given source name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.sources
            .iter()
            .position(|s| s == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// `(name, pdf)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.sources
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Age at the peak of each source's PDF; `None` for sources with no mass.
    pub fn most_likely_ages(&self) -> Vec<Option<f64>> {
        self.columns
            .iter()
            .map(|col| most_likely_age(col, &self.time_bins))
            .collect()
    }

    /// Probability mass of each source inside an inclusive log-age range.
    pub fn probability_in_age_range(&self, a: f64, b: f64) -> Vec<f64> {
        self.columns
            .iter()
            .map(|col| probability_in_range(col, &self.time_bins, a, b))
            .collect()
    }
}

/// Age label at the PDF maximum (lowest bin on ties); `None` if the PDF has no mass.
pub fn most_likely_age(pdf: &[f64], time_bins: &[f64]) -> Option<f64> {
    if pdf.iter().all(|&p| p == 0.0) {
        return None;
    }
    argmax(pdf).and_then(|idx| time_bins.get(idx).copied())
}

/// Sum of PDF mass over bins whose label, rounded to 2 decimals, lies in
/// `[min(a, b), max(a, b)]`.
pub fn probability_in_range(pdf: &[f64], time_bins: &[f64], a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    pdf.iter()
        .zip(time_bins)
        .filter(|&(_, &t)| {
            let t = round2(t);
            t >= lo && t <= hi
        })
        .map(|(p, _)| p)
        .sum()
}

/// Build the PDF table for a batch of resolved observations.
///
/// Returns the table and the diagnostics raised while building it (generated
/// names, unresolved sources).
pub fn build_pdfs(
    obs: &ObservationTable,
    coords: &ResolvedCoordinates,
    model: &ModelGrid,
) -> Result<(PdfTable, Vec<Diagnostic>), AppError> {
    if coords.len() != obs.len() {
        return Err(AppError::format(format!(
            "{} resolved coordinates for {} observations.",
            coords.len(),
            obs.len()
        )));
    }
    if coords.kind() != model.kind() {
        return Err(AppError::format(format!(
            "Coordinates were resolved on a {} but the model is a {}.",
            coords.kind().display_name(),
            model.kind().display_name()
        )));
    }

    let (names, names_diagnostic) = obs.source_names();
    let mut diagnostics: Vec<Diagnostic> = names_diagnostic.into_iter().collect();

    let built: Vec<(Vec<f64>, Option<Diagnostic>)> = coords
        .cells()
        .into_par_iter()
        .zip(names.par_iter())
        .map(|(cell, name)| source_pdf(cell, name, model))
        .collect();

    let mut columns = Vec::with_capacity(built.len());
    for (pdf, diagnostic) in built {
        columns.push(pdf);
        diagnostics.extend(diagnostic);
    }

    log::info!("built {} age PDFs", columns.len());

    let table = PdfTable::new(names, columns, model.time_bins())?;
    Ok((table, diagnostics))
}

fn source_pdf(cell: Option<(usize, usize)>, name: &str, model: &ModelGrid) -> (Vec<f64>, Option<Diagnostic>) {
    let profile = cell.and_then(|(x, y)| model.cell_profile(x, y));
    match profile {
        Some(profile) => (normalise(&profile), None),
        None => {
            let diagnostic = Diagnostic::new(
                DiagnosticKind::UnresolvedSource,
                Some(name),
                format!("Unresolved coordinates for source {name}; its age PDF is zero everywhere."),
            );
            (vec![0.0; N_BINS], Some(diagnostic))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::coords::resolve_coordinates;
    use crate::grid::{time_bins, AgeGrid, HrDiagram, Plane};

    /// 2x2 HRD on logT = [4.0, 4.5], logL = [4.0, 5.0]. Only the high-H class
    /// is populated; its per-dex value at cell (1, 1) and bin `b` is `f(b)`.
    /// The raw values are divided by each bin's width so the time weighting
    /// cancels and the weighted cell equals `f(b)`.
    fn fixture(f: impl Fn(usize) -> f64) -> ModelGrid {
        let dt = crate::grid::time_intervals();
        let high: Vec<Plane> = (0..N_BINS)
            .map(|b| {
                let mut p = Plane::from_element(2, 2, 1.0 / dt[b]);
                p[(1, 1)] = f(b) / dt[b];
                p
            })
            .collect();
        let zero: Vec<Plane> = (0..N_BINS).map(|_| Plane::zeros(2, 2)).collect();
        let grid = AgeGrid::new(high, zero.clone(), zero).unwrap();
        HrDiagram::new(vec![4.0, 4.5], vec![4.0, 5.0], grid).unwrap().into()
    }

    fn pdfs_for(obs: &ObservationTable, model: &ModelGrid) -> (PdfTable, Vec<Diagnostic>) {
        let coords = resolve_coordinates(obs, model).unwrap();
        build_pdfs(obs, &coords, model).unwrap()
    }

    #[test]
    fn single_source_pdf_is_normalised_cell_profile() {
        // Mass only in bins 10, 11, 12 with weights 1:2:1.
        let model = fixture(|b| match b {
            10 => 1.0,
            11 => 2.0,
            12 => 1.0,
            _ => 0.0,
        });
        let obs = ObservationTable::from_hrd_points(&[(4.5, 5.0)], Some(&["star"]));
        let (table, diagnostics) = pdfs_for(&obs, &model);
        assert!(diagnostics.is_empty());

        let pdf = table.column("star").unwrap();
        for (b, &p) in pdf.iter().enumerate() {
            let expected = match b {
                10 => 0.25,
                11 => 0.5,
                12 => 0.25,
                _ => 0.0,
            };
            assert!((p - expected).abs() < 1e-12, "bin {b}: {p} != {expected}");
        }
    }

    #[test]
    fn valid_pdfs_sum_to_one_and_unresolved_are_zero() {
        let model = fixture(|b| 1.0 + b as f64);
        let obs = ObservationTable::new(
            vec!["name".into(), "logT".into(), "logL".into()],
            vec![
                vec!["a".into(), "4.5".into(), "5.0".into()],
                vec!["b".into(), "4.0".into(), "4.0".into()],
                vec!["c".into(), "n/a".into(), "4.0".into()],
            ],
        );
        let (table, diagnostics) = pdfs_for(&obs, &model);
        assert_eq!(table.sources(), ["a", "b", "c"]);
        for name in ["a", "b"] {
            let total: f64 = table.column(name).unwrap().iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert!(table.column("c").unwrap().iter().all(|&p| p == 0.0));
        assert!(
            diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnresolvedSource && d.source.as_deref() == Some("c"))
        );
    }

    #[test]
    fn zero_cell_profile_normalises_to_zero() {
        let model = fixture(|_| 0.0);
        let obs = ObservationTable::from_hrd_points(&[(4.5, 5.0)], Some(&["dark"]));
        let (table, _) = pdfs_for(&obs, &model);
        let pdf = table.column("dark").unwrap();
        assert!(pdf.iter().all(|&p| p == 0.0));
        assert_eq!(table.most_likely_ages(), vec![None]);
    }

    #[test]
    fn argmax_of_pdf_matches_raw_peak() {
        let model = fixture(|b| if b == 33 { 9.0 } else { 1.0 + (b % 5) as f64 });
        let obs = ObservationTable::from_hrd_points(&[(4.5, 5.0)], None);
        let (table, diagnostics) = pdfs_for(&obs, &model);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingNames);
        assert_eq!(table.sources(), ["s0"]);
        let age = table.most_likely_ages()[0].unwrap();
        assert!((age - time_bins()[33]).abs() < 1e-12);
    }

    #[test]
    fn probability_in_range_is_inclusive_and_order_free() {
        let bins = time_bins();
        let pdf: Vec<f64> = (0..N_BINS).map(|_| 1.0 / N_BINS as f64).collect();
        let p = probability_in_range(&pdf, &bins, 7.0, 8.0);
        assert!((p - 11.0 / N_BINS as f64).abs() < 1e-12);
        assert_eq!(p, probability_in_range(&pdf, &bins, 8.0, 7.0));
    }

    #[test]
    fn table_rejects_mismatched_columns() {
        let bins = time_bins();
        assert!(PdfTable::new(vec!["a".into()], vec![vec![0.0; 3]], bins.clone()).is_err());
        assert!(PdfTable::new(vec![], vec![vec![0.0; N_BINS]], bins).is_err());
    }
}
