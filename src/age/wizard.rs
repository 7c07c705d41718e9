//! Age wizard: the end-to-end engine for one batch of observations.
//!
//! Construction routes the model, resolves every observation to its nearest
//! cell and builds the per-source PDFs. Combining is a separate, explicit
//! phase: `combine` stores the joint PDF and the combined queries read it.
//! Replacing the observations recomputes the per-source state and drops the
//! stored combination.

use chrono::Local;

use crate::age::coords::{resolve_coordinates, ResolvedCoordinates};
use crate::age::combine::{combine_pdfs, CombinedPdf};
use crate::age::pdf::{build_pdfs, PdfTable};
use crate::domain::{AgeReport, CombinedSummary, Diagnostic, ObservationTable, SourceSummary};
use crate::error::AppError;
use crate::grid::ModelGrid;
use crate::io::model::{load_model, ModelSource};

#[derive(Debug, Clone)]
pub struct AgeWizard {
    model: ModelGrid,
    observations: ObservationTable,
    coordinates: ResolvedCoordinates,
    pdfs: PdfTable,
    /// Diagnostics from coordinate resolution and PDF construction.
    diagnostics: Vec<Diagnostic>,
    combined: Option<CombinedPdf>,
}

impl AgeWizard {
    pub fn new(observations: ObservationTable, model: impl Into<ModelSource>) -> Result<Self, AppError> {
        let model = load_model(model.into())?;
        let (coordinates, pdfs, diagnostics) = analyse(&observations, &model)?;
        Ok(Self {
            model,
            observations,
            coordinates,
            pdfs,
            diagnostics,
            combined: None,
        })
    }

    /// Replace the observations. Coordinates and PDFs are rebuilt and any
    /// stored combination is discarded.
    ///
    /// On error the wizard is left unchanged.
    pub fn set_observations(&mut self, observations: ObservationTable) -> Result<(), AppError> {
        let (coordinates, pdfs, diagnostics) = analyse(&observations, &self.model)?;
        self.observations = observations;
        self.coordinates = coordinates;
        self.pdfs = pdfs;
        self.diagnostics = diagnostics;
        self.combined = None;
        Ok(())
    }

    /// Combine the per-source PDFs and store the result.
    pub fn combine(&mut self, exclude: &[String], smart: bool) -> &CombinedPdf {
        &*self.combined.insert(combine_pdfs(&self.pdfs, exclude, smart))
    }

    pub fn combined(&self) -> Option<&CombinedPdf> {
        self.combined.as_ref()
    }

    /// Most likely age of the population.
    ///
    /// Fails with a state error before `combine`, and with a validation error
    /// if the stored combination has no probability mass.
    pub fn most_likely_age(&self) -> Result<f64, AppError> {
        self.require_combined()?.most_likely_age().ok_or_else(|| {
            AppError::validation(
                "The combined PDF is zero everywhere; combine with smart mode or exclude the unresolved sources.",
            )
        })
    }

    /// Most likely age of each source (`None` for sources with no mass).
    pub fn most_likely_ages(&self) -> Vec<Option<f64>> {
        self.pdfs.most_likely_ages()
    }

    /// Probability of each source lying in the inclusive log-age range.
    pub fn probability_in_age_range(&self, a: f64, b: f64) -> Vec<f64> {
        self.pdfs.probability_in_age_range(a, b)
    }

    /// Probability of the population lying in the inclusive log-age range.
    pub fn combined_probability_in_age_range(&self, a: f64, b: f64) -> Result<f64, AppError> {
        Ok(self.require_combined()?.probability_in_age_range(a, b))
    }

    /// All diagnostics of the current state, per-source ones first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let combined = self.combined.iter().flat_map(|c| c.diagnostics());
        self.diagnostics.iter().chain(combined).cloned().collect()
    }

    pub fn sources(&self) -> &[String] {
        self.pdfs.sources()
    }

    pub fn pdfs(&self) -> &PdfTable {
        &self.pdfs
    }

    pub fn coordinates(&self) -> &ResolvedCoordinates {
        &self.coordinates
    }

    pub fn observations(&self) -> &ObservationTable {
        &self.observations
    }

    pub fn model(&self) -> &ModelGrid {
        &self.model
    }

    /// Snapshot of the current results for export.
    pub fn report(&self, age_range: Option<(f64, f64)>) -> AgeReport {
        let in_range = age_range.map(|(a, b)| self.probability_in_age_range(a, b));
        let sources = self
            .sources()
            .iter()
            .zip(self.most_likely_ages())
            .enumerate()
            .map(|(i, (name, age))| SourceSummary {
                name: name.clone(),
                most_likely_age: age,
                probability_in_range: in_range.as_ref().map(|p| p[i]),
            })
            .collect();

        let combined = self.combined.as_ref().map(|c| CombinedSummary {
            sources_used: c.sources_used().to_vec(),
            pdf: c.values().to_vec(),
            most_likely_age: c.most_likely_age(),
            probability_in_range: age_range.map(|(a, b)| c.probability_in_age_range(a, b)),
        });

        AgeReport {
            tool: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            generated_at: Local::now(),
            diagram: self.model.kind(),
            time_bins: self.pdfs.time_bins().to_vec(),
            age_range,
            sources,
            combined,
            diagnostics: self.diagnostics(),
        }
    }

    fn require_combined(&self) -> Result<&CombinedPdf, AppError> {
        self.combined
            .as_ref()
            .ok_or_else(|| AppError::state("No combined PDF yet; call `combine` first."))
    }
}

fn analyse(
    observations: &ObservationTable,
    model: &ModelGrid,
) -> Result<(ResolvedCoordinates, PdfTable, Vec<Diagnostic>), AppError> {
    let coordinates = resolve_coordinates(observations, model)?;
    let (pdfs, pdf_diagnostics) = build_pdfs(observations, &coordinates, model)?;
    let mut diagnostics = coordinates.diagnostics().to_vec();
    diagnostics.extend(pdf_diagnostics);
    Ok((coordinates, pdfs, diagnostics))
}
