//! Joint age PDF of a population.
//!
//! Independent observations of coeval stars constrain one shared age, so the
//! joint distribution is the element-wise product of the per-source PDFs,
//! renormalised.
//!
//! Selection rules:
//! 1. Drop the excluded sources. If any requested label is unknown the whole
//!    exclusion list is ignored (with a diagnostic) and every source is used.
//! 2. In smart mode, skip sources whose PDF sums to zero (rounded to 2
//!    decimals). They are the unresolved sources and would zero the product.
//! 3. Multiply the survivors starting from a profile of ones, then normalise.
//!    With no survivors the product stays all ones and normalises to uniform.

use crate::age::pdf::{most_likely_age, probability_in_range, PdfTable};
use crate::domain::{Diagnostic, DiagnosticKind};
use crate::math::{normalise, round2};

/// Combined PDF over the shared age axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedPdf {
    values: Vec<f64>,
    time_bins: Vec<f64>,
    sources_used: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl CombinedPdf {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn time_bins(&self) -> &[f64] {
        &self.time_bins
    }

    /// Sources that entered the product, in table order.
    pub fn sources_used(&self) -> &[String] {
        &self.sources_used
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Age label at the peak (lowest bin on ties), `None` if the product collapsed to zero.
    pub fn most_likely_age(&self) -> Option<f64> {
        most_likely_age(&self.values, &self.time_bins)
    }

    /// Probability mass inside an inclusive log-age range.
    pub fn probability_in_age_range(&self, a: f64, b: f64) -> f64 {
        probability_in_range(&self.values, &self.time_bins, a, b)
    }
}

/// Multiply the selected PDFs of `table` into one normalised distribution.
pub fn combine_pdfs(table: &PdfTable, exclude: &[String], smart: bool) -> CombinedPdf {
    let mut diagnostics = Vec::new();

    let unknown: Vec<&str> = exclude
        .iter()
        .filter(|label| !table.sources().contains(*label))
        .map(String::as_str)
        .collect();
    let exclude: &[String] = if unknown.is_empty() {
        exclude
    } else {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::ExclusionIgnored,
            None,
            format!(
                "Exclusion disabled: no source named {}; all PDFs will be combined. Check the spelling of the excluded labels.",
                unknown.join(", ")
            ),
        ));
        &[]
    };

    let mut product = vec![1.0; table.time_bins().len()];
    let mut sources_used = Vec::new();
    for (name, pdf) in table.iter() {
        if exclude.iter().any(|e| e == name) {
            continue;
        }
        if smart && round2(pdf.iter().sum()) == 0.0 {
            log::debug!("smart combine: skipping zero-mass source {name}");
            continue;
        }
        for (acc, &p) in product.iter_mut().zip(pdf) {
            *acc *= p;
        }
        sources_used.push(name.to_string());
    }

    log::info!("combined {} of {} age PDFs", sources_used.len(), table.len());

    CombinedPdf {
        values: normalise(&product),
        time_bins: table.time_bins().to_vec(),
        sources_used,
        diagnostics,
    }
}
