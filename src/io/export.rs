//! Export age results.
//!
//! - PDF table CSV: one column per source, an optional `combined` column, and
//!   the age axis as the trailing `time_bins` column, one row per age bin
//! - JSON report (see `AgeReport`)

use std::fs::File;
use std::path::Path;

use crate::age::{CombinedPdf, PdfTable};
use crate::domain::AgeReport;
use crate::error::AppError;

/// Write the per-source PDFs (and optionally the combined PDF) to CSV.
pub fn write_pdfs_csv(path: &Path, table: &PdfTable, combined: Option<&CombinedPdf>) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create PDF CSV '{}': {e}", path.display())))?;

    let mut header: Vec<&str> = table.sources().iter().map(String::as_str).collect();
    if combined.is_some() {
        header.push("combined");
    }
    header.push("time_bins");
    writer
        .write_record(&header)
        .map_err(|e| AppError::io(format!("Failed to write PDF CSV header: {e}")))?;

    for (bin, t) in table.time_bins().iter().enumerate() {
        let mut row: Vec<String> = table.columns().iter().map(|c| format!("{:.10e}", c[bin])).collect();
        if let Some(c) = combined {
            row.push(format!("{:.10e}", c.values()[bin]));
        }
        row.push(format!("{t:.1}"));
        writer
            .write_record(&row)
            .map_err(|e| AppError::io(format!("Failed to write PDF CSV row {bin}: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write PDF CSV: {e}")))?;
    Ok(())
}

/// Write a JSON report.
pub fn write_report_json(path: &Path, report: &AgeReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::io(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}
