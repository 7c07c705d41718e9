//! Observation CSV ingest.
//!
//! The header row names the columns (`name`, `logT`/`logL` or `col`/`mag`,
//! matched case-insensitively). Cells are kept as text; numeric coercion
//! happens per source during coordinate resolution, so a malformed value
//! costs one source rather than the whole file.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::ObservationTable;
use crate::error::AppError;

/// Load an observation table from a CSV file.
pub fn read_observations(path: &Path) -> Result<ObservationTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open observations CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::format(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        let record: StringRecord =
            result.map_err(|e| AppError::format(format!("CSV parse error on line {line}: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let table = ObservationTable::new(headers, rows);
    log::info!("read {} observations from {}", table.len(), path.display());
    Ok(table)
}

/// Write an observation table as CSV (headers as stored, lower-case).
pub fn write_observations(path: &Path, table: &ObservationTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create observations CSV '{}': {e}", path.display())))?;

    writer
        .write_record(table.headers())
        .map_err(|e| AppError::io(format!("Failed to write CSV header: {e}")))?;

    let columns = table
        .headers()
        .iter()
        .map(|h| table.column(h))
        .collect::<Result<Vec<_>, _>>()?;
    for row in 0..table.len() {
        writer
            .write_record(columns.iter().map(|c| c[row].as_str()))
            .map_err(|e| AppError::io(format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write observations CSV: {e}")))?;
    Ok(())
}
