//! Observation table.
//!
//! Observations are kept as raw text cells, column by column. Numeric coercion
//! happens in the coordinate resolver, one source at a time.

use std::collections::HashMap;

use crate::domain::{Diagnostic, DiagnosticKind};
use crate::error::AppError;

/// Column holding source names.
pub const NAME_COLUMN: &str = "name";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<String>>,
    n_rows: usize,
}

impl ObservationTable {
    /// Build a table from a header row and data rows.
    ///
    /// Header names are matched case-insensitively. Short rows are padded with
    /// empty cells and extra cells are ignored. If a header repeats, the first
    /// occurrence wins.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| normalize_header_name(h)).collect();
        let mut index = HashMap::new();
        for (idx, name) in headers.iter().enumerate() {
            index.entry(name.clone()).or_insert(idx);
        }

        let n_rows = rows.len();
        let mut columns = vec![Vec::with_capacity(n_rows); headers.len()];
        for row in rows {
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default());
            }
        }

        Self {
            headers,
            index,
            columns,
            n_rows,
        }
    }

    /// HRD observations from `(logT, logL)` pairs.
    pub fn from_hrd_points(points: &[(f64, f64)], names: Option<&[&str]>) -> Self {
        Self::from_points(["logT", "logL"], points, names)
    }

    /// CMD observations from `(col, mag)` pairs.
    pub fn from_cmd_points(points: &[(f64, f64)], names: Option<&[&str]>) -> Self {
        Self::from_points(["col", "mag"], points, names)
    }

    fn from_points(axes: [&str; 2], points: &[(f64, f64)], names: Option<&[&str]>) -> Self {
        let mut headers: Vec<String> = axes.iter().map(|s| s.to_string()).collect();
        if names.is_some() {
            headers.push(NAME_COLUMN.to_string());
        }
        let rows = points
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let mut row = vec![a.to_string(), b.to_string()];
                if let Some(names) = names {
                    row.push(names.get(i).copied().unwrap_or_default().to_string());
                }
                row
            })
            .collect();
        Self::new(headers, rows)
    }

    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw cells of a column.
    pub fn column(&self, name: &str) -> Result<&[String], AppError> {
        let idx = self
            .index
            .get(&normalize_header_name(name))
            .ok_or_else(|| AppError::format(format!("Missing required observation column: `{name}`")))?;
        Ok(&self.columns[*idx])
    }

    /// Source names in row order.
    ///
    /// Without a `name` column, names are generated as `s0, s1, …` and a
    /// diagnostic is returned alongside them.
    pub fn source_names(&self) -> (Vec<String>, Option<Diagnostic>) {
        match self.index.get(NAME_COLUMN) {
            Some(&idx) => (self.columns[idx].clone(), None),
            None => {
                let names = (0..self.n_rows).map(|i| format!("s{i}")).collect();
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::MissingNames,
                    None,
                    "No `name` column in the observations; generated source names s0, s1, ...",
                );
                (names, Some(diagnostic))
            }
        }
    }
}

/// Trim, strip a UTF-8 BOM, and lower-case a header name.
pub fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM, which
    // would otherwise make a present column look missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}
