//! Shared domain types.
//!
//! Small, serializable types that are:
//!
//! - passed between the grid, resolver, PDF and combination stages
//! - exported to JSON/CSV
//! - surfaced to callers as inspectable diagnostics

use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which kind of diagram a model grid tabulates.
///
/// The kind decides which observation columns are required and how the
/// resolved indices map onto the grid planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    /// Hertzsprung-Russell diagram: `logT` / `logL`.
    Hrd,
    /// Colour-magnitude diagram: `col` / `mag`.
    Cmd,
}

impl DiagramKind {
    pub fn display_name(self) -> &'static str {
        match self {
            DiagramKind::Hrd => "HRD",
            DiagramKind::Cmd => "CMD",
        }
    }

    /// Observation columns read by the coordinate resolver, in resolution order.
    pub fn required_columns(self) -> [&'static str; 2] {
        match self {
            DiagramKind::Hrd => ["logt", "logl"],
            DiagramKind::Cmd => ["col", "mag"],
        }
    }

    /// Human-readable axis labels matching `required_columns`.
    pub fn axis_labels(self) -> [&'static str; 2] {
        match self {
            DiagramKind::Hrd => ["T", "L"],
            DiagramKind::Cmd => ["Colour", "Magnitude"],
        }
    }
}

/// Hydrogen-abundance class of a model component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Abundance {
    /// X > 0.4
    High,
    /// 1e-3 < X < 0.4
    Medium,
    /// X < 1e-3
    Low,
}

impl Abundance {
    pub const ALL: [Abundance; 3] = [Abundance::High, Abundance::Medium, Abundance::Low];

    pub fn display_name(self) -> &'static str {
        match self {
            Abundance::High => "high H",
            Abundance::Medium => "medium H",
            Abundance::Low => "low H",
        }
    }
}

/// Units of the bounds passed to a grid stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    /// Infer the unit from the values.
    ///
    /// Heuristic (deterministic):
    /// - bounds above `999_999` are read as years and converted with `log10`
    /// - bounds inside the log-age axis are read as log ages
    Auto,
    /// log10(age / yr).
    Log,
    /// Linear years.
    Years,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No `name` column; source names were generated.
    MissingNames,
    /// An observed coordinate could not be read as a finite number.
    CoordinateCoercion,
    /// A source has at least one unresolved axis; its PDF is all zeros.
    UnresolvedSource,
    /// An exclusion label was not found; the exclusion list was ignored.
    ExclusionIgnored,
}

/// A non-fatal problem recorded while processing a batch.
///
/// Diagnostics never abort a call. They are also logged at `warn` level when
/// they are created so CLI users see them without inspecting the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub source: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, source: Option<&str>, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            kind,
            source: source.map(str::to_string),
            message: message.into(),
        };
        log::warn!("{}", diagnostic.message);
        diagnostic
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags plus the environment (`AGES_MODEL`).
#[derive(Debug, Clone)]
pub struct AgeConfig {
    pub observations: PathBuf,
    pub model: PathBuf,
    /// Diagram kind the caller expects; checked against the loaded model.
    pub diagram: Option<DiagramKind>,

    /// Run the combination phase after building the per-source PDFs.
    pub combine: bool,
    pub exclude: Vec<String>,
    pub smart: bool,

    /// Inclusive log-age range for probability queries.
    pub age_range: Option<(f64, f64)>,

    pub export_pdfs: Option<PathBuf>,
    pub export_report: Option<PathBuf>,
}

/// Per-source summary in an exported report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub most_likely_age: Option<f64>,
    pub probability_in_range: Option<f64>,
}

/// Combined-population summary in an exported report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub sources_used: Vec<String>,
    pub pdf: Vec<f64>,
    /// `None` when the product collapsed to zero.
    pub most_likely_age: Option<f64>,
    pub probability_in_range: Option<f64>,
}

/// A saved age report (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeReport {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub diagram: DiagramKind,
    pub time_bins: Vec<f64>,
    pub age_range: Option<(f64, f64)>,
    pub sources: Vec<SourceSummary>,
    pub combined: Option<CombinedSummary>,
    pub diagnostics: Vec<Diagnostic>,
}
