//! Shared age pipeline used by every CLI command.
//!
//! observations -> model routing -> coordinates -> PDFs -> (combination) -> exports
//!
//! The command handlers only decide what to print.

use crate::age::AgeWizard;
use crate::domain::{AgeConfig, ObservationTable};
use crate::error::AppError;
use crate::io::{read_observations, write_pdfs_csv, write_report_json, ModelSource};

/// Read the configured observations and run the pipeline on the configured model.
pub fn run_ages(config: &AgeConfig) -> Result<AgeWizard, AppError> {
    let observations = read_observations(&config.observations)?;
    run_ages_with(observations, config.model.as_path(), config)
}

/// Run the pipeline on in-memory observations and any model source.
pub fn run_ages_with(
    observations: ObservationTable,
    model: impl Into<ModelSource>,
    config: &AgeConfig,
) -> Result<AgeWizard, AppError> {
    let mut wizard = AgeWizard::new(observations, model)?;

    let kind = wizard.model().kind();
    if let Some(expected) = config.diagram.filter(|&expected| expected != kind) {
        return Err(AppError::validation(format!(
            "Expected a {} model but '{}' is a {}.",
            expected.display_name(),
            config.model.display(),
            kind.display_name()
        )));
    }

    if config.combine {
        wizard.combine(&config.exclude, config.smart);
    }

    write_exports(&wizard, config)?;
    Ok(wizard)
}

/// Write the optional CSV/JSON exports of a finished run.
pub fn write_exports(wizard: &AgeWizard, config: &AgeConfig) -> Result<(), AppError> {
    if let Some(path) = &config.export_pdfs {
        write_pdfs_csv(path, wizard.pdfs(), wizard.combined())?;
        log::info!("wrote PDF table to {}", path.display());
    }
    if let Some(path) = &config.export_report {
        write_report_json(path, &wizard.report(config.age_range))?;
        log::info!("wrote report to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data::{generate_population, SyntheticConfig};
    use crate::domain::DiagramKind;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn config() -> AgeConfig {
        AgeConfig {
            observations: PathBuf::from("synthetic"),
            model: PathBuf::from("synthetic"),
            diagram: None,
            combine: true,
            exclude: vec![],
            smart: true,
            age_range: Some((7.5, 8.5)),
            export_pdfs: None,
            export_report: None,
        }
    }

    #[test]
    fn combines_when_configured() {
        let population = generate_population(&SyntheticConfig::default()).unwrap();
        let wizard = run_ages_with(population.observations.clone(), population.model.clone(), &config()).unwrap();
        assert!(wizard.combined().is_some());

        let config = AgeConfig {
            combine: false,
            ..config()
        };
        let wizard = run_ages_with(population.observations, population.model, &config).unwrap();
        assert!(wizard.combined().is_none());
    }

    #[test]
    fn diagram_mismatch_is_rejected() {
        let population = generate_population(&SyntheticConfig::default()).unwrap();
        let config = AgeConfig {
            diagram: Some(DiagramKind::Cmd),
            ..config()
        };
        let err = run_ages_with(population.observations, population.model, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn exports_are_written() {
        let dir = TempDir::new().unwrap();
        let pdfs = dir.path().join("pdfs.csv");
        let report = dir.path().join("report.json");
        let config = AgeConfig {
            export_pdfs: Some(pdfs.clone()),
            export_report: Some(report.clone()),
            ..config()
        };
        let population = generate_population(&SyntheticConfig::default()).unwrap();
        run_ages_with(population.observations, population.model, &config).unwrap();

        let csv = std::fs::read_to_string(&pdfs).unwrap();
        let json = std::fs::read_to_string(&report).unwrap();
        assert!(csv.lines().next().unwrap().ends_with(",combined,time_bins"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sources"].as_array().unwrap().len(), 30);
        assert!(value["combined"]["most_likely_age"].is_number());
    }
}
