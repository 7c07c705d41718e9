//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the model path from flags or the environment
//! - runs the age pipeline
//! - prints reports and writes optional exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{CombineArgs, Command, DemoArgs, RangeArgs, RunArgs, StackArgs};
use crate::data::{generate_population, SyntheticConfig};
use crate::domain::AgeConfig;
use crate::error::AppError;
use crate::io::{load_model, write_hrd_text, write_observations, ModelSource};
use crate::report::{format_combined, format_diagnostics, format_source_summary, format_stack};

pub mod pipeline;

/// Environment variable holding the default model path.
pub const MODEL_ENV: &str = "AGES_MODEL";

/// Entry point for the `ages` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Pdfs(args) => handle_pdfs(args),
        Command::Combine(args) => handle_combine(args),
        Command::Range(args) => handle_range(args),
        Command::Stack(args) => handle_stack(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_pdfs(args: RunArgs) -> Result<(), AppError> {
    let config = age_config_from_args(&args, None, None)?;
    let wizard = pipeline::run_ages(&config)?;

    print!("{}", format_source_summary(&wizard, None));
    print!("{}", format_diagnostics(&wizard.diagnostics()));
    Ok(())
}

fn handle_combine(args: CombineArgs) -> Result<(), AppError> {
    let config = age_config_from_args(&args.run, Some(&args), None)?;
    let wizard = pipeline::run_ages(&config)?;

    print!("{}", format_source_summary(&wizard, None));
    if let Some(combined) = wizard.combined() {
        print!("{}", format_combined(combined, None));
    }
    print!("{}", format_diagnostics(&wizard.diagnostics()));
    Ok(())
}

fn handle_range(args: RangeArgs) -> Result<(), AppError> {
    let range = (args.min, args.max);
    let config = age_config_from_args(&args.combine.run, Some(&args.combine), Some(range))?;
    let wizard = pipeline::run_ages(&config)?;

    print!("{}", format_source_summary(&wizard, Some(range)));
    if let Some(combined) = wizard.combined() {
        print!("{}", format_combined(combined, Some(range)));
    }
    print!("{}", format_diagnostics(&wizard.diagnostics()));
    Ok(())
}

fn handle_stack(args: StackArgs) -> Result<(), AppError> {
    let path = resolve_model_path(args.model)?;
    let mut model = load_model(ModelSource::Path(path.clone()))?;
    let hrd = model.as_hrd_mut().ok_or_else(|| {
        AppError::validation(format!(
            "Stacking needs an HR diagram model; '{}' is a colour-magnitude diagram.",
            path.display()
        ))
    })?;
    let stacked = hrd.grid_mut().stack_with_unit(args.min, args.max, args.unit)?;

    print!("{}", format_stack(stacked));
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let population = generate_population(&SyntheticConfig {
        seed: args.seed,
        cells: args.cells,
        n_sources: args.sources,
        log_age: args.log_age,
    })?;

    if let Some(path) = &args.write_obs {
        write_observations(path, &population.observations)?;
    }
    if let Some(path) = &args.write_model {
        write_hrd_text(path, &population.model)?;
    }

    let config = AgeConfig {
        observations: args.write_obs.clone().unwrap_or_else(|| PathBuf::from("synthetic")),
        model: args.write_model.clone().unwrap_or_else(|| PathBuf::from("synthetic")),
        diagram: None,
        combine: true,
        exclude: Vec::new(),
        smart: true,
        age_range: Some((args.log_age - 0.2, args.log_age + 0.2)),
        export_pdfs: args.export_pdfs,
        export_report: args.export_report,
    };
    let range = config.age_range;
    let wizard = pipeline::run_ages_with(population.observations, population.model, &config)?;

    println!("Synthetic population: seed={} | drawn at log(age/yr)={:.1}\n", args.seed, args.log_age);
    print!("{}", format_source_summary(&wizard, range));
    if let Some(combined) = wizard.combined() {
        print!("{}", format_combined(combined, range));
    }
    print!("{}", format_diagnostics(&wizard.diagnostics()));
    Ok(())
}

/// Build the run configuration from CLI arguments plus the environment.
pub fn age_config_from_args(
    args: &RunArgs,
    combine: Option<&CombineArgs>,
    age_range: Option<(f64, f64)>,
) -> Result<AgeConfig, AppError> {
    if age_range.is_some_and(|(a, b)| !(a.is_finite() && b.is_finite())) {
        return Err(AppError::validation("Age range bounds must be finite numbers."));
    }

    Ok(AgeConfig {
        observations: args.observations.clone(),
        model: resolve_model_path(args.model.clone())?,
        diagram: args.diagram,
        combine: combine.is_some(),
        exclude: combine.map(|c| c.exclude.clone()).unwrap_or_default(),
        smart: combine.is_none_or(|c| !c.no_smart),
        age_range,
        export_pdfs: args.export_pdfs.clone(),
        export_report: args.export_report.clone(),
    })
}

/// The model path from the flag, else from `AGES_MODEL` (`.env` is honoured).
fn resolve_model_path(flag: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(path) = flag {
        return Ok(path);
    }
    dotenvy::dotenv().ok();
    std::env::var(MODEL_ENV)
        .map(PathBuf::from)
        .map_err(|_| AppError::fatal(format!("No model given: pass --model or set {MODEL_ENV} (environment or .env).")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(model: Option<&str>) -> RunArgs {
        RunArgs {
            observations: PathBuf::from("stars.csv"),
            model: model.map(PathBuf::from),
            diagram: None,
            export_pdfs: None,
            export_report: None,
        }
    }

    #[test]
    fn config_from_combine_args() {
        let combine = CombineArgs {
            run: run_args(Some("hrs-z020.dat")),
            exclude: vec!["a".into()],
            no_smart: true,
        };
        let config = age_config_from_args(&combine.run, Some(&combine), Some((7.0, 8.0))).unwrap();
        assert_eq!(config.model, PathBuf::from("hrs-z020.dat"));
        assert!(config.combine);
        assert!(!config.smart);
        assert_eq!(config.exclude, ["a"]);
        assert_eq!(config.age_range, Some((7.0, 8.0)));
    }

    #[test]
    fn pdfs_config_does_not_combine() {
        let config = age_config_from_args(&run_args(Some("m.json")), None, None).unwrap();
        assert!(!config.combine);
        assert!(config.smart);
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn non_finite_range_is_rejected() {
        let err = age_config_from_args(&run_args(Some("m.json")), None, Some((f64::NAN, 8.0))).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
