//! Command-line parsing for the stellar age estimator.
//!
//! Argument parsing stays here; the engine never sees clap types. `app` turns
//! these arguments into an `AgeConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AgeUnit, DiagramKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ages", version, about = "Stellar population age estimates from HRD/CMD model grids")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Per-source age PDFs and most likely ages.
    Pdfs(RunArgs),
    /// Combine the per-source PDFs into one population age.
    Combine(CombineArgs),
    /// Probability that each source, and the population, lies in an age range.
    Range(RangeArgs),
    /// Stack an HRD model between two ages and print per-class totals.
    Stack(StackArgs),
    /// Run the full pipeline on a seeded synthetic population.
    Demo(DemoArgs),
}

/// Inputs and exports shared by every analysis command.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Observation CSV (`name`, `logT`/`logL` or `col`/`mag`).
    #[arg(short = 'o', long = "obs", value_name = "CSV")]
    pub observations: PathBuf,

    /// Model file: BPASS HR diagram (name containing `hrs`) or CMD JSON.
    /// Defaults to `AGES_MODEL` from the environment or `.env`.
    #[arg(short = 'm', long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Expected diagram kind; the run fails if the model is of the other kind.
    #[arg(long, value_enum)]
    pub diagram: Option<DiagramKind>,

    /// Export the PDF table to CSV.
    #[arg(long = "export-pdfs", value_name = "CSV")]
    pub export_pdfs: Option<PathBuf>,

    /// Export a JSON report.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

/// Options for combining PDFs.
#[derive(Debug, Args, Clone)]
pub struct CombineArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Source names to leave out of the combination (comma separated).
    #[arg(short = 'x', long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Keep zero-probability (unresolved) sources in the product.
    #[arg(long)]
    pub no_smart: bool,
}

/// Options for range probabilities.
#[derive(Debug, Args, Clone)]
pub struct RangeArgs {
    #[command(flatten)]
    pub combine: CombineArgs,

    /// Lower log(age/yr) bound (inclusive).
    #[arg(long)]
    pub min: f64,

    /// Upper log(age/yr) bound (inclusive).
    #[arg(long)]
    pub max: f64,
}

/// Options for stacking a model grid.
#[derive(Debug, Args, Clone)]
pub struct StackArgs {
    /// BPASS HR diagram file. Defaults to `AGES_MODEL`.
    #[arg(short = 'm', long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Lower age bound (log age, or years above 999999).
    #[arg(long)]
    pub min: Option<f64>,

    /// Upper age bound (log age, or years above 999999).
    #[arg(long)]
    pub max: Option<f64>,

    /// How to read the bounds.
    #[arg(long, value_enum, default_value_t = AgeUnit::Auto)]
    pub unit: AgeUnit,
}

/// Options for the synthetic demo.
#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic sources.
    #[arg(short = 'n', long, default_value_t = 30)]
    pub sources: usize,

    /// log(age/yr) the sources are drawn around.
    #[arg(long, default_value_t = 8.0)]
    pub log_age: f64,

    /// Cells per model axis.
    #[arg(long, default_value_t = 40)]
    pub cells: usize,

    /// Write the synthetic observations to CSV.
    #[arg(long = "write-obs", value_name = "CSV")]
    pub write_obs: Option<PathBuf>,

    /// Write the synthetic model as HR diagram text.
    #[arg(long = "write-model", value_name = "PATH")]
    pub write_model: Option<PathBuf>,

    /// Export the PDF table to CSV.
    #[arg(long = "export-pdfs", value_name = "CSV")]
    pub export_pdfs: Option<PathBuf>,

    /// Export a JSON report.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_combine_with_exclusions() {
        let cli = Cli::parse_from([
            "ages", "combine", "--obs", "stars.csv", "-m", "hrs-model.dat", "-x", "a,b", "--no-smart",
        ]);
        let Command::Combine(args) = cli.command else {
            panic!("expected combine");
        };
        assert_eq!(args.run.observations, PathBuf::from("stars.csv"));
        assert_eq!(args.exclude, ["a", "b"]);
        assert!(args.no_smart);
    }

    #[test]
    fn parses_range_and_stack() {
        let cli = Cli::parse_from(["ages", "range", "-o", "s.csv", "--min", "7.0", "--max", "8.0"]);
        let Command::Range(args) = cli.command else {
            panic!("expected range");
        };
        assert_eq!((args.min, args.max), (7.0, 8.0));
        assert!(args.combine.run.model.is_none());

        let cli = Cli::parse_from(["ages", "stack", "--min", "1e7", "--unit", "years"]);
        let Command::Stack(args) = cli.command else {
            panic!("expected stack");
        };
        assert_eq!(args.min, Some(1e7));
        assert_eq!(args.unit, AgeUnit::Years);
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
