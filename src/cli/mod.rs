//! Command-line parsing for the `archeo` binary.
//!
//! Argument parsing and command dispatch stay separate from the sampling and
//! matching code; see [`crate::app`] for dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::SampleColumn;
use crate::domain::{Component, Preset};
use crate::error::AppError;
use crate::infer::{DEFAULT_BINS, MatchMode};
use crate::io::TableFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "archeo",
    version,
    about = "Infer black-hole progenitors from remnant mass and spin"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a prior from a built-in preset.
    GeneratePresetPrior(PresetArgs),
    /// Generate a prior from a JSON configuration file.
    GeneratePrior(ConfigArgs),
    /// Print (and optionally save) a summary of a prior file.
    VisualizePrior(VisualizeArgs),
    /// Match observed remnant samples against a prior.
    InferPosterior(InferArgs),
    /// Bayes factors of a candidate prior against the prior behind a posterior.
    ComparePriors(CompareArgs),
    /// List the built-in presets.
    ListPresets,
}

/// Options shared by every generation command.
#[derive(Debug, Args, Clone)]
pub struct GenerationArgs {
    /// Output directory.
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Prior table format.
    #[arg(long, value_enum, default_value_t = TableFormat::Parquet)]
    pub format: TableFormat,

    /// Random seed (defaults to ARCHEO_RANDOM_SEED, then 2023).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the configured number of samples.
    #[arg(long)]
    pub n_samples: Option<usize>,

    /// Worker threads for remnant evaluation (defaults to ARCHEO_MAX_WORKERS, then all cores).
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct PresetArgs {
    /// Preset name (see `list-presets`).
    #[arg(short = 'n', long = "name", value_enum)]
    pub preset: Preset,

    #[command(flatten)]
    pub generation: GenerationArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// Prior configuration JSON.
    #[arg(short = 'c', long, value_name = "JSON")]
    pub config: PathBuf,

    /// Name used for the output files (defaults to the config file stem).
    #[arg(long)]
    pub label: Option<String>,

    #[command(flatten)]
    pub generation: GenerationArgs,
}

#[derive(Debug, Args, Clone)]
pub struct VisualizeArgs {
    /// Prior table to summarise.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: PathBuf,

    /// Also write the summary to `<DIR>/<stem>_summary.txt`.
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table format (inferred from the extension when omitted).
    #[arg(long, value_enum)]
    pub format: Option<TableFormat>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct InferArgs {
    /// Prior table.
    #[arg(long, value_name = "FILE")]
    pub prior: PathBuf,

    /// Observed posterior samples of the event.
    #[arg(long, value_name = "FILE")]
    pub observed: PathBuf,

    /// Component hypothesised to be a remnant (1 = heavier, 2 = lighter).
    #[arg(long, value_enum, default_value_t = Component::Primary)]
    pub component: Component,

    /// Observed mass column (defaults to `mass_<component>_source`).
    #[arg(long)]
    pub mass_column: Option<String>,

    /// Observed spin column (defaults to `a_<component>`).
    #[arg(long)]
    pub spin_column: Option<String>,

    /// Mass tolerance in solar masses (defaults to the prior's stored value).
    #[arg(long)]
    pub mass_tolerance: Option<f64>,

    /// Spin tolerance (defaults to the prior's stored value).
    #[arg(long)]
    pub spin_tolerance: Option<f64>,

    /// Match on remnant mass and spin (`window`), or on spin only and rescale
    /// the progenitor masses to each observed mass (`spin-only`). Defaults to
    /// the prior's stored mode.
    #[arg(long, value_enum)]
    pub match_mode: Option<MatchMode>,

    /// Posterior output table.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Posterior table format (inferred from the extension when omitted).
    #[arg(long, value_enum)]
    pub format: Option<TableFormat>,

    /// Observed samples format (inferred from the extension when omitted).
    #[arg(long, value_enum)]
    pub observed_format: Option<TableFormat>,
}

impl InferArgs {
    pub fn mass_column(&self) -> String {
        self.mass_column.clone().unwrap_or_else(|| self.component.mass_column())
    }

    pub fn spin_column(&self) -> String {
        self.spin_column.clone().unwrap_or_else(|| self.component.spin_column())
    }
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Prior the posterior was inferred with.
    #[arg(long, value_name = "FILE")]
    pub prior: PathBuf,

    /// Candidate prior to weigh against it.
    #[arg(long, value_name = "FILE")]
    pub candidate: PathBuf,

    /// Posterior table written by `infer-posterior`.
    #[arg(long, value_name = "FILE")]
    pub posterior: PathBuf,

    /// Parameter to compare; repeat for several (defaults to m_1, m_2, q, a_1, a_2).
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,

    /// Histogram bins per parameter.
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,
}

impl CompareArgs {
    pub const DEFAULT_COLUMNS: [SampleColumn; 5] = [
        SampleColumn::M1,
        SampleColumn::M2,
        SampleColumn::Q,
        SampleColumn::A1,
        SampleColumn::A2,
    ];

    pub fn columns(&self) -> Result<Vec<SampleColumn>, AppError> {
        if self.columns.is_empty() {
            return Ok(Self::DEFAULT_COLUMNS.to_vec());
        }
        self.columns.iter().map(|name| name.parse()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_preset_generation() {
        let cli = Cli::parse_from([
            "archeo",
            "generate-preset-prior",
            "-n",
            "precessing_spin",
            "-o",
            "out",
            "--format",
            "csv",
            "--n-samples",
            "100",
        ]);
        let Command::GeneratePresetPrior(args) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.preset, Preset::PrecessingSpin);
        assert_eq!(args.generation.format, TableFormat::Csv);
        assert_eq!(args.generation.n_samples, Some(100));
        assert_eq!(args.generation.seed, None);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = Cli::try_parse_from(["archeo", "generate-preset-prior", "-n", "nope", "-o", "out"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn infer_defaults_follow_the_component() {
        let cli = Cli::parse_from([
            "archeo",
            "infer-posterior",
            "--prior",
            "p.parquet",
            "--observed",
            "gw.csv",
            "--component",
            "2",
            "--spin-tolerance",
            "0.1",
            "--match-mode",
            "spin-only",
            "-o",
            "post.json",
        ]);
        let Command::InferPosterior(args) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.component, Component::Secondary);
        assert_eq!(args.mass_column(), "mass_2_source");
        assert_eq!(args.spin_column(), "a_2");
        assert_eq!((args.mass_tolerance, args.spin_tolerance), (None, Some(0.1)));
        assert_eq!(args.match_mode, Some(MatchMode::SpinOnly));
    }

    #[test]
    fn compare_columns_default_and_validate() {
        let base = ["archeo", "compare-priors", "--prior", "a.parquet", "--candidate", "b.parquet", "--posterior", "p.json"];
        let Command::ComparePriors(args) = Cli::parse_from(base).command else {
            panic!("wrong command");
        };
        assert_eq!(args.columns().unwrap(), CompareArgs::DEFAULT_COLUMNS.to_vec());
        assert_eq!(args.bins, 100);

        let mut argv = base.to_vec();
        argv.extend(["--column", "a_eff", "--column", "k_f", "--bins", "30"]);
        let Command::ComparePriors(args) = Cli::parse_from(argv).command else {
            panic!("wrong command");
        };
        assert_eq!(args.columns().unwrap(), vec![SampleColumn::AEff, SampleColumn::KF]);
        assert_eq!(args.bins, 30);

        let mut argv = base.to_vec();
        argv.extend(["--column", "mass"]);
        let Command::ComparePriors(args) = Cli::parse_from(argv).command else {
            panic!("wrong command");
        };
        assert!(matches!(args.columns(), Err(AppError::Input(_))));
    }
}
