//! Shared workflows behind the CLI commands.
//!
//! Each function does the work of one command and returns what it produced, so
//! `app::run` only decides what to print.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::data::{ProgressObserver, SampleColumn};
use crate::domain::{Component, PriorConfig};
use crate::error::AppError;
use crate::infer::{BayesFactorCalculator, ColumnFactor, MatchMode, Posterior, PriorComparison, PriorReweighter};
use crate::io::{TableFormat, read_observed, read_table, write_atomic, write_config_json, write_table};
use crate::prior::{Prior, PriorGenerator};

/// Generation settings after merging CLI flags with the runtime environment.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub output_dir: PathBuf,
    pub format: TableFormat,
    pub seed: u64,
    pub n_samples: Option<usize>,
    pub workers: Option<usize>,
}

/// Files written by a generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub prior: Prior,
    pub config_path: PathBuf,
    pub prior_path: PathBuf,
}

/// Logs evaluation progress in 10 % steps.
#[derive(Debug, Default)]
pub struct ProgressLog {
    last_decile: AtomicUsize,
}

impl ProgressObserver for ProgressLog {
    fn on_progress(&self, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let decile = completed * 10 / total;
        if self.last_decile.fetch_max(decile, Ordering::Relaxed) < decile {
            tracing::info!(completed, total, "evaluated {}%", decile * 10);
        }
    }
}

/// Generate a prior for `config` and publish `{label}_prior_config.json` and
/// `{label}_prior.{ext}` under the output directory.
pub fn generate_and_save(label: &str, config: PriorConfig, opts: &GenerationOptions) -> Result<GenerationOutput, AppError> {
    let config = match opts.n_samples {
        Some(n) => config.with_n_samples(n)?,
        None => config,
    };

    let config_path = opts.output_dir.join(format!("{label}_prior_config.json"));
    let prior_path = opts
        .output_dir
        .join(format!("{label}_prior.{}", opts.format.extension()));

    let progress = ProgressLog::default();
    let prior = PriorGenerator::new()
        .seed(opts.seed)
        .workers(opts.workers)
        .observer(&progress)
        .generate(&config)?;

    write_config_json(&config_path, &config)?;
    prior.save(&prior_path, Some(opts.format))?;

    Ok(GenerationOutput {
        prior,
        config_path,
        prior_path,
    })
}

/// Output label for a configuration file: explicit label, else the file stem.
pub fn label_for_config(config_path: &Path, label: Option<&str>) -> String {
    label.map(str::to_string).unwrap_or_else(|| {
        config_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string())
    })
}

/// Write a text report next to other outputs as `{dir}/{stem}_summary.txt`.
pub fn save_summary(dir: &Path, source: &Path, text: &str) -> Result<PathBuf, AppError> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "prior".to_string());
    let path = dir.join(format!("{stem}_summary.txt"));
    write_atomic(&path, |mut file| {
        file.write_all(text.as_bytes())
            .map_err(|e| AppError::Io(format!("Failed to write summary: {e}")))
    })?;
    Ok(path)
}

/// Inputs of a posterior inference run.
#[derive(Debug, Clone)]
pub struct InferenceRequest<'a> {
    pub prior: &'a Path,
    pub observed: &'a Path,
    pub observed_format: Option<TableFormat>,
    pub component: Component,
    pub mass_column: &'a str,
    pub spin_column: &'a str,
    /// `(mass, spin)` overrides; `None` keeps the prior's stored tolerances.
    pub mass_tolerance: Option<f64>,
    pub spin_tolerance: Option<f64>,
    /// `None` keeps the prior's stored match mode.
    pub match_mode: Option<MatchMode>,
    pub output: &'a Path,
    pub format: Option<TableFormat>,
}

/// Load a prior and observed samples, match them, and publish the posterior.
pub fn infer_and_save(req: &InferenceRequest<'_>) -> Result<Posterior, AppError> {
    let output_format = TableFormat::resolve(req.format, req.output)?;
    let mut prior = Prior::load(req.prior, None)?;
    let observed = read_observed(req.observed, req.observed_format, req.mass_column, req.spin_column)?;
    if observed.is_empty() {
        tracing::warn!(path = %req.observed.display(), "no observed samples");
    }

    let tolerances = prior
        .tolerances()
        .with_overrides(req.mass_tolerance, req.spin_tolerance)?;
    prior.update_tolerances(tolerances.mass(), tolerances.spin())?;
    if let Some(mode) = req.match_mode {
        prior.set_match_mode(mode);
    }

    let posterior = prior.to_posterior(&observed.mass, &observed.spin, req.component)?;
    write_table(req.output, output_format, &posterior.to_table()?)?;
    tracing::info!(path = %req.output.display(), rows = posterior.len(), "saved posterior");
    Ok(posterior)
}

/// Inputs of a prior comparison.
#[derive(Debug, Clone)]
pub struct ComparisonRequest<'a> {
    /// Prior the posterior was inferred with.
    pub prior: &'a Path,
    pub candidate: &'a Path,
    /// Posterior table written by `infer_and_save`.
    pub posterior: &'a Path,
    pub columns: &'a [SampleColumn],
    pub bins: usize,
}

/// Bayes factors of a candidate prior against the prior behind a posterior,
/// one per requested column.
pub fn compare_priors(req: &ComparisonRequest<'_>) -> Result<PriorComparison, AppError> {
    let mut reweighter = PriorReweighter::new(BayesFactorCalculator::new(req.bins)?);
    let prior = Prior::load(req.prior, None)?;
    let candidate = Prior::load(req.candidate, None)?;
    let posterior = read_table(req.posterior, TableFormat::resolve(None, req.posterior)?)?;

    let mut factors = Vec::with_capacity(req.columns.len());
    for &column in req.columns {
        let observed = posterior
            .require(column.name())
            .map_err(|e| AppError::load(req.posterior, e))?;
        let bayes_factor = reweighter.reweight(&candidate.column(column), &prior.column(column), observed)?;
        tracing::info!(column = column.name(), bayes_factor, "compared priors");
        factors.push(ColumnFactor {
            column: column.name(),
            bayes_factor,
        });
    }

    Ok(PriorComparison {
        bins: reweighter.calculator().bins(),
        factors,
        cumulative: reweighter.cumulative_bayes_factor(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::aligned_spec;
    use crate::domain::Preset;
    use crate::io::read_config_json;
    use std::fs;

    fn options(dir: &Path, format: TableFormat) -> GenerationOptions {
        GenerationOptions {
            output_dir: dir.to_path_buf(),
            format,
            seed: 11,
            n_samples: Some(400),
            workers: Some(2),
        }
    }

    #[test]
    fn preset_generation_writes_config_and_prior() {
        let dir = tempfile::tempdir().unwrap();
        let config = Preset::TinyAlignedSpin.config().unwrap();
        let out = generate_and_save("tiny_aligned_spin", config, &options(dir.path(), TableFormat::Parquet)).unwrap();

        assert_eq!(out.config_path, dir.path().join("tiny_aligned_spin_prior_config.json"));
        assert_eq!(out.prior_path, dir.path().join("tiny_aligned_spin_prior.parquet"));
        assert_eq!(read_config_json(&out.config_path).unwrap().n_samples, 400);

        let loaded = Prior::load(&out.prior_path, None).unwrap();
        assert_eq!(loaded, out.prior);
    }

    #[test]
    fn inference_writes_posterior_rows_within_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let config = PriorConfig::new(aligned_spec()).unwrap();
        let out = generate_and_save("aligned", config, &options(dir.path(), TableFormat::Csv)).unwrap();

        let observed = dir.path().join("gw.csv");
        fs::write(&observed, "mass_1_source,a_1\n50,0.5\n50,0.5\n").unwrap();
        let output = dir.path().join("posterior.json");
        let req = InferenceRequest {
            prior: &out.prior_path,
            observed: &observed,
            observed_format: None,
            component: Component::Primary,
            mass_column: "mass_1_source",
            spin_column: "a_1",
            mass_tolerance: Some(2.0),
            spin_tolerance: None,
            match_mode: None,
            output: &output,
            format: None,
        };
        let posterior = infer_and_save(&req).unwrap();
        assert_eq!(posterior.tolerances().mass(), 2.0);
        assert_eq!(posterior.tolerances().spin(), 0.05);
        for row in posterior.rows() {
            assert!((48.0..=52.0).contains(&row.sample.m_f));
        }
        assert!(output.exists());
    }

    #[test]
    fn spin_only_inference_rescales_to_observed_masses() {
        let dir = tempfile::tempdir().unwrap();
        let config = PriorConfig::new(aligned_spec()).unwrap();
        let out = generate_and_save("aligned", config, &options(dir.path(), TableFormat::Json)).unwrap();

        let observed = dir.path().join("gw.csv");
        fs::write(&observed, "mass_1_source,a_1\n250,0.6\n260,0.65\n").unwrap();
        let output = dir.path().join("posterior.parquet");
        let req = InferenceRequest {
            prior: &out.prior_path,
            observed: &observed,
            observed_format: None,
            component: Component::Primary,
            mass_column: "mass_1_source",
            spin_column: "a_1",
            mass_tolerance: None,
            spin_tolerance: None,
            match_mode: Some(MatchMode::SpinOnly),
            output: &output,
            format: None,
        };
        let posterior = infer_and_save(&req).unwrap();
        assert_eq!(posterior.match_mode(), MatchMode::SpinOnly);
        assert!(!posterior.is_empty());
        for row in posterior.rows() {
            assert_eq!(row.sample.m_f, row.observed.mass);
        }
    }

    #[test]
    fn unreadable_prior_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let observed = dir.path().join("gw.csv");
        fs::write(&observed, "mass_1_source,a_1\n50,0.5\n").unwrap();
        let output = dir.path().join("posterior.csv");
        let req = InferenceRequest {
            prior: &dir.path().join("missing.parquet"),
            observed: &observed,
            observed_format: None,
            component: Component::Primary,
            mass_column: "mass_1_source",
            spin_column: "a_1",
            mass_tolerance: None,
            spin_tolerance: None,
            match_mode: None,
            output: &output,
            format: None,
        };
        assert!(infer_and_save(&req).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn label_defaults_to_config_stem() {
        assert_eq!(label_for_config(Path::new("cfg/bh2g.json"), None), "bh2g");
        assert_eq!(label_for_config(Path::new("cfg/bh2g.json"), Some("run1")), "run1");
    }

    #[test]
    fn progress_logs_each_decile_once() {
        let progress = ProgressLog::default();
        progress.on_progress(5, 100);
        progress.on_progress(15, 100);
        progress.on_progress(12, 100);
        assert_eq!(progress.last_decile.load(Ordering::Relaxed), 1);
        progress.on_progress(100, 100);
        assert_eq!(progress.last_decile.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn summary_is_written_under_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_summary(dir.path(), Path::new("runs/aligned_prior.parquet"), "hello\n").unwrap();
        assert_eq!(path, dir.path().join("aligned_prior_summary.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello\n");
    }

    #[test]
    fn identical_candidate_prior_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let config = PriorConfig::new(aligned_spec()).unwrap();
        let out = generate_and_save("aligned", config, &options(dir.path(), TableFormat::Parquet)).unwrap();

        let mut csv = String::from("mass_1_source,a_1\n");
        for s in &out.prior.samples()[..20] {
            csv.push_str(&format!("{},{}\n", s.m_f, s.a_f));
        }
        let observed = dir.path().join("gw.csv");
        fs::write(&observed, csv).unwrap();
        let posterior_path = dir.path().join("posterior.json");
        let req = InferenceRequest {
            prior: &out.prior_path,
            observed: &observed,
            observed_format: None,
            component: Component::Primary,
            mass_column: "mass_1_source",
            spin_column: "a_1",
            mass_tolerance: None,
            spin_tolerance: None,
            match_mode: None,
            output: &posterior_path,
            format: None,
        };
        assert!(!infer_and_save(&req).unwrap().is_empty());

        let columns = [SampleColumn::M1, SampleColumn::Q, SampleColumn::A1];
        let comparison = compare_priors(&ComparisonRequest {
            prior: &out.prior_path,
            candidate: &out.prior_path,
            posterior: &posterior_path,
            columns: &columns,
            bins: 40,
        })
        .unwrap();

        assert_eq!(comparison.bins, 40);
        let names: Vec<&str> = comparison.factors.iter().map(|f| f.column).collect();
        assert_eq!(names, vec!["m_1", "q", "a_1"]);
        for f in &comparison.factors {
            assert!((f.bayes_factor - 1.0).abs() < 1e-9, "{f:?}");
        }
        assert!((comparison.cumulative - 1.0).abs() < 1e-9);
    }

    #[test]
    fn comparison_needs_the_posterior_columns() {
        let dir = tempfile::tempdir().unwrap();
        let config = Preset::TinyAlignedSpin.config().unwrap();
        let out = generate_and_save("tiny", config, &options(dir.path(), TableFormat::Json)).unwrap();
        let posterior_path = dir.path().join("posterior.csv");
        fs::write(&posterior_path, "m_f,a_f\n50,0.5\n").unwrap();

        let err = compare_priors(&ComparisonRequest {
            prior: &out.prior_path,
            candidate: &out.prior_path,
            posterior: &posterior_path,
            columns: &[SampleColumn::M1],
            bins: 10,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Load { .. }));
    }
}
