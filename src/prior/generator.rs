//! Prior generation: sample progenitors, evaluate remnants, keep the survivors.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::data::{CancelToken, DEFAULT_CHUNK_SIZE, ProgressObserver, RemnantEvaluator, RemnantPool, Sampler};
use crate::domain::{Component, PriorConfig};
use crate::error::AppError;
use crate::models::RemnantModel;
use crate::prior::Prior;

pub const DEFAULT_SEED: u64 = 2023;

/// What happened while a prior was generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub model: String,
    pub requested: usize,
    pub kept: usize,
    /// Dropped rows per failure reason.
    pub dropped: BTreeMap<String, usize>,
    /// Rows evaluated outside the model's training range.
    pub extrapolated: usize,
    pub generated_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    /// Components drawn from an earlier generation's remnants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestry: Vec<Component>,
}

impl GenerationReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Configurable prior generation.
///
/// ```no_run
/// use archeo::domain::Preset;
/// use archeo::prior::PriorGenerator;
///
/// let config = Preset::TinyAlignedSpin.config()?;
/// let prior = PriorGenerator::new().seed(7).workers(Some(4)).generate(&config)?;
/// println!("{} rows", prior.len());
/// # Ok::<(), archeo::error::AppError>(())
/// ```
pub struct PriorGenerator<'a> {
    seed: u64,
    workers: Option<usize>,
    chunk_size: usize,
    model: Option<&'a dyn RemnantModel>,
    observer: Option<&'a dyn ProgressObserver>,
    cancel: Option<CancelToken>,
    ancestry: Vec<(Component, RemnantPool)>,
}

impl Default for PriorGenerator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> PriorGenerator<'a> {
    pub fn new() -> Self {
        Self {
            seed: DEFAULT_SEED,
            workers: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            model: None,
            observer: None,
            cancel: None,
            ancestry: Vec::new(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Use `model` instead of the built-in model for the configured fits.
    pub fn model(mut self, model: &'a dyn RemnantModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Draw `component` from the remnants of `parent` (hierarchical mergers).
    pub fn ancestor(mut self, component: Component, parent: &Prior) -> Result<Self, AppError> {
        self.ancestry.push((component, parent.remnant_pool()?));
        Ok(self)
    }

    pub fn generate(&self, config: &PriorConfig) -> Result<Prior, AppError> {
        let started = Instant::now();
        let model = self.model.unwrap_or_else(|| config.fits.load());
        tracing::info!(seed = self.seed, model = model.name(), "generating prior: {config}");

        let mut sampler = Sampler::new(config)?;
        for (component, pool) in &self.ancestry {
            sampler = sampler.with_ancestry(*component, pool.clone())?;
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let draws = sampler.draw_many(&mut rng, config.n_samples)?;
        tracing::debug!(draws = draws.len(), "sampled progenitors");

        let outcome = RemnantEvaluator::new(model)
            .workers(self.workers)
            .chunk_size(self.chunk_size)
            .observer(self.observer)
            .cancel(self.cancel.clone())
            .evaluate(&draws)?;

        let dropped = outcome.dropped_total();
        if outcome.samples.is_empty() {
            return Err(AppError::Evaluation(format!(
                "All {} rows failed remnant evaluation with {} ({:?}).",
                config.n_samples,
                model.name(),
                outcome.dropped
            )));
        }
        if dropped > 0 {
            tracing::warn!(dropped, reasons = ?outcome.dropped, "dropped rows the remnant model could not evaluate");
        }
        if outcome.extrapolated > 0 {
            tracing::info!(extrapolated = outcome.extrapolated, "rows evaluated outside the training range");
        }

        let report = GenerationReport {
            seed: self.seed,
            model: model.name().to_string(),
            requested: config.n_samples,
            kept: outcome.samples.len(),
            dropped: outcome.dropped,
            extrapolated: outcome.extrapolated,
            generated_at: Utc::now(),
            elapsed_seconds: started.elapsed().as_secs_f64(),
            ancestry: self.ancestry.iter().map(|(c, _)| *c).collect(),
        };
        tracing::info!(
            kept = report.kept,
            dropped,
            elapsed = report.elapsed_seconds,
            "prior generated"
        );

        Prior::from_parts(outcome.samples, Some(config.clone()), Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CancelToken;
    use crate::domain::config::aligned_spec;
    use crate::domain::{Fits, PriorConfigSpec};
    use crate::models::{Binary, EvaluationFailure, RemnantEstimate};

    struct AlwaysFails;

    impl RemnantModel for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }

        fn evaluate(&self, _binary: &Binary) -> Result<RemnantEstimate, EvaluationFailure> {
            Err(EvaluationFailure::NonFinite)
        }
    }

    fn config(n: usize) -> PriorConfig {
        PriorConfig::new(PriorConfigSpec {
            n_samples: n,
            ..aligned_spec()
        })
        .unwrap()
    }

    #[test]
    fn same_seed_same_prior() {
        let cfg = config(300);
        let a = PriorGenerator::new().seed(42).workers(Some(1)).generate(&cfg).unwrap();
        let b = PriorGenerator::new().seed(42).workers(Some(3)).generate(&cfg).unwrap();
        let c = PriorGenerator::new().seed(43).generate(&cfg).unwrap();
        assert_eq!(a.samples(), b.samples());
        assert_ne!(a.samples(), c.samples());
    }

    #[test]
    fn report_accounts_for_every_draw() {
        let prior = PriorGenerator::new().generate(&config(500)).unwrap();
        let report = prior.report().unwrap();
        assert_eq!(report.requested, 500);
        assert_eq!(report.kept + report.dropped_total(), 500);
        assert_eq!(report.kept, prior.len());
        assert_eq!(report.seed, DEFAULT_SEED);
        assert_eq!(report.model, Fits::NrSur3dq8Remnant.name());
    }

    #[test]
    fn total_evaluation_failure_is_an_error() {
        let err = PriorGenerator::new().model(&AlwaysFails).generate(&config(50)).unwrap_err();
        assert!(matches!(err, AppError::Evaluation(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn pre_cancelled_token_aborts() {
        let token = CancelToken::new();
        token.cancel();
        let err = PriorGenerator::new().cancel(token).generate(&config(50)).unwrap_err();
        assert!(matches!(err, AppError::Cancelled { completed: 0, total: 50 }));
    }

    #[test]
    fn second_generation_inherits_first_generation_remnants() {
        let first = PriorGenerator::new().seed(1).generate(&config(400)).unwrap();
        let parents: Vec<f64> = first.samples().iter().map(|s| s.m_f).collect();

        let cfg = PriorConfig::new(PriorConfigSpec {
            n_samples: 200,
            m_2: crate::domain::Domain::new(5.0, 30.0).unwrap(),
            ..aligned_spec()
        })
        .unwrap();
        let second = PriorGenerator::new()
            .seed(2)
            .ancestor(Component::Primary, &first)
            .unwrap()
            .generate(&cfg)
            .unwrap();

        for s in second.samples() {
            assert!(parents.contains(&s.m_1) || parents.contains(&s.m_2), "m_1={} m_2={}", s.m_1, s.m_2);
        }
        assert_eq!(second.report().unwrap().ancestry, vec![Component::Primary]);
    }
}
