//! Prior comparison through binned densities.
//!
//! The likelihood behind a posterior is left untouched, so the Bayes factor of
//! a candidate prior against the prior that produced the posterior is
//!
//! ```text
//! B = ∫ p_candidate(θ) p_posterior(θ) / p_prior(θ) dθ
//! ```
//!
//! evaluated on a shared equal-width binning of all three sample sets. Bins
//! where any density is zero are skipped.

use serde::Serialize;

use crate::error::AppError;
use crate::math::histogram;

pub const DEFAULT_BINS: usize = 100;
pub const DEFAULT_AUC_TOLERANCE: f64 = 1e-6;

/// Equal-width bins spanning every value of the compared samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Binning {
    pub low: f64,
    pub high: f64,
    pub bins: usize,
}

impl Binning {
    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.bins as f64
    }

    pub fn centers(&self) -> Vec<f64> {
        let w = self.width();
        (0..self.bins).map(|i| self.low + (i as f64 + 0.5) * w).collect()
    }
}

/// Normalised likelihood per bin, `p_posterior / p_prior`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikelihoodHistogram {
    pub binning: Binning,
    pub centers: Vec<f64>,
    pub density: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayesFactorCalculator {
    bins: usize,
    auc_tolerance: f64,
}

impl Default for BayesFactorCalculator {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            auc_tolerance: DEFAULT_AUC_TOLERANCE,
        }
    }
}

impl BayesFactorCalculator {
    pub fn new(bins: usize) -> Result<Self, AppError> {
        if bins == 0 {
            return Err(AppError::config("Bayes factor binning needs at least one bin."));
        }
        Ok(Self {
            bins,
            ..Self::default()
        })
    }

    pub fn with_auc_tolerance(mut self, tolerance: f64) -> Result<Self, AppError> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(AppError::config(format!(
                "AUC tolerance must be finite and positive (got {tolerance})."
            )));
        }
        self.auc_tolerance = tolerance;
        Ok(self)
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Shared binning over all `series`.
    pub fn binning(&self, series: &[&[f64]]) -> Result<Binning, AppError> {
        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for values in series {
            if values.is_empty() {
                return Err(AppError::input("Cannot bin an empty sample set."));
            }
            for &v in *values {
                if !v.is_finite() {
                    return Err(AppError::input(format!("Samples must be finite (got {v}).")));
                }
                low = low.min(v);
                high = high.max(v);
            }
        }
        if !(high > low) {
            return Err(AppError::input(format!(
                "Samples span no range (all values are {low}); nothing to bin."
            )));
        }
        let binning = Binning {
            low,
            high,
            bins: self.bins,
        };
        tracing::debug!(low, high, width = binning.width(), "set histogram bounds");
        Ok(binning)
    }

    /// Probability density per bin. Fails if the density does not integrate to one.
    pub fn density(&self, values: &[f64], binning: &Binning) -> Result<Vec<f64>, AppError> {
        let counts = histogram(values, binning.low, binning.high, binning.bins);
        let width = binning.width();
        let norm = values.len() as f64 * width;
        let density: Vec<f64> = counts.iter().map(|&c| c as f64 / norm).collect();

        let auc = density.iter().sum::<f64>() * width;
        if (auc - 1.0).abs() > self.auc_tolerance {
            return Err(AppError::input(format!(
                "Invalid probability distribution (AUC={auc:.4}); samples fall outside [{}, {}].",
                binning.low, binning.high
            )));
        }
        Ok(density)
    }

    /// Bayes factor of `candidate_prior` against `prior`, given `posterior`
    /// samples drawn under `prior`.
    pub fn bayes_factor(&self, candidate_prior: &[f64], prior: &[f64], posterior: &[f64]) -> Result<f64, AppError> {
        let binning = self.binning(&[candidate_prior, prior, posterior])?;
        let candidate = self.density(candidate_prior, &binning)?;
        let old = self.density(prior, &binning)?;
        let post = self.density(posterior, &binning)?;

        let mut used = 0usize;
        let mut sum = 0.0;
        for ((&c, &p), &q) in candidate.iter().zip(&old).zip(&post) {
            if c > 0.0 && p > 0.0 && q > 0.0 {
                // Sum in log space; the ratio of small densities loses precision otherwise.
                sum += (c.ln() + q.ln() - p.ln()).exp();
                used += 1;
            }
        }
        tracing::info!(used, bins = binning.bins, "bins with non-zero densities");
        Ok(sum * binning.width())
    }

    /// `p_posterior / p_prior` per bin, normalised to unit area. Bins where the
    /// prior density is zero get zero likelihood.
    pub fn likelihood(&self, prior: &[f64], posterior: &[f64]) -> Result<LikelihoodHistogram, AppError> {
        let binning = self.binning(&[prior, posterior])?;
        let old = self.density(prior, &binning)?;
        let post = self.density(posterior, &binning)?;

        let mut density: Vec<f64> = old
            .iter()
            .zip(&post)
            .map(|(&p, &q)| if p > 0.0 { q / p } else { 0.0 })
            .collect();
        let area = density.iter().sum::<f64>() * binning.width();
        if area > 0.0 {
            density.iter_mut().for_each(|d| *d /= area);
        }

        Ok(LikelihoodHistogram {
            binning,
            centers: binning.centers(),
            density,
        })
    }
}

/// Bayes factor of a candidate prior for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnFactor {
    pub column: &'static str,
    pub bayes_factor: f64,
}

/// Per-parameter Bayes factors of a candidate prior and their product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorComparison {
    pub bins: usize,
    pub factors: Vec<ColumnFactor>,
    pub cumulative: f64,
}

/// Bayes factors of successive candidate priors, with their running product.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorReweighter {
    calculator: BayesFactorCalculator,
    cumulative: f64,
}

impl Default for PriorReweighter {
    fn default() -> Self {
        Self::new(BayesFactorCalculator::default())
    }
}

impl PriorReweighter {
    pub fn new(calculator: BayesFactorCalculator) -> Self {
        Self {
            calculator,
            cumulative: 1.0,
        }
    }

    /// Bayes factor for one parameter; folded into the cumulative factor.
    pub fn reweight(&mut self, candidate_prior: &[f64], prior: &[f64], posterior: &[f64]) -> Result<f64, AppError> {
        let factor = self.calculator.bayes_factor(candidate_prior, prior, posterior)?;
        self.cumulative *= factor;
        Ok(factor)
    }

    pub fn cumulative_bayes_factor(&self) -> f64 {
        self.cumulative
    }

    pub fn calculator(&self) -> &BayesFactorCalculator {
        &self.calculator
    }
}
