//! Tolerance-window matching of observed draws against prior remnants.
//!
//! In [`MatchMode::Window`] a prior row matches an observed draw `(m, a)` when
//! `|m_f - m| < mass_tol` and `|a_f - a| < spin_tol`. In
//! [`MatchMode::SpinOnly`] only the spin condition applies. Rows are found
//! through indices sorted by remnant mass and by remnant spin, so each draw
//! costs a binary search plus a scan of the window.

use std::fmt;

use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::Sample;
use crate::error::AppError;

/// Match rates below this are reported as a warning.
pub const LOW_MATCH_RATE: f64 = 0.01;

/// Remnant properties an observed draw is matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Remnant mass and spin both inside the tolerance window.
    #[default]
    Window,
    /// Remnant spin only. Matched progenitor masses are rescaled so the
    /// remnant mass equals the observed one.
    SpinOnly,
}

impl MatchMode {
    pub fn name(self) -> &'static str {
        match self {
            MatchMode::Window => "window",
            MatchMode::SpinOnly => "spin-only",
        }
    }

    pub fn rescales_mass(self) -> bool {
        self == MatchMode::SpinOnly
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-widths of the rectangular matching window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTolerances")]
pub struct Tolerances {
    mass: f64,
    spin: f64,
}

#[derive(Deserialize)]
struct RawTolerances {
    mass: f64,
    spin: f64,
}

impl TryFrom<RawTolerances> for Tolerances {
    type Error = AppError;

    fn try_from(raw: RawTolerances) -> Result<Self, Self::Error> {
        Tolerances::new(raw.mass, raw.spin)
    }
}

impl Tolerances {
    pub const DEFAULT_MASS: f64 = 1.0;
    pub const DEFAULT_SPIN: f64 = 0.05;

    pub fn new(mass: f64, spin: f64) -> Result<Self, AppError> {
        for (name, v) in [("mass", mass), ("spin", spin)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(AppError::input(format!(
                    "{name} tolerance must be finite and non-negative (got {v})."
                )));
            }
        }
        Ok(Self { mass, spin })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn spin(&self) -> f64 {
        self.spin
    }

    /// Replace either half-width, keeping the current value where `None`.
    pub fn with_overrides(self, mass: Option<f64>, spin: Option<f64>) -> Result<Self, AppError> {
        Self::new(mass.unwrap_or(self.mass), spin.unwrap_or(self.spin))
    }

    pub fn accepts(&self, sample_mass: f64, sample_spin: f64, mass: f64, spin: f64) -> bool {
        (sample_mass - mass).abs() < self.mass && self.accepts_spin(sample_spin, spin)
    }

    pub fn accepts_spin(&self, sample_spin: f64, spin: f64) -> bool {
        (sample_spin - spin).abs() < self.spin
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            mass: Self::DEFAULT_MASS,
            spin: Self::DEFAULT_SPIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexEntry {
    m_f: f64,
    a_f: f64,
    row: usize,
}

/// Window around `center` widened by a few ulps; the exact test decides.
fn search_bounds(center: f64, tol: f64) -> (f64, f64) {
    let slack = (center.abs() + tol) * 4.0 * f64::EPSILON;
    (center - tol - slack, center + tol + slack)
}

/// Prior rows sorted by remnant mass and, separately, by remnant spin (ties
/// by row index).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemnantIndex {
    entries: Vec<IndexEntry>,
    by_spin: Vec<IndexEntry>,
}

impl RemnantIndex {
    pub fn build(samples: &[Sample]) -> Self {
        let mut entries: Vec<IndexEntry> = samples
            .iter()
            .enumerate()
            .map(|(row, s)| IndexEntry {
                m_f: s.m_f,
                a_f: s.a_f,
                row,
            })
            .collect();
        let mut by_spin = entries.clone();
        entries.sort_by(|a, b| a.m_f.total_cmp(&b.m_f).then(a.row.cmp(&b.row)));
        by_spin.sort_by(|a, b| a.a_f.total_cmp(&b.a_f).then(a.row.cmp(&b.row)));
        Self { entries, by_spin }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prior row indices matching one observed draw under `mode`, ascending.
    pub fn matches_in(&self, mode: MatchMode, mass: f64, spin: f64, tolerances: &Tolerances) -> Vec<usize> {
        match mode {
            MatchMode::Window => self.matches(mass, spin, tolerances),
            MatchMode::SpinOnly => self.matches_spin(spin, tolerances),
        }
    }

    /// Prior row indices inside the mass and spin window, ascending.
    pub fn matches(&self, mass: f64, spin: f64, tolerances: &Tolerances) -> Vec<usize> {
        let (lo, hi) = search_bounds(mass, tolerances.mass());
        let start = self.entries.partition_point(|e| e.m_f < lo);
        let mut rows: Vec<usize> = self.entries[start..]
            .iter()
            .take_while(|e| e.m_f <= hi)
            .filter(|e| tolerances.accepts(e.m_f, e.a_f, mass, spin))
            .map(|e| e.row)
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Prior row indices whose remnant spin lies inside the spin window, ascending.
    pub fn matches_spin(&self, spin: f64, tolerances: &Tolerances) -> Vec<usize> {
        let (lo, hi) = search_bounds(spin, tolerances.spin());
        let start = self.by_spin.partition_point(|e| e.a_f < lo);
        let mut rows: Vec<usize> = self.by_spin[start..]
            .iter()
            .take_while(|e| e.a_f <= hi)
            .filter(|e| tolerances.accepts_spin(e.a_f, spin))
            .map(|e| e.row)
            .collect();
        rows.sort_unstable();
        rows
    }
}

/// Aggregate statistics of one matching run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchDiagnostics {
    pub n_draws: usize,
    /// Draws with at least one matching prior row.
    pub n_matched_draws: usize,
    /// `n_matched_draws / n_draws`.
    pub match_rate: f64,
    /// Total posterior rows (a row matched by K draws counts K times).
    pub n_matched_rows: usize,
    pub prior_size: usize,
    /// Mean over draws of `matches / prior_size`.
    pub mean_likelihood: f64,
}

impl MatchDiagnostics {
    pub fn is_low(&self) -> bool {
        self.match_rate < LOW_MATCH_RATE
    }
}

/// Per-draw matches plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub per_draw: Vec<Vec<usize>>,
    pub diagnostics: MatchDiagnostics,
}

/// Match every observed draw against the index, in parallel over draws.
pub fn match_observations(
    index: &RemnantIndex,
    mass: &[f64],
    spin: &[f64],
    tolerances: &Tolerances,
    mode: MatchMode,
) -> Result<MatchResult, AppError> {
    if mass.len() != spin.len() {
        return Err(AppError::input(format!(
            "Observed mass and spin samples differ in length ({} vs {}).",
            mass.len(),
            spin.len()
        )));
    }
    if let Some(bad) = mass.iter().chain(spin).find(|v| !v.is_finite()) {
        return Err(AppError::input(format!("Observed samples must be finite (got {bad}).")));
    }

    let per_draw: Vec<Vec<usize>> = mass
        .par_iter()
        .zip(spin.par_iter())
        .map(|(&m, &a)| index.matches_in(mode, m, a, tolerances))
        .collect();

    let n_draws = per_draw.len();
    let n_matched_draws = per_draw.iter().filter(|rows| !rows.is_empty()).count();
    let n_matched_rows = per_draw.iter().map(Vec::len).sum();
    let prior_size = index.len();
    let match_rate = if n_draws == 0 {
        0.0
    } else {
        n_matched_draws as f64 / n_draws as f64
    };
    let mean_likelihood = if n_draws == 0 || prior_size == 0 {
        0.0
    } else {
        n_matched_rows as f64 / prior_size as f64 / n_draws as f64
    };

    let diagnostics = MatchDiagnostics {
        n_draws,
        n_matched_draws,
        match_rate,
        n_matched_rows,
        prior_size,
        mean_likelihood,
    };

    if diagnostics.is_low() {
        tracing::warn!(
            n_draws,
            n_matched_draws,
            match_rate,
            %mode,
            mass_tolerance = tolerances.mass(),
            spin_tolerance = tolerances.spin(),
            "few observed draws matched the prior; consider wider tolerances or a denser prior"
        );
    } else {
        tracing::info!(n_draws, n_matched_draws, n_matched_rows, match_rate, %mode, "matched observed draws");
    }

    Ok(MatchResult { per_draw, diagnostics })
}
