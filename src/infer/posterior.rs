//! Posterior over progenitor parameters.
//!
//! A posterior is the pooled set of prior rows matched by the observed draws.
//! It owns copies of the matched rows and never changes after construction.
//! In [`MatchMode::SpinOnly`] each copy is rescaled to the remnant mass of the
//! draw that matched it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::{Sample, SampleColumn};
use crate::domain::Component;
use crate::error::AppError;
use crate::infer::matcher::{MatchDiagnostics, MatchMode, MatchResult, Tolerances};
use crate::io::{Column, Table, TableKind, TableMeta};
use crate::math::{ColumnSummary, KsTest, ks_two_sample};

/// Extra columns appended to the prior columns when a posterior is exported.
pub const POSTERIOR_EXTRA_COLUMNS: [&str; 4] = ["m_f_obs", "a_f_obs", "prior_index", "draw_index"];

/// One observed `(mass, spin)` draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObservedSample {
    pub mass: f64,
    pub spin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosteriorRow {
    pub prior_index: usize,
    pub draw_index: usize,
    pub observed: ObservedSample,
    pub sample: Sample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub column: &'static str,
    #[serde(flatten)]
    pub summary: ColumnSummary,
}

/// Marginal summaries of the progenitor parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosteriorSummary {
    pub entries: Vec<SummaryEntry>,
}

impl PosteriorSummary {
    pub fn get(&self, column: SampleColumn) -> Option<&ColumnSummary> {
        self.entries
            .iter()
            .find(|e| e.column == column.name())
            .map(|e| &e.summary)
    }
}

/// KS tests between the observed draws and the matched remnants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Consistency {
    pub mass: Option<KsTest>,
    pub spin: Option<KsTest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    component: Component,
    tolerances: Tolerances,
    mode: MatchMode,
    observed: Vec<ObservedSample>,
    rows: Vec<PosteriorRow>,
    diagnostics: MatchDiagnostics,
}

impl Posterior {
    /// Assemble a posterior from per-draw matches against `samples`.
    ///
    /// `matches` must come from matching `mass`/`spin` against `samples`;
    /// any draw or row index outside them is an input error.
    pub(crate) fn from_matches(
        samples: &[Sample],
        mass: &[f64],
        spin: &[f64],
        matches: MatchResult,
        tolerances: Tolerances,
        mode: MatchMode,
        component: Component,
    ) -> Result<Self, AppError> {
        let observed: Vec<ObservedSample> = mass
            .iter()
            .zip(spin)
            .map(|(&mass, &spin)| ObservedSample { mass, spin })
            .collect();
        if matches.per_draw.len() != observed.len() {
            return Err(AppError::input(format!(
                "Match result covers {} draws but {} were observed.",
                matches.per_draw.len(),
                observed.len()
            )));
        }

        let mut rows = Vec::with_capacity(matches.diagnostics.n_matched_rows);
        for (draw_index, prior_rows) in matches.per_draw.iter().enumerate() {
            let observed = observed[draw_index];
            for &prior_index in prior_rows {
                let matched = samples.get(prior_index).ok_or_else(|| {
                    AppError::input(format!(
                        "Matched row {prior_index} is outside the prior ({} rows).",
                        samples.len()
                    ))
                })?;
                let sample = if mode.rescales_mass() {
                    matched.rescaled_to(observed.mass).ok_or_else(|| {
                        AppError::input(format!(
                            "Prior row {prior_index} has no positive retained mass and cannot be rescaled."
                        ))
                    })?
                } else {
                    *matched
                };
                rows.push(PosteriorRow {
                    prior_index,
                    draw_index,
                    observed,
                    sample,
                });
            }
        }

        Ok(Self {
            component,
            tolerances,
            mode,
            observed,
            rows,
            diagnostics: matches.diagnostics,
        })
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    pub fn diagnostics(&self) -> &MatchDiagnostics {
        &self.diagnostics
    }

    pub fn observed(&self) -> &[ObservedSample] {
        &self.observed
    }

    pub fn rows(&self) -> &[PosteriorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, column: SampleColumn) -> Vec<f64> {
        self.rows.iter().map(|r| r.sample.get(column)).collect()
    }

    /// How many times each prior row appears.
    pub fn multiplicity(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.rows {
            *counts.entry(r.prior_index).or_insert(0) += 1;
        }
        counts
    }

    /// Mean, standard deviation and 5/50/95 % quantiles of each progenitor
    /// parameter. Empty posteriors yield no entries.
    pub fn summary(&self) -> PosteriorSummary {
        let entries = SampleColumn::PROGENITOR
            .iter()
            .filter_map(|&c| {
                ColumnSummary::from_values(&self.column(c)).map(|summary| SummaryEntry {
                    column: c.name(),
                    summary,
                })
            })
            .collect();
        PosteriorSummary { entries }
    }

    /// Compare the observed draws with the remnant mass and spin of the matched rows.
    pub fn consistency(&self) -> Consistency {
        let obs_mass: Vec<f64> = self.observed.iter().map(|o| o.mass).collect();
        let obs_spin: Vec<f64> = self.observed.iter().map(|o| o.spin).collect();
        Consistency {
            mass: ks_two_sample(&obs_mass, &self.column(SampleColumn::MF)),
            spin: ks_two_sample(&obs_spin, &self.column(SampleColumn::AF)),
        }
    }

    pub fn to_table(&self) -> Result<Table, AppError> {
        let mut columns: Vec<Column> = SampleColumn::ALL
            .iter()
            .map(|&c| Column {
                name: c.name().to_string(),
                values: self.column(c),
            })
            .collect();
        let extras: [Vec<f64>; 4] = [
            self.rows.iter().map(|r| r.observed.mass).collect(),
            self.rows.iter().map(|r| r.observed.spin).collect(),
            self.rows.iter().map(|r| r.prior_index as f64).collect(),
            self.rows.iter().map(|r| r.draw_index as f64).collect(),
        ];
        for (name, values) in POSTERIOR_EXTRA_COLUMNS.iter().zip(extras) {
            columns.push(Column {
                name: name.to_string(),
                values,
            });
        }

        let mut meta = TableMeta::new(TableKind::Posterior);
        meta.tolerances = Some(self.tolerances);
        meta.match_mode = Some(self.mode);
        meta.component = Some(self.component);
        Ok(Table::new(columns)?.with_meta(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::matcher::{RemnantIndex, match_observations};

    fn sample(m_1: f64, m_f: f64, a_f: f64) -> Sample {
        let mut values = [0.0; 15];
        values[0] = m_1;
        values[10] = m_f;
        values[11] = a_f;
        Sample::from_values(&values)
    }

    fn posterior_in(mode: MatchMode, samples: &[Sample], mass: &[f64], spin: &[f64]) -> Posterior {
        let tol = Tolerances::default();
        let index = RemnantIndex::build(samples);
        let matches = match_observations(&index, mass, spin, &tol, mode).unwrap();
        Posterior::from_matches(samples, mass, spin, matches, tol, mode, Component::Primary).unwrap()
    }

    fn posterior(samples: &[Sample], mass: &[f64], spin: &[f64]) -> Posterior {
        posterior_in(MatchMode::Window, samples, mass, spin)
    }

    fn binary(m_1: f64, m_2: f64, m_ret: f64, a_f: f64) -> Sample {
        let mut values = [0.0; 15];
        values[0] = m_1;
        values[1] = m_2;
        values[2] = m_1 / m_2;
        values[9] = m_ret;
        values[10] = m_ret * (m_1 + m_2);
        values[11] = a_f;
        Sample::from_values(&values)
    }

    #[test]
    fn rows_are_ordered_by_draw_then_prior_index() {
        let samples = vec![sample(30.0, 50.5, 0.5), sample(31.0, 20.0, 0.1), sample(32.0, 49.6, 0.52)];
        let p = posterior(&samples, &[50.0, 20.2], &[0.5, 0.1]);
        let order: Vec<(usize, usize)> = p.rows().iter().map(|r| (r.draw_index, r.prior_index)).collect();
        assert_eq!(order, vec![(0, 0), (0, 2), (1, 1)]);
        assert_eq!(p.rows()[2].observed, ObservedSample { mass: 20.2, spin: 0.1 });
        assert_eq!(p.rows()[1].sample.m_1, 32.0);
    }

    #[test]
    fn multiplicity_counts_repeated_matches() {
        let samples = vec![sample(30.0, 50.5, 0.5), sample(31.0, 80.0, 0.1)];
        let p = posterior(&samples, &[50.0, 50.1, 50.2], &[0.5, 0.5, 0.5]);
        assert_eq!(p.len(), 3);
        assert_eq!(p.multiplicity().get(&0), Some(&3));
        assert_eq!(p.multiplicity().get(&1), None);
    }

    #[test]
    fn empty_posterior_has_empty_summary() {
        let samples = vec![sample(30.0, 50.5, 0.5)];
        let p = posterior(&samples, &[1500.0], &[0.5]);
        assert!(p.is_empty());
        assert!(p.summary().entries.is_empty());
        assert!(p.consistency().mass.is_none());
        let table = p.to_table().unwrap();
        assert_eq!(table.n_rows(), 0);
        assert_eq!(table.columns().len(), 19);
    }

    #[test]
    fn summary_and_export_columns() {
        let samples = vec![sample(30.0, 50.5, 0.5), sample(40.0, 49.5, 0.5)];
        let p = posterior(&samples, &[50.0], &[0.5]);
        let m1 = p.summary().get(SampleColumn::M1).copied().unwrap();
        assert_eq!(m1.count, 2);
        assert!((m1.mean - 35.0).abs() < 1e-12);

        let table = p.to_table().unwrap();
        assert_eq!(&table.names()[15..], &["m_f_obs", "a_f_obs", "prior_index", "draw_index"]);
        assert_eq!(table.column("prior_index"), Some(&[0.0, 1.0][..]));
        assert_eq!(table.meta.as_ref().unwrap().component, Some(Component::Primary));
    }

    #[test]
    fn spin_only_rows_reproduce_the_observed_remnant_mass() {
        let samples = vec![binary(30.0, 20.0, 0.95, 0.68), binary(12.0, 4.0, 0.97, 0.7), binary(40.0, 35.0, 0.94, 0.2)];
        let p = posterior_in(MatchMode::SpinOnly, &samples, &[80.0, 25.0], &[0.69, 0.69]);

        let order: Vec<(usize, usize)> = p.rows().iter().map(|r| (r.draw_index, r.prior_index)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        for row in p.rows() {
            let s = &row.sample;
            assert_eq!(s.m_f, row.observed.mass);
            assert!(((s.m_1 + s.m_2) * s.m_ret - row.observed.mass).abs() < 1e-9);
            assert!((s.m_1 / s.m_2 - samples[row.prior_index].q).abs() < 1e-12);
        }
        assert_eq!(p.match_mode(), MatchMode::SpinOnly);
        assert_eq!(p.to_table().unwrap().meta.unwrap().match_mode, Some(MatchMode::SpinOnly));
    }

    #[test]
    fn foreign_match_results_are_rejected() {
        let samples = vec![sample(30.0, 50.5, 0.5)];
        let tol = Tolerances::default();
        let bigger = vec![sample(30.0, 80.0, 0.1), sample(31.0, 50.2, 0.5)];
        let matches = match_observations(&RemnantIndex::build(&bigger), &[50.0], &[0.5], &tol, MatchMode::Window).unwrap();
        assert_eq!(matches.per_draw, vec![vec![1]]);

        let err = Posterior::from_matches(&samples, &[50.0], &[0.5], matches.clone(), tol, MatchMode::Window, Component::Primary)
            .unwrap_err();
        assert!(matches!(err, AppError::Input(_)));

        let err = Posterior::from_matches(&bigger, &[50.0, 51.0], &[0.5, 0.5], matches, tol, MatchMode::Window, Component::Primary)
            .unwrap_err();
        assert!(err.to_string().contains("2 were observed"), "{err}");
    }
}
