//! Forward-model prior: a table of progenitor binaries with their remnants.
//!
//! A `Prior` is immutable once built apart from its matching tolerances and
//! match mode.
//! Every row is fully populated; rows the remnant model could not evaluate
//! are dropped during generation and accounted for in the
//! [`GenerationReport`].

pub mod generator;

use std::path::Path;

pub use generator::*;

use crate::data::{RemnantPool, Sample, SampleColumn};
use crate::domain::{Component, PriorConfig};
use crate::error::AppError;
use crate::infer::{MatchMode, Posterior, RemnantIndex, Tolerances, match_observations};
use crate::io::{Column, Table, TableFormat, TableKind, TableMeta, read_table, write_table};

#[derive(Debug, Clone, PartialEq)]
pub struct Prior {
    samples: Vec<Sample>,
    config: Option<PriorConfig>,
    tolerances: Tolerances,
    match_mode: MatchMode,
    index: RemnantIndex,
    report: Option<GenerationReport>,
}

impl Prior {
    /// Generate a prior with the default seed and all available workers.
    pub fn generate(config: &PriorConfig) -> Result<Self, AppError> {
        PriorGenerator::new().generate(config)
    }

    /// Wrap already-evaluated rows, e.g. from an external pipeline.
    pub fn from_samples(samples: Vec<Sample>, config: Option<PriorConfig>) -> Result<Self, AppError> {
        Self::from_parts(samples, config, None)
    }

    pub(crate) fn from_parts(
        samples: Vec<Sample>,
        config: Option<PriorConfig>,
        report: Option<GenerationReport>,
    ) -> Result<Self, AppError> {
        if let Some((row, _)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.values().iter().any(|v| !v.is_finite()))
        {
            return Err(AppError::input(format!("Prior row {row} has a non-finite value.")));
        }
        let index = RemnantIndex::build(&samples);
        Ok(Self {
            samples,
            config,
            tolerances: Tolerances::default(),
            match_mode: MatchMode::default(),
            index,
            report,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Configuration the prior was generated from; `None` when loaded from CSV.
    pub fn config(&self) -> Option<&PriorConfig> {
        self.config.as_ref()
    }

    pub fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn report(&self) -> Option<&GenerationReport> {
        self.report.as_ref()
    }

    pub fn column(&self, column: SampleColumn) -> Vec<f64> {
        self.samples.iter().map(|s| s.get(column)).collect()
    }

    /// Replace the matching tolerances. The previous values stay on error.
    pub fn update_tolerances(&mut self, mass: f64, spin: f64) -> Result<(), AppError> {
        self.tolerances = Tolerances::new(mass, spin)?;
        tracing::debug!(mass, spin, "updated matching tolerances");
        Ok(())
    }

    /// Choose what later `to_posterior` calls match on.
    pub fn set_match_mode(&mut self, mode: MatchMode) {
        self.match_mode = mode;
        tracing::debug!(%mode, "updated match mode");
    }

    /// Pool every row matching each observed `(mass[i], spin[i])` draw.
    pub fn to_posterior(&self, mass: &[f64], spin: &[f64], component: Component) -> Result<Posterior, AppError> {
        let matches = match_observations(&self.index, mass, spin, &self.tolerances, self.match_mode)?;
        Posterior::from_matches(
            &self.samples,
            mass,
            spin,
            matches,
            self.tolerances,
            self.match_mode,
            component,
        )
    }

    /// Remnant masses and spin magnitudes, for seeding a next generation.
    pub fn remnant_pool(&self) -> Result<RemnantPool, AppError> {
        RemnantPool::new(self.column(SampleColumn::MF), self.column(SampleColumn::AF))
    }

    pub fn to_table(&self) -> Result<Table, AppError> {
        let columns = SampleColumn::ALL
            .iter()
            .map(|&c| Column {
                name: c.name().to_string(),
                values: self.column(c),
            })
            .collect();
        let mut meta = TableMeta::new(TableKind::Prior);
        meta.config = self.config.clone();
        meta.generation = self.report.clone();
        meta.tolerances = Some(self.tolerances);
        meta.match_mode = Some(self.match_mode);
        Ok(Table::new(columns)?.with_meta(meta))
    }

    /// Rebuild a prior from a table holding every prior column. Extra columns
    /// are ignored.
    pub(crate) fn from_table(table: &Table) -> Result<Self, String> {
        if table.meta.as_ref().is_some_and(|m| m.kind != TableKind::Prior) {
            return Err("table holds a posterior, not a prior".to_string());
        }
        let columns = SampleColumn::ALL
            .iter()
            .map(|&c| table.require(c.name()))
            .collect::<Result<Vec<&[f64]>, String>>()?;
        if table.n_rows() == 0 {
            return Err("prior table has no rows".to_string());
        }

        let samples = (0..table.n_rows())
            .map(|row| {
                let mut values = [0.0; 15];
                for (slot, col) in values.iter_mut().zip(&columns) {
                    *slot = col[row];
                }
                Sample::from_values(&values)
            })
            .collect();

        let meta = table.meta.as_ref();
        let mut prior = Self::from_parts(
            samples,
            meta.and_then(|m| m.config.clone()),
            meta.and_then(|m| m.generation.clone()),
        )
        .map_err(|e| e.to_string())?;
        if let Some(tolerances) = meta.and_then(|m| m.tolerances) {
            prior.tolerances = tolerances;
        }
        if let Some(mode) = meta.and_then(|m| m.match_mode) {
            prior.match_mode = mode;
        }
        Ok(prior)
    }

    /// Write the prior to `path`; the format defaults to the file extension.
    pub fn save(&self, path: &Path, format: Option<TableFormat>) -> Result<(), AppError> {
        let format = TableFormat::resolve(format, path)?;
        if !format.embeds_metadata() {
            tracing::debug!(path = %path.display(), "CSV output drops the prior configuration");
        }
        write_table(path, format, &self.to_table()?)?;
        tracing::info!(path = %path.display(), rows = self.len(), %format, "saved prior");
        Ok(())
    }

    pub fn load(path: &Path, format: Option<TableFormat>) -> Result<Self, AppError> {
        let format = TableFormat::resolve(format, path)?;
        let table = read_table(path, format)?;
        let prior = Self::from_table(&table).map_err(|e| AppError::load(path, e))?;
        tracing::info!(path = %path.display(), rows = prior.len(), %format, "loaded prior");
        Ok(prior)
    }
}
