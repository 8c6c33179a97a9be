//! Observed posterior samples of a merger's mass and spin.
//!
//! Parameter-estimation releases ship many columns per event; only the mass
//! and spin columns of the component under study are read.

use std::path::Path;

use crate::error::AppError;
use crate::io::TableFormat;
use crate::io::read_table;

#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSamples {
    pub mass: Vec<f64>,
    pub spin: Vec<f64>,
}

impl ObservedSamples {
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }
}

pub fn read_observed(
    path: &Path,
    format: Option<TableFormat>,
    mass_column: &str,
    spin_column: &str,
) -> Result<ObservedSamples, AppError> {
    let format = TableFormat::resolve(format, path)?;
    let table = read_table(path, format)?;
    let mass = table.require(mass_column).map_err(|e| AppError::load(path, e))?;
    let spin = table.require(spin_column).map_err(|e| AppError::load(path, e))?;
    if let Some(bad) = mass.iter().chain(spin).find(|v| !v.is_finite()) {
        return Err(AppError::load(path, format!("non-finite observed value {bad}")));
    }
    Ok(ObservedSamples {
        mass: mass.to_vec(),
        spin: spin.to_vec(),
    })
}
