//! Process-wide model handles.
//!
//! Each fits model is built at most once per process, on first use, and shared
//! read-only afterwards.

use std::sync::OnceLock;

use crate::domain::Fits;
use crate::models::phenom::PhenomRemnant;
use crate::models::remnant::RemnantModel;

static NRSUR3DQ8: OnceLock<PhenomRemnant> = OnceLock::new();
static NRSUR7DQ4: OnceLock<PhenomRemnant> = OnceLock::new();
static SURFINBH7DQ2: OnceLock<PhenomRemnant> = OnceLock::new();

impl Fits {
    /// Shared remnant model for this fits variant.
    pub fn load(self) -> &'static dyn RemnantModel {
        let cell = match self {
            Fits::NrSur3dq8Remnant => &NRSUR3DQ8,
            Fits::NrSur7dq4Remnant => &NRSUR7DQ4,
            Fits::SurfinBh7dq2 => &SURFINBH7DQ2,
        };
        cell.get_or_init(|| {
            tracing::debug!(fits = %self, "initialising remnant model");
            PhenomRemnant::new(self)
        })
    }
}
