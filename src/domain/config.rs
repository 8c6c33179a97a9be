//! Prior configuration.
//!
//! `PriorConfigSpec` is the plain record users write (in code or in a JSON
//! file). `PriorConfig` is the validated, immutable form every other component
//! consumes; holding one is proof that all invariants were checked.

use std::f64::consts::PI;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::domain::types::{Domain, Fits};
use crate::error::AppError;

/// Raw prior configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorConfigSpec {
    /// Number of binaries to draw (before evaluator drops).
    pub n_samples: usize,
    /// Remnant fits model.
    pub fits: Fits,

    /// Spins constrained to the orbital angular momentum axis.
    pub is_spin_aligned: bool,
    /// Aligned spins only point along +L (requires `is_spin_aligned`).
    pub is_only_up_aligned_spin: bool,
    /// Draw `q` uniformly and derive the secondary mass from the primary.
    pub is_uniform_in_mass_ratio: bool,
    /// Draw component masses from the Mahapatra et al. (2022) mass function.
    pub is_mahapatra_mass_func: bool,
    /// Relabel the two mass draws so the heavier one is the primary.
    #[serde(default = "default_true")]
    pub is_masses_swappable: bool,

    /// Primary mass (solar masses).
    pub m_1: Domain,
    /// Secondary mass (solar masses).
    pub m_2: Domain,
    /// Mass ratio `q = m_1 / m_2`.
    pub mass_ratio: Domain,

    /// Spin magnitudes (dimensionless).
    pub a_1: Domain,
    pub a_2: Domain,

    /// Polar spin angles (radians). Only used for precessing spins.
    pub theta_1: Domain,
    pub theta_2: Domain,
    /// Azimuthal spin angles (radians). Only used for precessing spins.
    pub phi_1: Domain,
    pub phi_2: Domain,
}

fn default_true() -> bool {
    true
}

/// Validated prior configuration.
///
/// Dereferences to the underlying [`PriorConfigSpec`] for read-only field access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriorConfigSpec", into = "PriorConfigSpec")]
pub struct PriorConfig {
    spec: PriorConfigSpec,
}

impl PriorConfig {
    pub fn new(spec: PriorConfigSpec) -> Result<Self, AppError> {
        validate(&spec)?;
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &PriorConfigSpec {
        &self.spec
    }

    pub fn into_spec(self) -> PriorConfigSpec {
        self.spec
    }

    /// Same configuration with a different sample count.
    pub fn with_n_samples(&self, n_samples: usize) -> Result<Self, AppError> {
        Self::new(PriorConfigSpec {
            n_samples,
            ..self.spec.clone()
        })
    }
}

impl Deref for PriorConfig {
    type Target = PriorConfigSpec;

    fn deref(&self) -> &Self::Target {
        &self.spec
    }
}

impl TryFrom<PriorConfigSpec> for PriorConfig {
    type Error = AppError;

    fn try_from(spec: PriorConfigSpec) -> Result<Self, Self::Error> {
        Self::new(spec)
    }
}

impl From<PriorConfig> for PriorConfigSpec {
    fn from(config: PriorConfig) -> Self {
        config.spec
    }
}

impl fmt::Display for PriorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.spec;
        let spin_mode = match (s.is_spin_aligned, s.is_only_up_aligned_spin) {
            (true, true) => "aligned (up only)",
            (true, false) => "aligned",
            (false, _) => "precessing",
        };
        let mass_law = if s.is_mahapatra_mass_func { "mahapatra" } else { "uniform" };
        let mass_mode = if s.is_uniform_in_mass_ratio {
            "uniform in q"
        } else {
            "independent masses"
        };
        write!(
            f,
            "n={} fits={} spin={} mass={} ({}) m_1={} m_2={} q={} a_1={} a_2={}",
            s.n_samples, s.fits, spin_mode, mass_law, mass_mode, s.m_1, s.m_2, s.mass_ratio, s.a_1, s.a_2
        )
    }
}

fn validate(spec: &PriorConfigSpec) -> Result<(), AppError> {
    if spec.n_samples == 0 {
        return Err(AppError::config("n_samples must be > 0."));
    }
    if spec.is_only_up_aligned_spin && !spec.is_spin_aligned {
        return Err(AppError::config(
            "is_only_up_aligned_spin requires is_spin_aligned (angle sampling already covers the spin sign).",
        ));
    }
    if spec.fits.range().aligned_only && !spec.is_spin_aligned {
        return Err(AppError::config(format!(
            "Fits model {} only supports aligned spins; set is_spin_aligned or choose a precessing model.",
            spec.fits
        )));
    }

    for (name, d) in [("m_1", &spec.m_1), ("m_2", &spec.m_2)] {
        if d.low() <= 0.0 {
            return Err(AppError::config(format!("Mass domain {name}={d} must be strictly positive.")));
        }
    }
    if spec.mass_ratio.low() <= 0.0 {
        return Err(AppError::config(format!(
            "Mass-ratio domain {} must be strictly positive.",
            spec.mass_ratio
        )));
    }

    let unit_spin = Domain::new(0.0, 1.0)?;
    for (name, d) in [("a_1", &spec.a_1), ("a_2", &spec.a_2)] {
        if !d.is_within(&unit_spin) {
            return Err(AppError::config(format!("Spin domain {name}={d} must lie within [0, 1].")));
        }
    }

    let polar = Domain::new(0.0, PI)?;
    for (name, d) in [("theta_1", &spec.theta_1), ("theta_2", &spec.theta_2)] {
        if !d.is_within(&polar) {
            return Err(AppError::config(format!("Polar angle domain {name}={d} must lie within [0, pi].")));
        }
    }
    let azimuth = Domain::new(0.0, 2.0 * PI)?;
    for (name, d) in [("phi_1", &spec.phi_1), ("phi_2", &spec.phi_2)] {
        if !d.is_within(&azimuth) {
            return Err(AppError::config(format!(
                "Azimuthal angle domain {name}={d} must lie within [0, 2pi]."
            )));
        }
    }

    // The mass-ratio domain must intersect the ratios the mass domains can produce.
    let (q_lo, q_hi) = reachable_mass_ratio(spec);
    if q_lo > q_hi || spec.mass_ratio.high() < q_lo || spec.mass_ratio.low() > q_hi {
        return Err(AppError::config(format!(
            "Mass-ratio domain {} is unreachable from m_1={} and m_2={} (reachable q in [{q_lo:.4}, {q_hi:.4}]).",
            spec.mass_ratio, spec.m_1, spec.m_2
        )));
    }

    Ok(())
}

/// Range of `m_1 / m_2` achievable from the mass domains.
fn reachable_mass_ratio(spec: &PriorConfigSpec) -> (f64, f64) {
    let lo = spec.m_1.low() / spec.m_2.high();
    let hi = spec.m_1.high() / spec.m_2.low();
    if spec.is_masses_swappable && !spec.is_uniform_in_mass_ratio {
        // Relabelled pairs always have m_1 >= m_2.
        (lo.max(1.0), hi)
    } else {
        (lo, hi)
    }
}

/// Aligned-spin configuration shared by unit tests across the crate.
#[cfg(test)]
pub(crate) fn aligned_spec() -> PriorConfigSpec {
    use crate::domain::types::{full_azimuth, full_polar};

    PriorConfigSpec {
        n_samples: 1000,
        fits: Fits::NrSur3dq8Remnant,
        is_spin_aligned: true,
        is_only_up_aligned_spin: false,
        is_uniform_in_mass_ratio: false,
        is_mahapatra_mass_func: false,
        is_masses_swappable: true,
        m_1: Domain::new(5.0, 65.0).unwrap(),
        m_2: Domain::new(5.0, 65.0).unwrap(),
        mass_ratio: Domain::new(1.0, 6.0).unwrap(),
        a_1: Domain::new(0.0, 1.0).unwrap(),
        a_2: Domain::new(0.0, 1.0).unwrap(),
        theta_1: full_polar(),
        theta_2: full_polar(),
        phi_1: full_azimuth(),
        phi_2: full_azimuth(),
    }
}
