//! Remnant model interface.
//!
//! A remnant model maps a binary (component masses and spin vectors) to the
//! properties of the black hole left after merger. The prior generator only
//! talks to this trait, so any fit or surrogate can be plugged in.

use nalgebra::Vector3;

use crate::domain::SPEED_OF_LIGHT;

/// A binary black hole at the reference epoch.
///
/// Spins are dimensionless vectors in the frame where the orbital angular
/// momentum points along +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binary {
    pub m_1: f64,
    pub m_2: f64,
    pub chi_1: Vector3<f64>,
    pub chi_2: Vector3<f64>,
}

impl Binary {
    pub fn total_mass(&self) -> f64 {
        self.m_1 + self.m_2
    }

    /// Heavier component first: `(m_large, m_small, chi_large, chi_small)`.
    pub fn ordered(&self) -> (f64, f64, Vector3<f64>, Vector3<f64>) {
        if self.m_1 >= self.m_2 {
            (self.m_1, self.m_2, self.chi_1, self.chi_2)
        } else {
            (self.m_2, self.m_1, self.chi_2, self.chi_1)
        }
    }
}

/// Model output for one binary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemnantEstimate {
    /// Remnant mass in solar masses.
    pub mass: f64,
    /// Dimensionless remnant spin vector.
    pub spin: Vector3<f64>,
    /// Recoil velocity in units of c.
    pub kick: Vector3<f64>,
    /// Inputs were outside the model's training range.
    pub extrapolated: bool,
}

impl RemnantEstimate {
    pub fn spin_magnitude(&self) -> f64 {
        self.spin.norm()
    }

    pub fn kick_km_s(&self) -> f64 {
        self.kick.norm() * SPEED_OF_LIGHT
    }
}

/// Why a single binary could not be evaluated. The row is dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationFailure {
    #[error("component masses must be positive and finite (m_1={m_1}, m_2={m_2})")]
    InvalidMasses { m_1: f64, m_2: f64 },

    #[error("mass ratio {q:.3} exceeds model limit {limit}")]
    MassRatioOutOfRange { q: f64, limit: f64 },

    #[error("spin magnitude {spin:.3} exceeds model limit {limit}")]
    SpinOutOfRange { spin: f64, limit: f64 },

    #[error("model only supports spins aligned with the orbital angular momentum")]
    UnsupportedSpin,

    #[error("model produced a non-finite output")]
    NonFinite,

    #[error("unphysical remnant spin {spin:.4}")]
    UnphysicalSpin { spin: f64 },

    #[error("unphysical retained mass fraction {fraction:.4}")]
    UnphysicalMass { fraction: f64 },
}

impl EvaluationFailure {
    /// Stable key used when tallying dropped rows.
    pub fn reason(&self) -> &'static str {
        match self {
            EvaluationFailure::InvalidMasses { .. } => "invalid_masses",
            EvaluationFailure::MassRatioOutOfRange { .. } => "mass_ratio_out_of_range",
            EvaluationFailure::SpinOutOfRange { .. } => "spin_out_of_range",
            EvaluationFailure::UnsupportedSpin => "unsupported_spin",
            EvaluationFailure::NonFinite => "non_finite",
            EvaluationFailure::UnphysicalSpin { .. } => "unphysical_spin",
            EvaluationFailure::UnphysicalMass { .. } => "unphysical_mass",
        }
    }
}

/// Remnant-property model.
///
/// Implementations must be pure: the same binary always yields the same
/// result, and evaluation may run concurrently from many threads.
pub trait RemnantModel: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, binary: &Binary) -> Result<RemnantEstimate, EvaluationFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_puts_heavier_first() {
        let b = Binary {
            m_1: 10.0,
            m_2: 30.0,
            chi_1: Vector3::new(0.0, 0.0, 0.1),
            chi_2: Vector3::new(0.0, 0.0, 0.9),
        };
        let (ml, ms, cl, cs) = b.ordered();
        assert_eq!((ml, ms), (30.0, 10.0));
        assert_eq!(cl.z, 0.9);
        assert_eq!(cs.z, 0.1);
        assert_eq!(b.total_mass(), 40.0);
    }

    #[test]
    fn kick_converts_to_km_s() {
        let est = RemnantEstimate {
            mass: 1.0,
            spin: Vector3::zeros(),
            kick: Vector3::new(1e-3, 0.0, 0.0),
            extrapolated: false,
        };
        assert!((est.kick_km_s() - 299.792458).abs() < 1e-9);
    }

    #[test]
    fn failure_reasons_are_distinct() {
        let reasons = [
            EvaluationFailure::InvalidMasses { m_1: 0.0, m_2: 1.0 }.reason(),
            EvaluationFailure::MassRatioOutOfRange { q: 12.0, limit: 10.0 }.reason(),
            EvaluationFailure::SpinOutOfRange { spin: 1.1, limit: 1.0 }.reason(),
            EvaluationFailure::UnsupportedSpin.reason(),
            EvaluationFailure::NonFinite.reason(),
            EvaluationFailure::UnphysicalSpin { spin: 1.2 }.reason(),
            EvaluationFailure::UnphysicalMass { fraction: 1.2 }.reason(),
        ];
        let mut unique = reasons.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), reasons.len());
    }
}
