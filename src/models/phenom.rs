//! Closed-form remnant fits.
//!
//! Three published phenomenological fits are combined:
//!
//! - remnant mass: Barausse, Morozova & Rezzolla (2012), radiated energy as a
//!   function of the symmetric mass ratio and the effective aligned spin
//! - remnant spin: Rezzolla et al. (2008), generic final-spin vector
//! - recoil: Campanelli, Lousto, Zlochower & Merritt (2007), mass-asymmetry,
//!   in-plane and "superkick" terms
//!
//! Conventions inside this module: `q = m_small / m_large <= 1`,
//! `eta = q / (1 + q)^2`, orbital angular momentum along +z.

use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::domain::{Fits, FitsRange, SPEED_OF_LIGHT};
use crate::models::remnant::{Binary, EvaluationFailure, RemnantEstimate, RemnantModel};

// Rezzolla et al. (2008) final-spin coefficients.
const S4: f64 = -0.1229;
const S5: f64 = 0.4537;
const T0: f64 = -2.8904;
const T2: f64 = -3.5171;
const T3: f64 = 2.5763;

// Barausse, Morozova & Rezzolla (2012) radiated-energy coefficients.
const P0: f64 = 0.04827;
const P1: f64 = 0.01707;

// Campanelli et al. (2007) recoil coefficients (km/s).
const KICK_A: f64 = 1.2e4;
const KICK_B: f64 = -0.93;
const KICK_H: f64 = 6.9e3;
const KICK_K: f64 = 6.0e4;
const KICK_XI: f64 = 145.0 * PI / 180.0;

/// Spins with an in-plane magnitude below this are treated as aligned.
const ALIGNED_EPS: f64 = 1e-10;

/// Phenomenological stand-in for one of the named remnant surrogates.
///
/// The formulas are shared; the fits variant only selects the validity range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhenomRemnant {
    fits: Fits,
    range: FitsRange,
}

impl PhenomRemnant {
    pub fn new(fits: Fits) -> Self {
        Self {
            fits,
            range: fits.range(),
        }
    }

    pub fn fits(&self) -> Fits {
        self.fits
    }

    fn check_inputs(
        &self,
        q_inv: f64,
        chi_l: &Vector3<f64>,
        chi_s: &Vector3<f64>,
    ) -> Result<bool, EvaluationFailure> {
        let range = &self.range;
        if q_inv > range.hard_mass_ratio {
            return Err(EvaluationFailure::MassRatioOutOfRange {
                q: q_inv,
                limit: range.hard_mass_ratio,
            });
        }
        let max_spin = chi_l.norm().max(chi_s.norm());
        if max_spin > range.hard_spin {
            return Err(EvaluationFailure::SpinOutOfRange {
                spin: max_spin,
                limit: range.hard_spin,
            });
        }
        if range.aligned_only && (chi_l.xy().norm() > ALIGNED_EPS || chi_s.xy().norm() > ALIGNED_EPS) {
            return Err(EvaluationFailure::UnsupportedSpin);
        }
        Ok(q_inv > range.training_mass_ratio || max_spin > range.training_spin)
    }
}

impl RemnantModel for PhenomRemnant {
    fn name(&self) -> &str {
        self.fits.name()
    }

    fn evaluate(&self, binary: &Binary) -> Result<RemnantEstimate, EvaluationFailure> {
        let (m_l, m_s, chi_l, chi_s) = binary.ordered();
        if !(m_s > 0.0 && m_l.is_finite()) {
            return Err(EvaluationFailure::InvalidMasses {
                m_1: binary.m_1,
                m_2: binary.m_2,
            });
        }
        let extrapolated = self.check_inputs(m_l / m_s, &chi_l, &chi_s)?;

        let q = m_s / m_l;
        let spin = final_spin(q, &chi_l, &chi_s);
        let fraction = 1.0 - radiated_energy(q, &chi_l, &chi_s);
        let kick = recoil(q, &chi_l, &chi_s) / SPEED_OF_LIGHT;

        if !(fraction.is_finite() && spin.iter().all(|v| v.is_finite()) && kick.iter().all(|v| v.is_finite())) {
            return Err(EvaluationFailure::NonFinite);
        }
        let a_f = spin.norm();
        if a_f > 1.0 {
            return Err(EvaluationFailure::UnphysicalSpin { spin: a_f });
        }
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(EvaluationFailure::UnphysicalMass { fraction });
        }

        Ok(RemnantEstimate {
            mass: fraction * binary.total_mass(),
            spin,
            kick,
            extrapolated,
        })
    }
}

fn symmetric_mass_ratio(q: f64) -> f64 {
    q / (1.0 + q).powi(2)
}

/// Final spin vector (Rezzolla et al. 2008).
fn final_spin(q: f64, chi_l: &Vector3<f64>, chi_s: &Vector3<f64>) -> Vector3<f64> {
    let eta = symmetric_mass_ratio(q);
    let q2 = q * q;
    let a1 = chi_l.norm();
    let a2 = chi_s.norm();

    let ell = 2.0 * 3f64.sqrt()
        + T2 * eta
        + T3 * eta * eta
        + S4 / (1.0 + q2).powi(2) * (a1 * a1 + a2 * a2 * q2 * q2 + 2.0 * chi_l.dot(chi_s) * q2)
        + (S5 * eta + T0 + 2.0) / (1.0 + q2) * (chi_l.z + chi_s.z * q2);

    (chi_l + chi_s * q2 + Vector3::z() * (ell * q)) / (1.0 + q).powi(2)
}

/// Radius of the innermost stable circular orbit in units of M (Bardeen et al. 1972).
///
/// Negative `a` is retrograde.
fn isco_radius(a: f64) -> f64 {
    let a = a.clamp(-1.0, 1.0);
    let z1 = 1.0 + (1.0 - a * a).cbrt() * ((1.0 + a).cbrt() + (1.0 - a).cbrt());
    let z2 = (3.0 * a * a + z1 * z1).sqrt();
    3.0 + z2 - a.signum() * ((3.0 - z1) * (3.0 + z1 + 2.0 * z2)).max(0.0).sqrt()
}

/// Fraction of the total mass radiated (Barausse, Morozova & Rezzolla 2012).
fn radiated_energy(q: f64, chi_l: &Vector3<f64>, chi_s: &Vector3<f64>) -> f64 {
    let eta = symmetric_mass_ratio(q);
    let a_tilde = (chi_l.z + q * q * chi_s.z) / (1.0 + q).powi(2);
    let e_isco = (1.0 - 2.0 / (3.0 * isco_radius(a_tilde))).sqrt();
    (1.0 - e_isco) * eta
        + 4.0 * eta * eta * (4.0 * P0 + 16.0 * P1 * a_tilde * (a_tilde + 1.0) + e_isco - 1.0)
}

/// Recoil velocity vector in km/s (Campanelli et al. 2007).
fn recoil(q: f64, chi_l: &Vector3<f64>, chi_s: &Vector3<f64>) -> Vector3<f64> {
    let eta = symmetric_mass_ratio(q);
    let eta2 = eta * eta;

    let v_mass = KICK_A * eta2 * (1.0 - q) / (1.0 + q) * (1.0 + KICK_B * eta);
    let v_perp = KICK_H * eta2 / (1.0 + q) * (chi_l.z - q * chi_s.z);

    let delta_plane = chi_l.xy() - chi_s.xy() * q;
    let magnitude = delta_plane.norm();
    let v_par = if magnitude > 0.0 {
        let angle = delta_plane.y.atan2(delta_plane.x);
        KICK_K * eta2 / (1.0 + q) * magnitude * angle.cos()
    } else {
        0.0
    };

    Vector3::new(v_mass + v_perp * KICK_XI.cos(), v_perp * KICK_XI.sin(), v_par)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(m_1: f64, m_2: f64, chi_1: Vector3<f64>, chi_2: Vector3<f64>) -> Binary {
        Binary { m_1, m_2, chi_1, chi_2 }
    }

    #[test]
    fn equal_mass_nonspinning_matches_known_values() {
        let model = PhenomRemnant::new(Fits::NrSur3dq8Remnant);
        let est = model
            .evaluate(&binary(30.0, 30.0, Vector3::zeros(), Vector3::zeros()))
            .unwrap();
        let fraction = est.mass / 60.0;
        assert!((fraction - 0.9517).abs() < 2e-3, "fraction={fraction}");
        assert!((est.spin_magnitude() - 0.686).abs() < 5e-3, "a_f={}", est.spin_magnitude());
        // Symmetric, nonspinning: no recoil.
        assert!(est.kick_km_s() < 1e-9, "kick={}", est.kick_km_s());
        assert!(!est.extrapolated);
    }

    #[test]
    fn unequal_masses_produce_recoil() {
        let model = PhenomRemnant::new(Fits::NrSur3dq8Remnant);
        let est = model
            .evaluate(&binary(30.0, 10.0, Vector3::zeros(), Vector3::zeros()))
            .unwrap();
        let kick = est.kick_km_s();
        assert!(kick > 50.0 && kick < 300.0, "kick={kick}");
    }

    #[test]
    fn aligned_spins_raise_final_spin() {
        let model = PhenomRemnant::new(Fits::NrSur3dq8Remnant);
        let up = Vector3::new(0.0, 0.0, 0.7);
        let down = Vector3::new(0.0, 0.0, -0.7);
        let a_up = model.evaluate(&binary(30.0, 30.0, up, up)).unwrap().spin_magnitude();
        let a_down = model.evaluate(&binary(30.0, 30.0, down, down)).unwrap().spin_magnitude();
        assert!(a_up > 0.686 && a_up < 1.0, "a_up={a_up}");
        assert!(a_down < 0.686, "a_down={a_down}");
    }

    #[test]
    fn label_order_does_not_matter() {
        let model = PhenomRemnant::new(Fits::NrSur7dq4Remnant);
        let c1 = Vector3::new(0.2, -0.1, 0.4);
        let c2 = Vector3::new(-0.3, 0.3, 0.1);
        let a = model.evaluate(&binary(40.0, 20.0, c1, c2)).unwrap();
        let b = model.evaluate(&binary(20.0, 40.0, c2, c1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn aligned_only_fits_reject_in_plane_spin() {
        let model = PhenomRemnant::new(Fits::NrSur3dq8Remnant);
        let tilted = Vector3::new(0.3, 0.0, 0.3);
        let err = model.evaluate(&binary(30.0, 20.0, tilted, Vector3::zeros())).unwrap_err();
        assert_eq!(err, EvaluationFailure::UnsupportedSpin);

        let precessing = PhenomRemnant::new(Fits::NrSur7dq4Remnant);
        assert!(precessing.evaluate(&binary(30.0, 20.0, tilted, Vector3::zeros())).is_ok());
    }

    #[test]
    fn range_limits_and_extrapolation() {
        let model = PhenomRemnant::new(Fits::SurfinBh7dq2);
        let zero = Vector3::zeros();
        assert!(!model.evaluate(&binary(30.0, 20.0, zero, zero)).unwrap().extrapolated);
        assert!(model.evaluate(&binary(30.0, 10.0, zero, zero)).unwrap().extrapolated);
        let err = model.evaluate(&binary(50.0, 10.0, zero, zero)).unwrap_err();
        assert!(matches!(err, EvaluationFailure::MassRatioOutOfRange { .. }));

        let fast = Vector3::new(0.0, 0.0, 0.9);
        assert!(model.evaluate(&binary(30.0, 20.0, fast, zero)).unwrap().extrapolated);
    }

    #[test]
    fn invalid_masses_fail() {
        let model = PhenomRemnant::new(Fits::NrSur7dq4Remnant);
        let zero = Vector3::zeros();
        assert!(matches!(
            model.evaluate(&binary(30.0, 0.0, zero, zero)),
            Err(EvaluationFailure::InvalidMasses { .. })
        ));
        assert!(model.evaluate(&binary(f64::NAN, 10.0, zero, zero)).is_err());
    }

    #[test]
    fn isco_radius_limits() {
        assert!((isco_radius(0.0) - 6.0).abs() < 1e-12);
        assert!((isco_radius(1.0) - 1.0).abs() < 1e-9);
        assert!((isco_radius(-1.0) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn outputs_stay_physical_over_the_training_range() {
        let model = PhenomRemnant::new(Fits::NrSur7dq4Remnant);
        for i in 0..=8 {
            for j in 0..=8 {
                let q_inv = 1.0 + 3.0 * i as f64 / 8.0;
                let a = j as f64 / 8.0;
                let c1 = Vector3::new(a * 0.6, 0.0, a * 0.8);
                let c2 = Vector3::new(0.0, -a * 0.8, -a * 0.6);
                let est = model.evaluate(&binary(10.0 * q_inv, 10.0, c1, c2)).unwrap();
                let fraction = est.mass / (10.0 * q_inv + 10.0);
                assert!(fraction > 0.85 && fraction < 1.0, "fraction={fraction}");
                assert!(est.spin_magnitude() < 1.0);
            }
        }
    }
}
