//! Prior sample rows.
//!
//! A [`Sample`] is one progenitor binary together with the remnant it produces.
//! The column set and order are fixed; every table format writes exactly
//! [`SampleColumn::ALL`] in this order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::sampler::ProgenitorDraw;
use crate::error::AppError;
use crate::models::RemnantEstimate;

/// One row of a prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Primary mass (solar masses).
    pub m_1: f64,
    /// Secondary mass (solar masses).
    pub m_2: f64,
    /// Mass ratio `m_1 / m_2`.
    pub q: f64,
    pub a_1: f64,
    pub a_2: f64,
    pub theta_1: f64,
    pub phi_1: f64,
    pub theta_2: f64,
    pub phi_2: f64,
    /// Retained mass fraction `m_f / (m_1 + m_2)`.
    pub m_ret: f64,
    /// Remnant mass (solar masses).
    pub m_f: f64,
    /// Remnant spin magnitude.
    pub a_f: f64,
    /// Kick magnitude (km/s).
    pub k_f: f64,
    /// Mass-weighted spin component along the orbital angular momentum.
    pub a_eff: f64,
    /// Effective precession spin.
    pub a_prec: f64,
}

/// Columns of the prior table, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleColumn {
    M1,
    M2,
    Q,
    A1,
    A2,
    Theta1,
    Phi1,
    Theta2,
    Phi2,
    MRet,
    MF,
    AF,
    KF,
    AEff,
    APrec,
}

impl SampleColumn {
    pub const ALL: [SampleColumn; 15] = [
        SampleColumn::M1,
        SampleColumn::M2,
        SampleColumn::Q,
        SampleColumn::A1,
        SampleColumn::A2,
        SampleColumn::Theta1,
        SampleColumn::Phi1,
        SampleColumn::Theta2,
        SampleColumn::Phi2,
        SampleColumn::MRet,
        SampleColumn::MF,
        SampleColumn::AF,
        SampleColumn::KF,
        SampleColumn::AEff,
        SampleColumn::APrec,
    ];

    /// Progenitor parameters summarised by posteriors.
    pub const PROGENITOR: [SampleColumn; 8] = [
        SampleColumn::M1,
        SampleColumn::M2,
        SampleColumn::Q,
        SampleColumn::A1,
        SampleColumn::A2,
        SampleColumn::AEff,
        SampleColumn::APrec,
        SampleColumn::KF,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SampleColumn::M1 => "m_1",
            SampleColumn::M2 => "m_2",
            SampleColumn::Q => "q",
            SampleColumn::A1 => "a_1",
            SampleColumn::A2 => "a_2",
            SampleColumn::Theta1 => "theta_1",
            SampleColumn::Phi1 => "phi_1",
            SampleColumn::Theta2 => "theta_2",
            SampleColumn::Phi2 => "phi_2",
            SampleColumn::MRet => "m_ret",
            SampleColumn::MF => "m_f",
            SampleColumn::AF => "a_f",
            SampleColumn::KF => "k_f",
            SampleColumn::AEff => "a_eff",
            SampleColumn::APrec => "a_prec",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.name()).collect()
    }
}

impl fmt::Display for SampleColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleColumn {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleColumn::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| AppError::input(format!("Unknown prior column '{s}'.")))
    }
}

impl Sample {
    /// Combine a progenitor draw with its evaluated remnant.
    pub fn from_evaluation(draw: &ProgenitorDraw, remnant: &RemnantEstimate) -> Self {
        let total = draw.m_1 + draw.m_2;
        let chi_1 = draw.chi_1();
        let chi_2 = draw.chi_2();

        Self {
            m_1: draw.m_1,
            m_2: draw.m_2,
            q: draw.m_1 / draw.m_2,
            a_1: draw.a_1,
            a_2: draw.a_2,
            theta_1: draw.theta_1,
            phi_1: draw.phi_1,
            theta_2: draw.theta_2,
            phi_2: draw.phi_2,
            m_ret: remnant.mass / total,
            m_f: remnant.mass,
            a_f: remnant.spin_magnitude(),
            k_f: remnant.kick_km_s(),
            a_eff: (draw.m_1 * chi_1.z + draw.m_2 * chi_2.z) / total,
            a_prec: effective_precession_spin(draw.m_1, draw.m_2, chi_1.xy().norm(), chi_2.xy().norm()),
        }
    }

    pub fn get(&self, column: SampleColumn) -> f64 {
        match column {
            SampleColumn::M1 => self.m_1,
            SampleColumn::M2 => self.m_2,
            SampleColumn::Q => self.q,
            SampleColumn::A1 => self.a_1,
            SampleColumn::A2 => self.a_2,
            SampleColumn::Theta1 => self.theta_1,
            SampleColumn::Phi1 => self.phi_1,
            SampleColumn::Theta2 => self.theta_2,
            SampleColumn::Phi2 => self.phi_2,
            SampleColumn::MRet => self.m_ret,
            SampleColumn::MF => self.m_f,
            SampleColumn::AF => self.a_f,
            SampleColumn::KF => self.k_f,
            SampleColumn::AEff => self.a_eff,
            SampleColumn::APrec => self.a_prec,
        }
    }

    /// The same binary scaled so its remnant mass is `m_f`.
    ///
    /// Mass ratio, retained fraction, spins and kick are scale-free and stay
    /// unchanged. `None` when the row has no positive retained mass.
    pub fn rescaled_to(&self, m_f: f64) -> Option<Self> {
        if !(self.m_ret > 0.0 && self.q > 0.0) {
            return None;
        }
        let total = m_f / self.m_ret;
        let rescaled = Self {
            m_1: total * self.q / (1.0 + self.q),
            m_2: total / (1.0 + self.q),
            m_f,
            ..*self
        };
        (rescaled.m_1.is_finite() && rescaled.m_2.is_finite()).then_some(rescaled)
    }

    /// Values in [`SampleColumn::ALL`] order.
    pub fn values(&self) -> [f64; 15] {
        SampleColumn::ALL.map(|c| self.get(c))
    }

    pub fn from_values(v: &[f64; 15]) -> Self {
        Self {
            m_1: v[0],
            m_2: v[1],
            q: v[2],
            a_1: v[3],
            a_2: v[4],
            theta_1: v[5],
            phi_1: v[6],
            theta_2: v[7],
            phi_2: v[8],
            m_ret: v[9],
            m_f: v[10],
            a_f: v[11],
            k_f: v[12],
            a_eff: v[13],
            a_prec: v[14],
        }
    }
}

/// Effective precession spin (Schmidt et al. 2015).
///
/// `a_perp_1` / `a_perp_2` are the in-plane spin magnitudes of the bodies
/// labelled 1 and 2; the heavier body takes the unscaled term.
pub fn effective_precession_spin(m_1: f64, m_2: f64, a_perp_1: f64, a_perp_2: f64) -> f64 {
    let (a_large, a_small, q) = if m_1 >= m_2 {
        (a_perp_1, a_perp_2, m_2 / m_1)
    } else {
        (a_perp_2, a_perp_1, m_1 / m_2)
    };
    a_large.max((4.0 * q + 3.0) / (3.0 * q + 4.0) * q * a_small)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_fixed() {
        assert_eq!(
            SampleColumn::names(),
            vec![
                "m_1", "m_2", "q", "a_1", "a_2", "theta_1", "phi_1", "theta_2", "phi_2", "m_ret", "m_f", "a_f",
                "k_f", "a_eff", "a_prec"
            ]
        );
        for (i, c) in SampleColumn::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
            assert_eq!(c.name().parse::<SampleColumn>().unwrap(), *c);
        }
    }

    #[test]
    fn values_follow_column_order() {
        let v: [f64; 15] = std::array::from_fn(|i| i as f64 + 0.5);
        let s = Sample::from_values(&v);
        assert_eq!(s.values(), v);
        assert_eq!(s.get(SampleColumn::MF), 10.5);
        assert_eq!(s.get(SampleColumn::APrec), 14.5);
    }

    #[test]
    fn rescaling_reproduces_the_requested_remnant_mass() {
        let mut v = [0.0; 15];
        v[0] = 30.0;
        v[1] = 20.0;
        v[2] = 1.5;
        v[9] = 0.95;
        v[10] = 47.5;
        v[11] = 0.68;
        let s = Sample::from_values(&v).rescaled_to(60.0).unwrap();
        assert_eq!(s.m_f, 60.0);
        assert!(((s.m_1 + s.m_2) * s.m_ret - 60.0).abs() < 1e-9);
        assert!((s.m_1 / s.m_2 - 1.5).abs() < 1e-12);
        assert_eq!((s.a_f, s.m_ret), (0.68, 0.95));

        v[9] = 0.0;
        assert!(Sample::from_values(&v).rescaled_to(60.0).is_none());
    }

    #[test]
    fn precession_spin_for_equal_masses_is_the_larger_in_plane_spin() {
        assert!((effective_precession_spin(10.0, 10.0, 0.3, 0.5) - 0.5).abs() < 1e-12);
        assert!((effective_precession_spin(10.0, 10.0, 0.6, 0.2) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn precession_spin_scales_secondary_term() {
        // q = 0.5: (4*0.5 + 3) / (3*0.5 + 4) * 0.5 = 5 / 5.5 * 0.5
        let expected = 5.0 / 5.5 * 0.5 * 0.8;
        let got = effective_precession_spin(20.0, 10.0, 0.0, 0.8);
        assert!((got - expected).abs() < 1e-12, "got {got}");
        let swapped = effective_precession_spin(10.0, 20.0, 0.8, 0.0);
        assert!((swapped - expected).abs() < 1e-12);
    }
}
