//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - embedded in prior configuration files
//! - stored as metadata next to generated prior tables
//! - used as CLI values through `clap::ValueEnum`

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Speed of light in km/s. Kick vectors from remnant models are in units of c.
pub const SPEED_OF_LIGHT: f64 = 299_792.458;

/// A closed interval `[low, high]` over one physical quantity.
///
/// Units follow the field the domain is attached to: solar masses for masses,
/// dimensionless for spins and mass ratios, radians for angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDomain")]
pub struct Domain {
    low: f64,
    high: f64,
}

#[derive(Deserialize)]
struct RawDomain {
    low: f64,
    high: f64,
}

impl TryFrom<RawDomain> for Domain {
    type Error = AppError;

    fn try_from(raw: RawDomain) -> Result<Self, Self::Error> {
        Domain::new(raw.low, raw.high)
    }
}

impl Domain {
    pub fn new(low: f64, high: f64) -> Result<Self, AppError> {
        if !(low.is_finite() && high.is_finite()) {
            return Err(AppError::config(format!(
                "Domain bounds must be finite (got [{low}, {high}])."
            )));
        }
        if low > high {
            return Err(AppError::config(format!(
                "Domain lower bound exceeds upper bound (got [{low}, {high}])."
            )));
        }
        Ok(Self { low, high })
    }

    /// A degenerate domain containing a single value.
    pub fn point(value: f64) -> Result<Self, AppError> {
        Self::new(value, value)
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Inclusive membership test.
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    /// Whether `self` lies entirely inside `outer`.
    pub fn is_within(&self, outer: &Domain) -> bool {
        outer.low <= self.low && self.high <= outer.high
    }

    /// Draw uniformly from the interval. A degenerate interval always yields `low`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.low == self.high {
            return self.low;
        }
        Uniform::new_inclusive(self.low, self.high).sample(rng)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// Remnant fits models known to the crate.
///
/// The names match the surrogate models published with `surfinBH`; the crate
/// ships closed-form stand-ins with the same validity ranges (see
/// [`crate::models::PhenomRemnant`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Fits {
    /// Non-precessing binaries, mass ratio <= 8, aligned spins <= 0.8.
    #[serde(rename = "NRSur3dq8Remnant")]
    #[value(name = "NRSur3dq8Remnant")]
    NrSur3dq8Remnant,
    /// Precessing binaries, mass ratio <= 4, generic spins <= 0.8.
    #[serde(rename = "NRSur7dq4Remnant")]
    #[value(name = "NRSur7dq4Remnant")]
    NrSur7dq4Remnant,
    /// Precessing binaries, mass ratio <= 2, generic spins <= 0.8.
    #[serde(rename = "surfinBH7dq2")]
    #[value(name = "surfinBH7dq2")]
    SurfinBh7dq2,
}

/// Parameter ranges a fits model supports.
///
/// Inputs inside `training` are interpolated; inputs between `training` and
/// `hard` are extrapolated (still evaluated, flagged); anything beyond `hard`
/// is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitsRange {
    pub training_mass_ratio: f64,
    pub training_spin: f64,
    pub hard_mass_ratio: f64,
    pub hard_spin: f64,
    pub aligned_only: bool,
}

impl Fits {
    pub const ALL: [Fits; 3] = [Fits::NrSur3dq8Remnant, Fits::NrSur7dq4Remnant, Fits::SurfinBh7dq2];

    pub fn name(self) -> &'static str {
        match self {
            Fits::NrSur3dq8Remnant => "NRSur3dq8Remnant",
            Fits::NrSur7dq4Remnant => "NRSur7dq4Remnant",
            Fits::SurfinBh7dq2 => "surfinBH7dq2",
        }
    }

    pub fn range(self) -> FitsRange {
        match self {
            Fits::NrSur3dq8Remnant => FitsRange {
                training_mass_ratio: 8.0,
                training_spin: 0.8,
                hard_mass_ratio: 10.0,
                hard_spin: 1.0,
                aligned_only: true,
            },
            Fits::NrSur7dq4Remnant => FitsRange {
                training_mass_ratio: 4.0,
                training_spin: 0.8,
                hard_mass_ratio: 6.0,
                hard_spin: 1.0,
                aligned_only: false,
            },
            Fits::SurfinBh7dq2 => FitsRange {
                training_mass_ratio: 2.0,
                training_spin: 0.8,
                hard_mass_ratio: 4.0,
                hard_spin: 1.0,
                aligned_only: false,
            },
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Fits::NrSur3dq8Remnant => "non-precessing BHs with mass ratio <= 8, anti-/aligned spin <= 0.8",
            Fits::NrSur7dq4Remnant => "precessing BHs with mass ratio <= 4, generic spin <= 0.8",
            Fits::SurfinBh7dq2 => "precessing BHs with mass ratio <= 2, generic spin <= 0.8",
        }
    }
}

impl fmt::Display for Fits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fits {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fits::ALL
            .into_iter()
            .find(|fits| fits.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Fits::ALL.iter().map(|f| f.name()).collect();
                AppError::config(format!(
                    "Unknown fits model '{s}'. Available models are: {}.",
                    names.join(", ")
                ))
            })
    }
}

/// Which component of an observed binary is hypothesised to be a remnant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// The heavier black hole of the observed event.
    #[value(name = "1", alias = "primary")]
    Primary,
    /// The lighter black hole of the observed event.
    #[value(name = "2", alias = "secondary")]
    Secondary,
}

impl Component {
    pub fn index(self) -> usize {
        match self {
            Component::Primary => 1,
            Component::Secondary => 2,
        }
    }

    /// Conventional column holding this component's source-frame mass in
    /// parameter-estimation sample releases.
    pub fn mass_column(self) -> String {
        format!("mass_{}_source", self.index())
    }

    /// Conventional column holding this component's dimensionless spin magnitude.
    pub fn spin_column(self) -> String {
        format!("a_{}", self.index())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Primary => f.write_str("primary"),
            Component::Secondary => f.write_str("secondary"),
        }
    }
}

/// Full polar range for spin tilts.
pub fn full_polar() -> Domain {
    Domain { low: 0.0, high: PI }
}

/// Full azimuthal range for spin orientations.
pub fn full_azimuth() -> Domain {
    Domain {
        low: 0.0,
        high: 2.0 * PI,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_rejects_inverted_bounds() {
        let err = Domain::new(2.0, 1.0).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(Domain::new(f64::NAN, 1.0).is_err());
        assert!(Domain::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn domain_accepts_degenerate_interval() {
        let d = Domain::point(3.0).unwrap();
        assert!(d.contains(3.0));
        assert_eq!(d.width(), 0.0);
    }

    #[test]
    fn draws_cover_the_interval() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let d = Domain::new(5.0, 65.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let draws: Vec<f64> = (0..2000).map(|_| d.draw(&mut rng)).collect();
        assert!(draws.iter().all(|&v| d.contains(v)));
        let below_mid = draws.iter().filter(|&&v| v < 35.0).count();
        assert!((800..1200).contains(&below_mid), "below_mid={below_mid}");

        let point = Domain::point(2.5).unwrap();
        assert_eq!(point.draw(&mut rng), 2.5);
    }

    #[test]
    fn domain_deserialization_validates() {
        let ok: Domain = serde_json::from_str(r#"{"low": 0.0, "high": 1.0}"#).unwrap();
        assert_eq!(ok.high(), 1.0);
        let bad: Result<Domain, _> = serde_json::from_str(r#"{"low": 5.0, "high": 1.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn fits_parse_by_surrogate_name() {
        assert_eq!("NRSur7dq4Remnant".parse::<Fits>().unwrap(), Fits::NrSur7dq4Remnant);
        assert_eq!("surfinbh7dq2".parse::<Fits>().unwrap(), Fits::SurfinBh7dq2);
        let err = "NRHybSur".parse::<Fits>().unwrap_err();
        assert!(err.to_string().contains("NRSur3dq8Remnant"));
    }

    #[test]
    fn fits_serialize_with_surrogate_names() {
        let json = serde_json::to_string(&Fits::NrSur3dq8Remnant).unwrap();
        assert_eq!(json, "\"NRSur3dq8Remnant\"");
    }

    #[test]
    fn component_columns() {
        assert_eq!(Component::Primary.mass_column(), "mass_1_source");
        assert_eq!(Component::Secondary.spin_column(), "a_2");
    }
}
