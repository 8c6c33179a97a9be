//! Named prior configurations.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::config::{PriorConfig, PriorConfigSpec};
use crate::domain::types::{Domain, Fits, full_azimuth, full_polar};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Preset {
    /// Alias of `tiny_aligned_spin`.
    Default,
    /// Small aligned-spin prior for quick checks.
    TinyAlignedSpin,
    /// Aligned spins over a wide mass range.
    AgnosticAlignedSpin,
    /// Precessing spins over a wide mass range.
    AgnosticPrecessingSpin,
    /// First-generation aligned-spin progenitors.
    AlignedSpin,
    /// First-generation aligned-spin progenitors, spins along +L only.
    PositivelyAlignedSpin,
    /// First-generation precessing progenitors.
    PrecessingSpin,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Default,
        Preset::TinyAlignedSpin,
        Preset::AgnosticAlignedSpin,
        Preset::AgnosticPrecessingSpin,
        Preset::AlignedSpin,
        Preset::PositivelyAlignedSpin,
        Preset::PrecessingSpin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::TinyAlignedSpin => "tiny_aligned_spin",
            Preset::AgnosticAlignedSpin => "agnostic_aligned_spin",
            Preset::AgnosticPrecessingSpin => "agnostic_precessing_spin",
            Preset::AlignedSpin => "aligned_spin",
            Preset::PositivelyAlignedSpin => "positively_aligned_spin",
            Preset::PrecessingSpin => "precessing_spin",
        }
    }

    /// Build the validated configuration for this preset.
    pub fn config(self) -> Result<PriorConfig, AppError> {
        PriorConfig::new(self.spec()?)
    }

    fn spec(self) -> Result<PriorConfigSpec, AppError> {
        let unit = Domain::new(0.0, 1.0)?;
        let base = PriorConfigSpec {
            n_samples: 2_000_000,
            fits: Fits::NrSur3dq8Remnant,
            is_spin_aligned: true,
            is_only_up_aligned_spin: false,
            is_uniform_in_mass_ratio: false,
            is_mahapatra_mass_func: false,
            is_masses_swappable: true,
            m_1: Domain::new(5.0, 65.0)?,
            m_2: Domain::new(5.0, 65.0)?,
            mass_ratio: Domain::new(1.0, 6.0)?,
            a_1: unit,
            a_2: unit,
            theta_1: full_polar(),
            theta_2: full_polar(),
            phi_1: full_azimuth(),
            phi_2: full_azimuth(),
        };

        let wide_mass = Domain::new(5.0, 200.0)?;
        let spec = match self {
            Preset::Default | Preset::TinyAlignedSpin => PriorConfigSpec {
                n_samples: 5_000,
                m_1: wide_mass,
                m_2: wide_mass,
                ..base
            },
            Preset::AgnosticAlignedSpin => PriorConfigSpec {
                n_samples: 1_000_000,
                m_1: wide_mass,
                m_2: wide_mass,
                ..base
            },
            Preset::AgnosticPrecessingSpin => PriorConfigSpec {
                n_samples: 1_000_000,
                fits: Fits::NrSur7dq4Remnant,
                is_spin_aligned: false,
                m_1: wide_mass,
                m_2: wide_mass,
                ..base
            },
            Preset::AlignedSpin => base,
            Preset::PositivelyAlignedSpin => PriorConfigSpec {
                is_only_up_aligned_spin: true,
                ..base
            },
            Preset::PrecessingSpin => PriorConfigSpec {
                fits: Fits::NrSur7dq4Remnant,
                is_spin_aligned: false,
                ..base
            },
        };
        Ok(spec)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s.trim())
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
                AppError::config(format!(
                    "Prior preset '{s}' not found. Available presets are: {}.",
                    names.join(", ")
                ))
            })
    }
}
