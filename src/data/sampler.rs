//! Seeded draws of progenitor binaries.
//!
//! The sampler turns a [`PriorConfig`] into a stream of [`ProgenitorDraw`]s.
//! All randomness comes from the caller's RNG so a fixed seed reproduces the
//! same draws bit-for-bit.

use std::f64::consts::PI;

use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

use crate::data::mahapatra::MahapatraMassFunction;
use crate::domain::{Component, Domain, PriorConfig};
use crate::error::AppError;
use crate::math::sph2cart;
use crate::models::Binary;

/// Consecutive rejected draws tolerated before sampling gives up.
pub const MAX_REDRAWS: usize = 100_000;

/// One sampled progenitor binary (before remnant evaluation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgenitorDraw {
    pub m_1: f64,
    pub m_2: f64,
    pub a_1: f64,
    pub a_2: f64,
    pub theta_1: f64,
    pub phi_1: f64,
    pub theta_2: f64,
    pub phi_2: f64,
}

impl ProgenitorDraw {
    pub fn chi_1(&self) -> Vector3<f64> {
        sph2cart(self.a_1, self.theta_1, self.phi_1)
    }

    pub fn chi_2(&self) -> Vector3<f64> {
        sph2cart(self.a_2, self.theta_2, self.phi_2)
    }

    pub fn binary(&self) -> Binary {
        Binary {
            m_1: self.m_1,
            m_2: self.m_2,
            chi_1: self.chi_1(),
            chi_2: self.chi_2(),
        }
    }
}

/// Remnants of an earlier prior, used as a source of higher-generation
/// progenitors.
#[derive(Debug, Clone, PartialEq)]
pub struct RemnantPool {
    mass: Vec<f64>,
    spin: Vec<f64>,
}

impl RemnantPool {
    pub fn new(mass: Vec<f64>, spin: Vec<f64>) -> Result<Self, AppError> {
        if mass.len() != spin.len() {
            return Err(AppError::input(format!(
                "Remnant pool columns differ in length ({} masses, {} spins).",
                mass.len(),
                spin.len()
            )));
        }
        if mass.is_empty() {
            return Err(AppError::input("Remnant pool is empty."));
        }
        Ok(Self { mass, spin })
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let i = rng.gen_range(0..self.mass.len());
        (self.mass[i], self.spin[i])
    }
}

#[derive(Debug, Clone)]
enum MassSource {
    Uniform(Domain),
    Mahapatra(MahapatraMassFunction),
    Pool(RemnantPool),
}

#[derive(Debug, Clone, Copy)]
struct Body {
    mass: f64,
    /// Spin magnitude inherited from an ancestor remnant.
    spin: Option<f64>,
}

impl MassSource {
    fn for_domain(domain: Domain, mahapatra: bool) -> Result<Self, AppError> {
        if mahapatra {
            Ok(MassSource::Mahapatra(MahapatraMassFunction::new(domain)?))
        } else {
            Ok(MassSource::Uniform(domain))
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Body {
        match self {
            MassSource::Uniform(d) => Body {
                mass: d.draw(rng),
                spin: None,
            },
            MassSource::Mahapatra(mf) => Body {
                mass: mf.draw(rng),
                spin: None,
            },
            MassSource::Pool(pool) => {
                let (mass, spin) = pool.draw(rng);
                Body { mass, spin: Some(spin) }
            }
        }
    }

    fn is_pool(&self) -> bool {
        matches!(self, MassSource::Pool(_))
    }

    fn describe(&self) -> String {
        match self {
            MassSource::Uniform(d) => format!("uniform on {d}"),
            MassSource::Mahapatra(mf) => format!("mahapatra on {}", mf.domain()),
            MassSource::Pool(pool) => format!("remnant pool of {}", pool.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sampler {
    config: PriorConfig,
    primary: MassSource,
    secondary: MassSource,
    /// Orientation of an aligned spin: `true` is up.
    aligned_up: Bernoulli,
}

impl Sampler {
    pub fn new(config: &PriorConfig) -> Result<Self, AppError> {
        Ok(Self {
            primary: MassSource::for_domain(config.m_1, config.is_mahapatra_mass_func)?,
            secondary: MassSource::for_domain(config.m_2, config.is_mahapatra_mass_func)?,
            config: config.clone(),
            aligned_up: Bernoulli::new(0.5).map_err(|e| AppError::config(format!("Invalid spin orientation law: {e}")))?,
        })
    }

    /// Draw `component` from the remnants of an earlier generation instead of
    /// the configured mass law.
    pub fn with_ancestry(mut self, component: Component, pool: RemnantPool) -> Result<Self, AppError> {
        match component {
            Component::Primary => self.primary = MassSource::Pool(pool),
            Component::Secondary => {
                if self.config.is_uniform_in_mass_ratio {
                    return Err(AppError::config(
                        "Uniform-in-mass-ratio sampling derives the secondary mass from the primary; \
                         it cannot be drawn from a remnant pool.",
                    ));
                }
                self.secondary = MassSource::Pool(pool);
            }
        }
        Ok(self)
    }

    pub fn config(&self) -> &PriorConfig {
        &self.config
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ProgenitorDraw, AppError> {
        let (first, second) = self.draw_masses(rng)?;
        let cfg = &self.config;
        let (a_1, theta_1, phi_1) = self.draw_spin(rng, first.spin, &cfg.a_1, &cfg.theta_1, &cfg.phi_1);
        let (a_2, theta_2, phi_2) = self.draw_spin(rng, second.spin, &cfg.a_2, &cfg.theta_2, &cfg.phi_2);

        Ok(ProgenitorDraw {
            m_1: first.mass,
            m_2: second.mass,
            a_1,
            a_2,
            theta_1,
            phi_1,
            theta_2,
            phi_2,
        })
    }

    /// Draw `n` binaries in sequence.
    pub fn draw_many<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Result<Vec<ProgenitorDraw>, AppError> {
        (0..n).map(|_| self.draw(rng)).collect()
    }

    fn draw_masses<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Body, Body), AppError> {
        for _ in 0..MAX_REDRAWS {
            if let Some(pair) = self.try_masses(rng) {
                return Ok(pair);
            }
        }
        let cfg = &self.config;
        Err(AppError::Sampling(format!(
            "No admissible binary after {MAX_REDRAWS} consecutive draws (m_1: {}, m_2: {}, q: {}, uniform_in_q={}, swappable={}).",
            self.primary.describe(),
            self.secondary.describe(),
            cfg.mass_ratio,
            cfg.is_uniform_in_mass_ratio,
            cfg.is_masses_swappable
        )))
    }

    fn try_masses<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Body, Body)> {
        let cfg = &self.config;

        if cfg.is_uniform_in_mass_ratio {
            let q = cfg.mass_ratio.draw(rng);
            let primary = self.primary.draw(rng);
            let m_2 = primary.mass / q;
            if !cfg.m_2.contains(m_2) {
                return None;
            }
            return Some((primary, Body { mass: m_2, spin: None }));
        }

        let mut first = self.primary.draw(rng);
        let mut second = self.secondary.draw(rng);
        let mut first_pool = self.primary.is_pool();
        let mut second_pool = self.secondary.is_pool();
        if cfg.is_masses_swappable && second.mass > first.mass {
            std::mem::swap(&mut first, &mut second);
            std::mem::swap(&mut first_pool, &mut second_pool);
        }

        if !first_pool && !cfg.m_1.contains(first.mass) {
            return None;
        }
        if !second_pool && !cfg.m_2.contains(second.mass) {
            return None;
        }
        if !cfg.mass_ratio.contains(first.mass / second.mass) {
            return None;
        }
        Some((first, second))
    }

    fn draw_spin<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        inherited: Option<f64>,
        magnitude: &Domain,
        theta: &Domain,
        phi: &Domain,
    ) -> (f64, f64, f64) {
        let a = match inherited {
            Some(a) => a,
            None => magnitude.draw(rng),
        };
        if self.config.is_spin_aligned {
            let up = self.config.is_only_up_aligned_spin || self.aligned_up.sample(rng);
            (a, if up { 0.0 } else { PI }, 0.0)
        } else {
            (a, theta.draw(rng), phi.draw(rng))
        }
    }
}
