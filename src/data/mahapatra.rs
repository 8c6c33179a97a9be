//! Mahapatra et al. (2022) black-hole mass function.
//!
//! Density `p(m) ∝ S(m - m_min) m^(-alpha)` on `[m_min, m_max]`, where `S`
//! tapers the low-mass edge smoothly to zero over a width `dm`.
//! Sampling uses an inverse CDF tabulated on a uniform grid.

use rand::Rng;

use crate::domain::Domain;
use crate::error::AppError;

pub const MAHAPATRA_ALPHA: f64 = 2.3;
pub const MAHAPATRA_TAPER: f64 = 4.83;

const GRID_NODES: usize = 4096;

#[derive(Debug, Clone)]
pub struct MahapatraMassFunction {
    domain: Domain,
    alpha: f64,
    taper: f64,
    norm: f64,
    grid: Vec<f64>,
    /// Normalised cumulative distribution at each grid node.
    cdf: Vec<f64>,
}

impl MahapatraMassFunction {
    pub fn new(domain: Domain) -> Result<Self, AppError> {
        Self::with_parameters(domain, MAHAPATRA_ALPHA, MAHAPATRA_TAPER)
    }

    pub fn with_parameters(domain: Domain, alpha: f64, taper: f64) -> Result<Self, AppError> {
        if !(domain.low() > 0.0) {
            return Err(AppError::config(format!(
                "Mahapatra mass function needs a strictly positive mass domain (got {domain})."
            )));
        }
        if !(taper > 0.0 && alpha.is_finite()) {
            return Err(AppError::config(format!(
                "Invalid Mahapatra parameters (alpha={alpha}, dm={taper})."
            )));
        }

        let step = domain.width() / (GRID_NODES - 1) as f64;
        let grid: Vec<f64> = (0..GRID_NODES).map(|i| domain.low() + step * i as f64).collect();
        let density: Vec<f64> = grid
            .iter()
            .map(|&m| unnormalised_density(m, domain.low(), alpha, taper))
            .collect();

        let mut cdf = Vec::with_capacity(GRID_NODES);
        let mut acc = 0.0;
        cdf.push(0.0);
        for w in density.windows(2) {
            acc += 0.5 * (w[0] + w[1]) * step;
            cdf.push(acc);
        }
        if !(acc > 0.0 && acc.is_finite()) {
            return Err(AppError::config(format!(
                "Mahapatra mass function has no support on {domain}; widen the mass domain beyond the taper width {taper}."
            )));
        }
        for c in &mut cdf {
            *c /= acc;
        }

        Ok(Self {
            domain,
            alpha,
            taper,
            norm: acc,
            grid,
            cdf,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Normalised density at `m` (zero outside the domain).
    pub fn pdf(&self, m: f64) -> f64 {
        if !self.domain.contains(m) {
            return 0.0;
        }
        unnormalised_density(m, self.domain.low(), self.alpha, self.taper) / self.norm
    }

    /// Invert the tabulated CDF at `u` in `[0, 1]`.
    pub fn inverse_cdf(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        // First node whose CDF reaches `u`.
        let hi = self.cdf.partition_point(|&c| c < u).clamp(1, self.cdf.len() - 1);
        let lo = hi - 1;
        let (c0, c1) = (self.cdf[lo], self.cdf[hi]);
        let frac = if c1 > c0 { (u - c0) / (c1 - c0) } else { 0.0 };
        let m = self.grid[lo] + frac * (self.grid[hi] - self.grid[lo]);
        m.clamp(self.domain.low(), self.domain.high())
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inverse_cdf(rng.r#gen::<f64>())
    }
}

/// Low-mass taper `S(x)`.
pub fn taper(x: f64, dm: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else if x >= dm {
        1.0
    } else {
        1.0 / ((dm / x + dm / (x - dm)).exp() + 1.0)
    }
}

fn unnormalised_density(m: f64, m_min: f64, alpha: f64, dm: f64) -> f64 {
    taper(m - m_min, dm) * m.powf(-alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn taper_is_smooth_step() {
        assert_eq!(taper(0.0, 4.83), 0.0);
        assert_eq!(taper(-1.0, 4.83), 0.0);
        assert_eq!(taper(4.83, 4.83), 1.0);
        assert!((taper(2.415, 4.83) - 0.5).abs() < 1e-12);
        let mut prev = 0.0;
        for i in 1..100 {
            let s = taper(i as f64 * 0.0483, 4.83);
            assert!(s >= prev);
            prev = s;
        }
    }

    #[test]
    fn draws_stay_inside_domain() {
        let domain = Domain::new(5.0, 65.0).unwrap();
        let mf = MahapatraMassFunction::new(domain).unwrap();
        let mut rng = StdRng::seed_from_u64(2023);
        for _ in 0..5000 {
            let m = mf.draw(&mut rng);
            assert!(domain.contains(m), "m={m}");
        }
    }

    #[test]
    fn mass_function_favours_light_black_holes_past_the_taper() {
        let domain = Domain::new(5.0, 100.0).unwrap();
        let mf = MahapatraMassFunction::new(domain).unwrap();
        assert!(mf.pdf(15.0) > mf.pdf(50.0));
        assert_eq!(mf.pdf(5.0), 0.0);
        assert_eq!(mf.pdf(200.0), 0.0);

        let median = mf.inverse_cdf(0.5);
        assert!(median > 5.0 && median < 30.0, "median={median}");
    }

    #[test]
    fn cdf_inverse_is_monotone() {
        let mf = MahapatraMassFunction::new(Domain::new(5.0, 65.0).unwrap()).unwrap();
        let mut prev = mf.inverse_cdf(0.0);
        for i in 1..=100 {
            let m = mf.inverse_cdf(i as f64 / 100.0);
            assert!(m >= prev);
            prev = m;
        }
        assert!((mf.inverse_cdf(1.0) - 65.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_domain_has_no_support() {
        let err = MahapatraMassFunction::new(Domain::point(10.0).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
