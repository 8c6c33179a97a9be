//! Spherical-to-Cartesian conversion for spin vectors.

use nalgebra::Vector3;

/// Convert `(r, theta, phi)` to a Cartesian vector.
///
/// `theta` is the polar angle from +z, `phi` the azimuth in the x-y plane.
pub fn sph2cart(r: f64, theta: f64, phi: f64) -> Vector3<f64> {
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    Vector3::new(r * sin_t * cos_p, r * sin_t * sin_p, r * cos_t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn poles_and_equator() {
        let up = sph2cart(0.5, 0.0, 1.3);
        assert!((up - Vector3::new(0.0, 0.0, 0.5)).norm() < 1e-12);

        let down = sph2cart(0.5, PI, 0.0);
        assert!((down.z + 0.5).abs() < 1e-12);
        assert!(down.x.abs() < 1e-12);

        let y = sph2cart(2.0, PI / 2.0, PI / 2.0);
        assert!((y - Vector3::new(0.0, 2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn preserves_magnitude() {
        for i in 0..20 {
            let theta = i as f64 * 0.15;
            let phi = i as f64 * 0.31;
            let v = sph2cart(0.7, theta, phi);
            assert!((v.norm() - 0.7).abs() < 1e-12);
        }
    }
}
