//! Gnomonic (TAN) world coordinate system with a CD matrix.
//!
//! `crpix` follows the FITS convention (1-based), the mapper API takes
//! zero-based pixel coordinates. Angles in the public fields are degrees.

use serde::{Deserialize, Serialize};

use super::CoordinateMapper;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TanWcs {
    /// Reference sky point `[ra, dec]` in degrees.
    pub crval: [f64; 2],
    /// Reference pixel `[x, y]`, 1-based.
    pub crpix: [f64; 2],
    /// Pixel offset -> intermediate world coordinates (degrees per pixel).
    pub cd: [[f64; 2]; 2],
}

impl TanWcs {
    pub fn new(crval: [f64; 2], crpix: [f64; 2], cd: [[f64; 2]; 2]) -> Self {
        Self { crval, crpix, cd }
    }

    fn cd_inverse(&self) -> Option<[[f64; 2]; 2]> {
        let [[a, b], [c, d]] = self.cd;
        let det = a * d - b * c;
        if det.abs() < f64::MIN_POSITIVE {
            return None;
        }
        Some([[d / det, -b / det], [-c / det, a / det]])
    }

    /// Map one zero-based pixel to `(ra, dec)` in degrees.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x + 1.0 - self.crpix[0];
        let dy = y + 1.0 - self.crpix[1];
        let xi = (self.cd[0][0] * dx + self.cd[0][1] * dy).to_radians();
        let eta = (self.cd[1][0] * dx + self.cd[1][1] * dy).to_radians();
        let (ra, dec) = inverse_tan_project(
            xi,
            eta,
            self.crval[0].to_radians(),
            self.crval[1].to_radians(),
        );
        (ra.to_degrees().rem_euclid(360.0), dec.to_degrees())
    }

    /// Map `(ra, dec)` in degrees to a zero-based pixel, or `None` when the
    /// point lies on or behind the tangent plane.
    pub fn world_to_pixel(&self, ra: f64, dec: f64) -> Option<(f64, f64)> {
        let inv = self.cd_inverse()?;
        let (xi, eta) = tan_project(
            ra.to_radians(),
            dec.to_radians(),
            self.crval[0].to_radians(),
            self.crval[1].to_radians(),
        )?;
        let (xi, eta) = (xi.to_degrees(), eta.to_degrees());
        let dx = inv[0][0] * xi + inv[0][1] * eta;
        let dy = inv[1][0] * xi + inv[1][1] * eta;
        Some((dx + self.crpix[0] - 1.0, dy + self.crpix[1] - 1.0))
    }
}

impl CoordinateMapper for TanWcs {
    fn pixel_to_sky(&self, x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        x.iter()
            .zip(y)
            .map(|(&x, &y)| self.pixel_to_world(x, y))
            .unzip()
    }

    fn sky_to_pixel(&self, ra: &[f64], dec: &[f64]) -> (Vec<f64>, Vec<f64>) {
        ra.iter()
            .zip(dec)
            .map(|(&ra, &dec)| self.world_to_pixel(ra, dec).unwrap_or((f64::NAN, f64::NAN)))
            .unzip()
    }
}

/// Forward gnomonic projection onto the tangent plane at `(ra0, dec0)`.
/// All angles in radians.
#[inline]
fn tan_project(ra: f64, dec: f64, ra0: f64, dec0: f64) -> Option<(f64, f64)> {
    let da = ra - ra0;
    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_dec0, cos_dec0) = dec0.sin_cos();
    let cos_da = da.cos();

    let denom = sin_dec * sin_dec0 + cos_dec * cos_dec0 * cos_da;
    if denom <= 1e-12 {
        return None;
    }

    let xi = cos_dec * da.sin() / denom;
    let eta = (sin_dec * cos_dec0 - cos_dec * sin_dec0 * cos_da) / denom;
    Some((xi, eta))
}

#[inline]
fn inverse_tan_project(xi: f64, eta: f64, ra0: f64, dec0: f64) -> (f64, f64) {
    let rho_sq = xi * xi + eta * eta;
    if rho_sq < 1e-30 {
        return (ra0, dec0);
    }

    let (sin_dec0, cos_dec0) = dec0.sin_cos();
    let rho = rho_sq.sqrt();
    let c = rho.atan();
    let (sin_c, cos_c) = c.sin_cos();

    let dec = (cos_c * sin_dec0 + eta * sin_c * cos_dec0 / rho).asin();
    let ra = ra0 + (xi * sin_c).atan2(rho * cos_dec0 * cos_c - eta * sin_dec0 * sin_c);
    (ra, dec)
}
