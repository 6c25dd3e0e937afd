pub mod tan;

pub use tan::TanWcs;

/// Bidirectional pixel <-> sky mapping for one image.
///
/// Both directions are vectorized over equal-length coordinate slices.
/// Pixel coordinates are zero-based `(x = column, y = row)`; sky
/// coordinates are `(ra, dec)` in degrees. Points that cannot be mapped
/// come back as NaN.
pub trait CoordinateMapper: Send + Sync {
    fn pixel_to_sky(&self, x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>);

    fn sky_to_pixel(&self, ra: &[f64], dec: &[f64]) -> (Vec<f64>, Vec<f64>);
}
