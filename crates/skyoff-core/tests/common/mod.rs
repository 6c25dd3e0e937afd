#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ndarray::Array2;
use skyoff_core::image::ImagePlanes;
use skyoff_core::io::exposure::{write_plane, FootprintKeywords, ImageManifest, PlanePaths};
use skyoff_core::wcs::{CoordinateMapper, TanWcs};

/// Exact integer-friendly mapper: sky = pixel + origin.
pub struct ShiftMapper {
    pub origin_x: f64,
    pub origin_y: f64,
}

impl ShiftMapper {
    pub fn new(origin_x: f64, origin_y: f64) -> Self {
        Self { origin_x, origin_y }
    }
}

impl CoordinateMapper for ShiftMapper {
    fn pixel_to_sky(&self, x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (
            x.iter().map(|v| v + self.origin_x).collect(),
            y.iter().map(|v| v + self.origin_y).collect(),
        )
    }

    fn sky_to_pixel(&self, ra: &[f64], dec: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (
            ra.iter().map(|v| v - self.origin_x).collect(),
            dec.iter().map(|v| v - self.origin_y).collect(),
        )
    }
}

/// Deterministic pseudo-random numbers (64-bit LCG).
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
    }

    /// Uniform in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Standard normal via Box-Muller.
    pub fn gaussian(&mut self) -> f64 {
        let u1 = self.uniform().max(1e-300);
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Planes with unit weight, zero mask and science from `f(row, col)`.
pub fn make_planes(h: usize, w: usize, f: impl Fn(usize, usize) -> f32) -> ImagePlanes {
    let science = Array2::from_shape_fn((h, w), |(r, c)| f(r, c));
    ImagePlanes::new(
        science,
        Array2::from_elem((h, w), 1.0),
        Array2::zeros((h, w)),
    )
    .unwrap()
}

/// Smooth sky pattern shared by all synthetic images, in global pixel units.
pub fn sky_pattern(global_x: f64, global_y: f64) -> f64 {
    100.0 + 0.05 * global_x + 0.03 * global_y
}

/// Pixel scale (degrees) of the synthetic TAN mosaic.
pub const MOSAIC_SCALE: f64 = 1e-3;

/// TAN WCS of a mosaic tile whose column 0 sits at global column `x0`.
pub fn mosaic_wcs(x0: f64) -> TanWcs {
    TanWcs::new(
        [10.0, 0.0],
        [1.0 - x0, 1.0],
        [[MOSAIC_SCALE, 0.0], [0.0, MOSAIC_SCALE]],
    )
}

/// Write a tile manifest plus its raw planes into `dir`.
pub fn write_tile(
    dir: &Path,
    name: &str,
    x0: f64,
    science: &Array2<f32>,
    weight: &Array2<f32>,
) -> PathBuf {
    let (h, w) = science.dim();
    let sci_name = format!("{name}.sci.f32");
    let wgt_name = format!("{name}.wgt.f32");
    let msk_name = format!("{name}.msk.f32");
    write_plane(&dir.join(&sci_name), science).unwrap();
    write_plane(&dir.join(&wgt_name), weight).unwrap();
    write_plane(&dir.join(&msk_name), &Array2::zeros((h, w))).unwrap();

    let wcs = mosaic_wcs(x0);
    let (ra_min, dec_min) = wcs.pixel_to_world(0.0, 0.0);
    let (ra_max, dec_max) = wcs.pixel_to_world(w as f64 - 1.0, h as f64 - 1.0);
    let (ra_cent, dec_cent) = wcs.pixel_to_world((w as f64 - 1.0) / 2.0, (h as f64 - 1.0) / 2.0);

    let manifest = ImageManifest {
        width: w,
        height: h,
        footprint: FootprintKeywords {
            ra_cent,
            dec_cent,
            racmin: ra_min,
            racmax: ra_max,
            deccmin: dec_min,
            deccmax: dec_max,
            crossra0: false,
        },
        wcs,
        planes: PlanePaths {
            science: PathBuf::from(sci_name),
            weight: PathBuf::from(wgt_name),
            mask: PathBuf::from(msk_name),
        },
    };
    let path = dir.join(format!("{name}.toml"));
    manifest.write(&path).unwrap();
    path
}
