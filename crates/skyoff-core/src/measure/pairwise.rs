//! Robust offset between two overlapping images.
//!
//! Valid pixels of image `i` are mapped pixel -> sky -> pixel into image `j`
//! and the flux-scaled differences `science_i - science_j` are reduced with
//! a sigma-clipped median.

use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{MAPPING_CHUNK_SIZE, PARALLEL_PIXEL_THRESHOLD};
use crate::error::Result;
use crate::image::ImagePlanes;
use crate::stats::{sigma_clip, SigmaClipParams};
use crate::wcs::CoordinateMapper;

/// Clipped statistics of one pair's pixel differences.
#[derive(Clone, Debug, PartialEq)]
pub struct PairStats {
    /// Clipped median of `science_i - science_j`.
    pub median: f64,
    /// Standard deviation of the clipped differences.
    pub std: f64,
    /// Differences surviving the clip.
    pub count: usize,
}

/// Outcome of measuring one pair.
#[derive(Clone, Debug, PartialEq)]
pub enum PairEstimate {
    Measured(PairStats),
    /// Fewer than the minimum number of pixels survived, either before or
    /// after clipping. `pixels` is the count that fell short.
    Insufficient { pixels: usize },
}

impl PairEstimate {
    /// `(offset, std, count)` with the `(0.0, -1.0, -1)` sentinel for
    /// insufficient overlap.
    pub fn as_tuple(&self) -> (f64, f64, i64) {
        match self {
            Self::Measured(s) => (s.median, s.std, s.count as i64),
            Self::Insufficient { .. } => (0.0, -1.0, -1),
        }
    }

    pub fn stats(&self) -> Option<&PairStats> {
        match self {
            Self::Measured(s) => Some(s),
            Self::Insufficient { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

/// Matched pixel positions: `(row, col)` in image i and in image j.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Correspondence {
    pub i_pixels: Vec<(usize, usize)>,
    pub j_pixels: Vec<(usize, usize)>,
}

impl Correspondence {
    pub fn len(&self) -> usize {
        self.i_pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i_pixels.is_empty()
    }
}

/// Map every weighted pixel of image i into image j.
///
/// A correspondence is kept when the rounded target lies strictly inside
/// image j (`0 < x < width`, `0 < y < height`) and has positive weight there.
pub fn pixel_correspondence(
    i_weight: &Array2<f32>,
    i_mapper: &dyn CoordinateMapper,
    j_weight: &Array2<f32>,
    j_mapper: &dyn CoordinateMapper,
) -> Correspondence {
    let (jh, jw) = j_weight.dim();

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for ((row, col), &w) in i_weight.indexed_iter() {
        if w > 0.0 {
            xs.push(col as f64);
            ys.push(row as f64);
        }
    }

    let map_chunk = |x: &[f64], y: &[f64]| -> (Vec<f64>, Vec<f64>) {
        let (ra, dec) = i_mapper.pixel_to_sky(x, y);
        j_mapper.sky_to_pixel(&ra, &dec)
    };

    let (jx, jy) = if i_weight.len() >= PARALLEL_PIXEL_THRESHOLD {
        let chunks: Vec<(Vec<f64>, Vec<f64>)> = xs
            .par_chunks(MAPPING_CHUNK_SIZE)
            .zip(ys.par_chunks(MAPPING_CHUNK_SIZE))
            .map(|(x, y)| map_chunk(x, y))
            .collect();
        let mut jx = Vec::with_capacity(xs.len());
        let mut jy = Vec::with_capacity(ys.len());
        for (cx, cy) in chunks {
            jx.extend(cx);
            jy.extend(cy);
        }
        (jx, jy)
    } else {
        map_chunk(&xs, &ys)
    };

    let mut out = Correspondence::default();
    for k in 0..xs.len() {
        let (tx, ty) = (jx[k].round(), jy[k].round());
        // NaN fails both comparisons.
        if !(tx > 0.0 && tx < jw as f64 && ty > 0.0 && ty < jh as f64) {
            continue;
        }
        let (trow, tcol) = (ty as usize, tx as usize);
        if j_weight[[trow, tcol]] > 0.0 {
            out.i_pixels.push((ys[k] as usize, xs[k] as usize));
            out.j_pixels.push((trow, tcol));
        }
    }
    out
}

/// One image of a pair: its pixel planes, flux scale and coordinate mapper.
#[derive(Clone, Copy)]
pub struct PairSide<'a> {
    pub planes: &'a ImagePlanes,
    pub flux_scale: f64,
    pub mapper: &'a dyn CoordinateMapper,
}

/// Measure the robust offset `median(science_i - science_j)` of one pair.
///
/// Science planes are multiplied by their flux scales first. Pixel planes are
/// only read.
pub fn estimate_pair_offset(
    i: PairSide<'_>,
    j: PairSide<'_>,
    min_pixels: usize,
    clip: &SigmaClipParams,
) -> Result<PairEstimate> {
    let corr = pixel_correspondence(&i.planes.weight, i.mapper, &j.planes.weight, j.mapper);
    debug!(pixels = corr.len(), "Overlapping weighted pixels");

    if corr.len() < min_pixels {
        return Ok(PairEstimate::Insufficient { pixels: corr.len() });
    }

    let diff: Vec<f64> = corr
        .i_pixels
        .iter()
        .zip(&corr.j_pixels)
        .map(|(&ip, &jp)| {
            i.planes.science[ip] as f64 * i.flux_scale - j.planes.science[jp] as f64 * j.flux_scale
        })
        .filter(|d| d.is_finite())
        .collect();
    if diff.len() < corr.len() {
        debug!(dropped = corr.len() - diff.len(), "Non-finite differences dropped");
    }
    if diff.len() < min_pixels {
        return Ok(PairEstimate::Insufficient { pixels: diff.len() });
    }

    let clipped = sigma_clip(&diff, clip)?;
    if clipped.count < min_pixels {
        return Ok(PairEstimate::Insufficient {
            pixels: clipped.count,
        });
    }

    Ok(PairEstimate::Measured(PairStats {
        median: clipped.median,
        std: clipped.std,
        count: clipped.count,
    }))
}
