use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkyoffError};
use crate::wcs::CoordinateMapper;

/// Sky-footprint summary of one image, in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub ra_center: f64,
    pub dec_center: f64,
    pub ra_extent: f64,
    pub dec_extent: f64,
    /// The image straddles RA = 0/360.
    pub crosses_ra_zero: bool,
}

impl Footprint {
    /// Build a footprint from corner bounds (`RACMIN`, `RACMAX`, ...).
    ///
    /// When the image crosses RA zero, `ra_min` is the small value just past
    /// 0 and `ra_max` the large value just below 360.
    pub fn from_bounds(
        ra_center: f64,
        dec_center: f64,
        ra_min: f64,
        ra_max: f64,
        dec_min: f64,
        dec_max: f64,
        crosses_ra_zero: bool,
    ) -> Self {
        let ra_extent = if crosses_ra_zero {
            (360.0 - ra_max) + ra_min
        } else {
            ra_max - ra_min
        };
        Self {
            ra_center,
            dec_center,
            ra_extent,
            dec_extent: dec_max - dec_min,
            crosses_ra_zero,
        }
    }
}

/// Science, weight and mask planes of one image, all of shape (height, width).
#[derive(Clone, Debug)]
pub struct ImagePlanes {
    pub science: Array2<f32>,
    pub weight: Array2<f32>,
    pub mask: Array2<f32>,
}

impl ImagePlanes {
    pub fn new(science: Array2<f32>, weight: Array2<f32>, mask: Array2<f32>) -> Result<Self> {
        let expected = science.len();
        for (plane, arr) in [("weight", &weight), ("mask", &mask)] {
            if arr.dim() != science.dim() {
                return Err(SkyoffError::PlaneSize {
                    plane,
                    expected,
                    actual: arr.len(),
                });
            }
        }
        Ok(Self {
            science,
            weight,
            mask,
        })
    }

    pub fn width(&self) -> usize {
        self.science.ncols()
    }

    pub fn height(&self) -> usize {
        self.science.nrows()
    }
}

/// Header-level facts about an image, available without reading pixels.
#[derive(Clone)]
pub struct ImageHeader {
    pub width: usize,
    pub height: usize,
    pub footprint: Footprint,
    pub mapper: Arc<dyn CoordinateMapper>,
}

impl fmt::Debug for ImageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHeader")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("footprint", &self.footprint)
            .finish_non_exhaustive()
    }
}

/// One input image of the run.
///
/// `footprint` and `mapper` are bound after header inspection; the record is
/// otherwise fixed once the image list has been read.
#[derive(Clone)]
pub struct ImageRecord {
    pub path: PathBuf,
    /// Zero-based position in the input list.
    pub index: usize,
    /// Multiplicative flux scale applied to the science plane.
    pub flux_scale: f64,
    pub header: Option<ImageHeader>,
}

impl ImageRecord {
    pub fn new(path: PathBuf, index: usize) -> Self {
        Self {
            path,
            index,
            flux_scale: 1.0,
            header: None,
        }
    }

    pub fn with_header(mut self, header: ImageHeader) -> Self {
        self.header = Some(header);
        self
    }

    pub fn footprint(&self) -> Option<&Footprint> {
        self.header.as_ref().map(|h| &h.footprint)
    }

    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}

impl fmt::Debug for ImageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRecord")
            .field("path", &self.path)
            .field("index", &self.index)
            .field("flux_scale", &self.flux_scale)
            .field("header", &self.header)
            .finish()
    }
}

/// Convert a magnitude zero-point into a multiplicative flux scale.
pub fn zero_point_to_flux_scale(zero_point: f64, magbase: f64) -> f64 {
    10f64.powf(0.4 * (magbase - zero_point))
}
