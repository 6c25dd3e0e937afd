//! Image manifests with raw pixel planes.
//!
//! Each image is described by a small TOML manifest holding the header values
//! the pipeline needs and the paths of three raw planes (row-major,
//! little-endian `f32`, `width * height` samples each):
//!
//! ```toml
//! width = 2048
//! height = 4096
//!
//! [footprint]
//! ra_cent = 10.5
//! dec_cent = -20.1
//! racmin = 10.2
//! racmax = 10.8
//! deccmin = -20.4
//! deccmax = -19.8
//! crossra0 = false
//!
//! [wcs]
//! crval = [10.5, -20.1]
//! crpix = [1024.5, 2048.5]
//! cd = [[-7.3e-5, 0.0], [0.0, 7.3e-5]]
//!
//! [planes]
//! science = "img.sci.f32"
//! weight = "img.wgt.f32"
//! mask = "img.msk.f32"
//! ```
//!
//! Plane paths are relative to the manifest's directory.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SkyoffError};
use crate::image::{Footprint, ImageHeader, ImagePlanes};
use crate::wcs::TanWcs;

use super::ImageLoader;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootprintKeywords {
    pub ra_cent: f64,
    pub dec_cent: f64,
    pub racmin: f64,
    pub racmax: f64,
    pub deccmin: f64,
    pub deccmax: f64,
    #[serde(default)]
    pub crossra0: bool,
}

impl FootprintKeywords {
    pub fn footprint(&self) -> Footprint {
        Footprint::from_bounds(
            self.ra_cent,
            self.dec_cent,
            self.racmin,
            self.racmax,
            self.deccmin,
            self.deccmax,
            self.crossra0,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanePaths {
    pub science: PathBuf,
    pub weight: PathBuf,
    pub mask: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageManifest {
    pub width: usize,
    pub height: usize,
    pub footprint: FootprintKeywords,
    pub wcs: TanWcs,
    pub planes: PlanePaths,
}

impl ImageManifest {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }
}

/// Loads images described by [`ImageManifest`] files.
#[derive(Clone, Debug, Default)]
pub struct ManifestLoader;

impl ManifestLoader {
    fn plane_path(manifest_path: &Path, plane: &Path) -> PathBuf {
        match manifest_path.parent() {
            Some(dir) if plane.is_relative() => dir.join(plane),
            _ => plane.to_path_buf(),
        }
    }
}

impl ImageLoader for ManifestLoader {
    fn inspect(&self, path: &Path) -> Result<ImageHeader> {
        let manifest = ImageManifest::read(path)?;
        Ok(ImageHeader {
            width: manifest.width,
            height: manifest.height,
            footprint: manifest.footprint.footprint(),
            mapper: Arc::new(manifest.wcs),
        })
    }

    fn load(&self, path: &Path) -> Result<ImagePlanes> {
        let manifest = ImageManifest::read(path)?;
        let (w, h) = (manifest.width, manifest.height);
        let science = read_plane(&Self::plane_path(path, &manifest.planes.science), w, h, "science")?;
        let weight = read_plane(&Self::plane_path(path, &manifest.planes.weight), w, h, "weight")?;
        let mask = read_plane(&Self::plane_path(path, &manifest.planes.mask), w, h, "mask")?;
        debug!(image = %path.display(), width = w, height = h, "Loaded image planes");
        ImagePlanes::new(science, weight, mask)
    }
}

/// Write a copy of the image at `manifest_path` with `shift` added to every
/// science sample.
///
/// The copy is `<stem><suffix>.toml` next to the input, with its own
/// `<stem><suffix>.sci.f32` plane; weight and mask planes are shared.
pub fn write_shifted_copy(manifest_path: &Path, shift: f32, suffix: &str) -> Result<PathBuf> {
    let mut manifest = ImageManifest::read(manifest_path)?;
    let science_path = ManifestLoader::plane_path(manifest_path, &manifest.planes.science);
    let mut science = read_plane(&science_path, manifest.width, manifest.height, "science")?;
    science.mapv_inplace(|v| v + shift);

    let stem = manifest_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let science_name = PathBuf::from(format!("{stem}{suffix}.sci.f32"));
    write_plane(&dir.join(&science_name), &science)?;

    manifest.planes.science = science_name;
    let out = dir.join(format!("{stem}{suffix}.toml"));
    manifest.write(&out)?;
    debug!(input = %manifest_path.display(), output = %out.display(), shift, "Wrote shifted image");
    Ok(out)
}

/// Memory-map a raw little-endian `f32` plane.
pub fn read_plane(
    path: &Path,
    width: usize,
    height: usize,
    plane: &'static str,
) -> Result<Array2<f32>> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    let expected = width * height;
    let actual = mmap.len() / std::mem::size_of::<f32>();
    if actual != expected || mmap.len() % std::mem::size_of::<f32>() != 0 {
        return Err(SkyoffError::PlaneSize {
            plane,
            expected,
            actual,
        });
    }

    let mut data = vec![0.0f32; expected];
    LittleEndian::read_f32_into(&mmap, &mut data);
    Array2::from_shape_vec((height, width), data).map_err(|_| SkyoffError::PlaneSize {
        plane,
        expected,
        actual,
    })
}

/// Write a raw little-endian `f32` plane, row-major.
pub fn write_plane(path: &Path, data: &Array2<f32>) -> Result<()> {
    let values: Vec<f32> = data.iter().copied().collect();
    let mut bytes = vec![0u8; values.len() * std::mem::size_of::<f32>()];
    LittleEndian::write_f32_into(&values, &mut bytes);
    fs::write(path, bytes)?;
    Ok(())
}
