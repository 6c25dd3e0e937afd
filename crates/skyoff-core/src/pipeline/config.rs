use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_APPLY_SUFFIX, DEFAULT_MAGBASE, DEFAULT_MIN_PIXELS};
use crate::fit::{SolverParams, WeightProxy};
use crate::stats::SigmaClipParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyoffConfig {
    /// Image list, one image per line.
    pub image_list: PathBuf,
    /// Pairwise measurement file (written by measure, read by fit).
    pub measurements: PathBuf,
    /// Final per-image offsets.
    pub offsets: PathBuf,
    #[serde(default)]
    pub flux: FluxScaleSource,
    #[serde(default)]
    pub measure: MeasureConfig,
    #[serde(default)]
    pub fit: FitConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
}

impl Default for SkyoffConfig {
    fn default() -> Self {
        Self {
            image_list: PathBuf::from("images.list"),
            measurements: PathBuf::from("pairs.offset"),
            offsets: PathBuf::from("images.zoff"),
            flux: FluxScaleSource::default(),
            measure: MeasureConfig::default(),
            fit: FitConfig::default(),
            apply: ApplyConfig::default(),
        }
    }
}

/// Where per-image flux scales come from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FluxScaleSource {
    /// Every image keeps a scale of 1.0.
    #[default]
    None,
    /// Catalog of direct flux scales.
    FluxScale { path: PathBuf },
    /// Catalog of zero-points, converted with `10^(0.4 * (magbase - zp))`.
    MagZero {
        path: PathBuf,
        #[serde(default = "default_magbase")]
        magbase: f64,
    },
}

fn default_magbase() -> f64 {
    DEFAULT_MAGBASE
}

impl fmt::Display for FluxScaleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None (1.0)"),
            Self::FluxScale { path } => write!(f, "Flux scales from {}", path.display()),
            Self::MagZero { path, magbase } => {
                write!(f, "Zero-points from {} (magbase {})", path.display(), magbase)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Minimum surviving difference pixels for a valid pair (default: 500).
    pub min_pixels: usize,
    pub clip: SigmaClipParams,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            min_pixels: DEFAULT_MIN_PIXELS,
            clip: SigmaClipParams::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Seed the fit by breadth-first propagation; otherwise start from zero.
    pub bootstrap: bool,
    /// Zero-based bootstrap reference image.
    pub reference: usize,
    pub weighting: WeightProxy,
    pub solver: SolverParams,
    /// Optional file of 1-based image numbers whose measurements are dropped.
    pub exclude: Option<PathBuf>,
    /// Optional JSON diagnostics output.
    pub diagnostics: Option<PathBuf>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            bootstrap: true,
            reference: 0,
            weighting: WeightProxy::default(),
            solver: SolverParams::default(),
            exclude: None,
            diagnostics: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Appended to each corrected image's file stem (default: "_zoff").
    pub suffix: String,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_APPLY_SUFFIX.to_string(),
        }
    }
}
