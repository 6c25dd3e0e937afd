//! Option groups shared by several subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use skyoff_core::consts::{
    DEFAULT_CLIP_SIGMA, DEFAULT_DISPERSION_DIVISOR, DEFAULT_MAGBASE, DEFAULT_MIN_PIXELS,
};
use skyoff_core::fit::WeightProxy;
use skyoff_core::pipeline::config::{FitConfig, FluxScaleSource, MeasureConfig, SkyoffConfig};
use skyoff_core::stats::SigmaClipParams;

#[derive(Args)]
pub struct FluxArgs {
    /// Catalog of per-image flux scales (`filename scale`)
    #[arg(long, conflicts_with = "magzero")]
    pub fluxscale: Option<PathBuf>,

    /// Catalog of per-image zero-points (`filename zp`)
    #[arg(long)]
    pub magzero: Option<PathBuf>,

    /// Magnitude base for converting zero-points to flux scales
    #[arg(long, default_value_t = DEFAULT_MAGBASE)]
    pub magbase: f64,
}

impl FluxArgs {
    pub fn source(&self) -> FluxScaleSource {
        match (&self.fluxscale, &self.magzero) {
            (Some(path), _) => FluxScaleSource::FluxScale { path: path.clone() },
            (None, Some(path)) => FluxScaleSource::MagZero {
                path: path.clone(),
                magbase: self.magbase,
            },
            (None, None) => FluxScaleSource::None,
        }
    }
}

#[derive(Args)]
pub struct MeasureOpts {
    /// Minimum surviving pixels for a valid pair measurement
    #[arg(long, default_value_t = DEFAULT_MIN_PIXELS)]
    pub minpix: usize,

    /// Sigma-clip threshold for pixel differences
    #[arg(long, default_value_t = DEFAULT_CLIP_SIGMA)]
    pub clip_sigma: f64,
}

impl MeasureOpts {
    pub fn config(&self) -> MeasureConfig {
        MeasureConfig {
            min_pixels: self.minpix,
            clip: SigmaClipParams {
                sigma: self.clip_sigma,
                ..Default::default()
            },
        }
    }
}

#[derive(Clone, ValueEnum)]
pub enum WeightArg {
    Equal,
    Overlap,
    Dispersion,
}

#[derive(Args)]
pub struct FitOpts {
    /// Start the fit from a zero seed instead of the bootstrap guess
    #[arg(long)]
    pub no_boot: bool,

    /// Zero-based bootstrap reference image
    #[arg(long, default_value = "0")]
    pub reference: usize,

    /// Weighting of the second fit pass
    #[arg(short, long, value_enum, default_value = "dispersion")]
    pub weight: WeightArg,

    /// Divisor for dispersion weighting (weight proxy = std / divisor)
    #[arg(long, default_value_t = DEFAULT_DISPERSION_DIVISOR)]
    pub divisor: f64,

    /// File of 1-based image numbers to exclude from the fit
    #[arg(short, long)]
    pub exclude: Option<PathBuf>,

    /// Write JSON fit diagnostics to this file
    #[arg(short, long)]
    pub diag: Option<PathBuf>,
}

impl FitOpts {
    pub fn config(&self) -> FitConfig {
        let weighting = match self.weight {
            WeightArg::Equal => WeightProxy::Equal,
            WeightArg::Overlap => WeightProxy::Overlap,
            WeightArg::Dispersion => WeightProxy::Dispersion {
                divisor: self.divisor,
            },
        };
        FitConfig {
            bootstrap: !self.no_boot,
            reference: self.reference,
            weighting,
            exclude: self.exclude.clone(),
            diagnostics: self.diag.clone(),
            ..Default::default()
        }
    }
}

/// Load a TOML configuration file.
pub fn load_config(path: &Path) -> Result<SkyoffConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid skyoff config")
}
