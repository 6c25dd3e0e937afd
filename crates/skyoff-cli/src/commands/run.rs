use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use skyoff_core::io::exposure::ManifestLoader;
use skyoff_core::pipeline::config::SkyoffConfig;
use skyoff_core::pipeline::run_pipeline;

use super::options::{load_config, FitOpts, FluxArgs, MeasureOpts};
use crate::progress::BarReporter;
use crate::summary::{print_fit_summary, print_measure_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Image list (one image manifest per line)
    #[arg(required_unless_present = "config")]
    pub input: Option<PathBuf>,

    /// Intermediate file of pair measurements
    #[arg(long, default_value = "pairs.offset")]
    pub pairs: PathBuf,

    /// Output file of per-image offsets
    #[arg(short, long, default_value = "images.zoff")]
    pub output: PathBuf,

    /// Config file (TOML); overrides the options below
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub flux: FluxArgs,

    #[command(flatten)]
    pub measure: MeasureOpts,

    #[command(flatten)]
    pub fit: FitOpts,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => build_config_from_args(args),
    };

    let reporter = BarReporter::new();
    let (measured, fitted) = run_pipeline(&config, &ManifestLoader, &reporter)
        .with_context(|| format!("Processing {}", config.image_list.display()))?;
    reporter.finish();

    print_measure_summary(&config, &measured);
    print_fit_summary(&config, &fitted);
    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> SkyoffConfig {
    let mut config = SkyoffConfig {
        measurements: args.pairs.clone(),
        offsets: args.output.clone(),
        flux: args.flux.source(),
        measure: args.measure.config(),
        fit: args.fit.config(),
        ..Default::default()
    };
    if let Some(input) = &args.input {
        config.image_list = input.clone();
    }
    config
}
