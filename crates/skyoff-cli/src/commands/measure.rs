use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use skyoff_core::io::exposure::ManifestLoader;
use skyoff_core::pipeline::config::SkyoffConfig;
use skyoff_core::pipeline::run_measure;

use super::options::{load_config, FluxArgs, MeasureOpts};
use crate::progress::BarReporter;
use crate::summary::print_measure_summary;

#[derive(Args)]
pub struct MeasureArgs {
    /// Image list (one image manifest per line)
    #[arg(short, long, required_unless_present = "config")]
    pub input: Option<PathBuf>,

    /// Output file of pair measurements
    #[arg(short, long, required_unless_present = "config")]
    pub output: Option<PathBuf>,

    /// Config file (TOML); overrides the options below
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub flux: FluxArgs,

    #[command(flatten)]
    pub measure: MeasureOpts,
}

pub fn run(args: &MeasureArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => build_config_from_args(args),
    };

    let reporter = BarReporter::new();
    let run = run_measure(&config, &ManifestLoader, &reporter)
        .with_context(|| format!("Measuring pairs from {}", config.image_list.display()))?;
    reporter.finish();

    print_measure_summary(&config, &run);
    Ok(())
}

fn build_config_from_args(args: &MeasureArgs) -> SkyoffConfig {
    let mut config = SkyoffConfig {
        flux: args.flux.source(),
        measure: args.measure.config(),
        ..Default::default()
    };
    if let Some(input) = &args.input {
        config.image_list = input.clone();
    }
    if let Some(output) = &args.output {
        config.measurements = output.clone();
    }
    config
}
