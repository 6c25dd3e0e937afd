use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use skyoff_core::pipeline::config::SkyoffConfig;
use skyoff_core::pipeline::run_fit;

use super::options::{load_config, FitOpts};
use crate::progress::BarReporter;
use crate::summary::print_fit_summary;

#[derive(Args)]
pub struct FitArgs {
    /// Pair measurements written by `skyoff measure`
    #[arg(short, long, required_unless_present = "config")]
    pub input: Option<PathBuf>,

    /// Output file of per-image offsets
    #[arg(short, long, required_unless_present = "config")]
    pub output: Option<PathBuf>,

    /// Config file (TOML); overrides the options below
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub fit: FitOpts,
}

pub fn run(args: &FitArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => build_config_from_args(args),
    };

    let reporter = BarReporter::new();
    let run = run_fit(&config, &reporter)
        .with_context(|| format!("Fitting offsets from {}", config.measurements.display()))?;
    reporter.finish();

    print_fit_summary(&config, &run);
    Ok(())
}

fn build_config_from_args(args: &FitArgs) -> SkyoffConfig {
    let mut config = SkyoffConfig {
        fit: args.fit.config(),
        ..Default::default()
    };
    if let Some(input) = &args.input {
        config.measurements = input.clone();
    }
    if let Some(output) = &args.output {
        config.offsets = output.clone();
    }
    config
}
