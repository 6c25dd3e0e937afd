use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use skyoff_core::consts::DEFAULT_APPLY_SUFFIX;
use skyoff_core::pipeline::config::SkyoffConfig;
use skyoff_core::pipeline::run_apply;

use super::options::{load_config, FluxArgs};
use crate::progress::BarReporter;
use crate::summary::print_apply_summary;

#[derive(Args)]
pub struct ApplyArgs {
    /// Per-image offsets written by `skyoff fit`
    #[arg(short, long, required_unless_present = "config")]
    pub input: Option<PathBuf>,

    /// Suffix for the corrected images' file stems
    #[arg(long, default_value = DEFAULT_APPLY_SUFFIX)]
    pub suffix: String,

    /// Config file (TOML); overrides the options below
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub flux: FluxArgs,
}

pub fn run(args: &ApplyArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => build_config_from_args(args),
    };

    let reporter = BarReporter::new();
    let run = run_apply(&config, &reporter)
        .with_context(|| format!("Applying offsets from {}", config.offsets.display()))?;
    reporter.finish();

    print_apply_summary(&config, &run);
    Ok(())
}

fn build_config_from_args(args: &ApplyArgs) -> SkyoffConfig {
    let mut config = SkyoffConfig {
        flux: args.flux.source(),
        ..Default::default()
    };
    config.apply.suffix = args.suffix.clone();
    if let Some(input) = &args.input {
        config.offsets = input.clone();
    }
    config
}
