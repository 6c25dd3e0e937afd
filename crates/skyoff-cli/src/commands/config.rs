use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use skyoff_core::pipeline::config::SkyoffConfig;

use super::options::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    /// Start from this (possibly partial) config instead of the defaults
    #[arg(long)]
    pub from: Option<PathBuf>,

    /// Save to a file; prints to stdout otherwise
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Emit a complete configuration, every omitted field filled with its default.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = match &args.from {
        Some(path) => load_config(path)?,
        None => SkyoffConfig::default(),
    };
    let rendered = toml::to_string_pretty(&config).context("Serializing skyoff config")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Writing config to {}", path.display()))?;
            println!("Config written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
