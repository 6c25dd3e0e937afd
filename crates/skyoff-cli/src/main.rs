mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyoff", about = "Background offset matching for image mosaics")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure offsets between overlapping image pairs
    Measure(commands::measure::MeasureArgs),
    /// Fit one offset per image to the pair measurements
    Fit(commands::fit::FitArgs),
    /// Measure and fit in one run
    Run(commands::run::RunArgs),
    /// Write offset-corrected copies of the images
    Apply(commands::apply::ApplyArgs),
    /// Print the overlap matrix of an image list
    Overlaps(commands::overlaps::OverlapsArgs),
    /// Print a complete configuration (defaults, or a partial file filled in)
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Fit(args) => commands::fit::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Apply(args) => commands::apply::run(args),
        Commands::Overlaps(args) => commands::overlaps::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
