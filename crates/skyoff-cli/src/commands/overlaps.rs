use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use skyoff_core::io::exposure::ManifestLoader;
use skyoff_core::overlap::OverlapMatrix;
use skyoff_core::pipeline::config::SkyoffConfig;
use skyoff_core::pipeline::{prepare_images, NoOpReporter};

#[derive(Args)]
pub struct OverlapsArgs {
    /// Image list (one image manifest per line)
    pub input: PathBuf,
}

pub fn run(args: &OverlapsArgs) -> Result<()> {
    let config = SkyoffConfig {
        image_list: args.input.clone(),
        ..Default::default()
    };
    let records = prepare_images(&config, &ManifestLoader, &NoOpReporter)?;
    let matrix = OverlapMatrix::from_records(&records);

    for record in &records {
        println!("{:6} {}", record.index + 1, record.name());
    }
    println!();
    print!("{}", matrix);
    println!();
    println!(
        "{} overlapping pair(s) among {} image(s)",
        matrix.candidate_pairs().count(),
        records.len()
    );
    Ok(())
}
