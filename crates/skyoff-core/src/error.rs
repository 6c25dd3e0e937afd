use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkyoffError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} input image(s) missing", .0.len())]
    MissingInputs(Vec<PathBuf>),

    #[error("{}:{line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid image manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    #[error("Cannot write image manifest: {0}")]
    ManifestWrite(#[from] toml::ser::Error),

    #[error("Image {} has flux scale {scale}; offsets cannot be rescaled", .image.display())]
    InvalidFluxScale { image: PathBuf, scale: f64 },

    #[error("Plane {plane} has {actual} samples, expected {expected}")]
    PlaneSize {
        plane: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Image index {index} out of range (total: {total})")]
    ImageIndexOutOfRange { index: usize, total: usize },

    #[error("Excluded image number {number} exceeds the image count ({total})")]
    ExcludedImageOutOfRange { number: usize, total: usize },

    #[error("Invalid pair ({i}, {j}): {reason}")]
    InvalidPair { i: usize, j: usize, reason: String },

    #[error("Image {} has no inspected header", .0.display())]
    NotInspected(PathBuf),

    #[error("Empty sample")]
    EmptySample,

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkyoffError>;
