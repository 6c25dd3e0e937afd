pub mod catalog;
pub mod diagnostics;
pub mod exposure;
pub mod image_list;
pub mod measurements;
pub mod offsets;

use std::path::Path;

use crate::error::Result;
use crate::image::{ImageHeader, ImagePlanes};

/// Source of image headers and pixel planes.
pub trait ImageLoader: Send + Sync {
    /// Read header-level facts (size, footprint, coordinate mapper).
    fn inspect(&self, path: &Path) -> Result<ImageHeader>;

    /// Read the science, weight and mask planes.
    fn load(&self, path: &Path) -> Result<ImagePlanes>;
}

/// Split a text line into whitespace columns, skipping blanks and `#` comments.
pub(crate) fn columns(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.split_whitespace().collect())
}
