use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::image::ImageRecord;

use super::columns;

/// Read an image list: the first column of each line is an image path.
/// Indices follow line order.
pub fn read_image_list(path: &Path) -> Result<Vec<ImageRecord>> {
    let text = fs::read_to_string(path)?;
    let records: Vec<ImageRecord> = text
        .lines()
        .filter_map(columns)
        .enumerate()
        .map(|(index, cols)| ImageRecord::new(PathBuf::from(cols[0]), index))
        .collect();
    info!(count = records.len(), list = %path.display(), "Found image files");
    Ok(records)
}

/// Read 1-based image numbers (whitespace or newline separated) and return
/// them 0-based, sorted and deduplicated.
pub fn read_index_list(path: &Path) -> Result<Vec<usize>> {
    let text = fs::read_to_string(path)?;
    let mut out = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let Some(cols) = columns(line) else {
            continue;
        };
        for col in cols {
            let number: usize = col.parse().ok().filter(|&v| v >= 1).ok_or_else(|| {
                crate::error::SkyoffError::Parse {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                    reason: format!("bad image number {:?}", col),
                }
            })?;
            out.push(number - 1);
        }
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}
