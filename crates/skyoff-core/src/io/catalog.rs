//! Flux-scale and zero-point catalogs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, SkyoffError};
use crate::image::{zero_point_to_flux_scale, ImageRecord};

use super::columns;

/// How the second catalog column is interpreted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CatalogKind {
    /// Direct multiplicative flux scale.
    FluxScale,
    /// Magnitude zero-point, converted with `10^(0.4 * (magbase - zp))`.
    MagZero { magbase: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub filename: String,
    pub flux_scale: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogApplyReport {
    pub applied: usize,
    /// Catalog filenames that matched no image.
    pub unmatched: Vec<String>,
}

/// Strip a trailing FITS extension marker such as `[0]`.
pub fn strip_extension_marker(name: &str) -> &str {
    name.strip_suffix("[0]").unwrap_or(name)
}

pub fn read_catalog(path: &Path, kind: CatalogKind) -> Result<Vec<CatalogEntry>> {
    let text = fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let Some(cols) = columns(line) else {
            continue;
        };
        let parse_error = |reason: String| SkyoffError::Parse {
            path: PathBuf::from(path),
            line: line_no + 1,
            reason,
        };
        if cols.len() < 2 {
            return Err(parse_error("expected `filename value`".into()));
        }
        let value: f64 = cols[1]
            .parse()
            .map_err(|e| parse_error(format!("bad value {:?}: {}", cols[1], e)))?;
        let flux_scale = match kind {
            CatalogKind::FluxScale => value,
            CatalogKind::MagZero { magbase } => zero_point_to_flux_scale(value, magbase),
        };
        entries.push(CatalogEntry {
            filename: strip_extension_marker(cols[0]).to_string(),
            flux_scale,
        });
    }
    Ok(entries)
}

/// Set flux scales on matching records. Unknown filenames are reported and
/// skipped; records without an entry keep their current scale.
pub fn apply_catalog(records: &mut [ImageRecord], entries: &[CatalogEntry]) -> CatalogApplyReport {
    let mut report = CatalogApplyReport::default();
    for entry in entries {
        let target = records
            .iter_mut()
            .find(|r| strip_extension_marker(&r.name()) == entry.filename);
        match target {
            Some(record) => {
                record.flux_scale = entry.flux_scale;
                report.applied += 1;
            }
            None => {
                warn!(filename = %entry.filename, "Catalog entry matches no input image");
                report.unmatched.push(entry.filename.clone());
            }
        }
    }
    info!(applied = report.applied, unmatched = report.unmatched.len(), "Applied flux-scale catalog");
    report
}
