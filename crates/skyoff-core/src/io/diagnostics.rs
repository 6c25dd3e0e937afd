//! JSON diagnostics for a fit run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fit::{ObservationResidual, OffsetSolution};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageDiagnostics {
    pub index: usize,
    pub filename: String,
    pub seed: f64,
    pub unweighted_offset: f64,
    pub unweighted_uncertainty: f64,
    pub offset: f64,
    pub uncertainty: f64,
    pub excluded: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub images: Vec<ImageDiagnostics>,
    pub observations: Vec<ObservationResidual>,
    pub reduced_chi_square: Option<f64>,
    pub weighting: String,
}

impl DiagnosticsReport {
    pub fn new(
        filenames: &[String],
        solution: &OffsetSolution,
        excluded: &[usize],
        weighting: String,
    ) -> Self {
        let images = filenames
            .iter()
            .enumerate()
            .map(|(k, name)| ImageDiagnostics {
                index: k,
                filename: name.clone(),
                seed: solution.seed[k],
                unweighted_offset: solution.unweighted.offsets[k],
                unweighted_uncertainty: solution.unweighted.uncertainties[k],
                offset: solution.weighted.offsets[k],
                uncertainty: solution.weighted.uncertainties[k],
                excluded: excluded.contains(&k),
            })
            .collect();
        Self {
            images,
            observations: solution.residuals.clone(),
            reduced_chi_square: solution.reduced_chi_square,
            weighting,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}
