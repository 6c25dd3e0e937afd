//! Pairwise measurement file.
//!
//! ```text
//!       1 a.toml
//!       2 b.toml
//! END OF FILELIST
//!  <offset> <pair_index> <i> <j> <pixels> <std>
//! ```
//!
//! Image numbers are 1-based in the file and 0-based in memory. Floats are
//! written in shortest round-trip form so re-reading is exact.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::consts::END_OF_FILELIST;
use crate::error::{Result, SkyoffError};
use crate::graph::PairwiseMeasurement;

use super::columns;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasurementFile {
    /// Image names in index order.
    pub filenames: Vec<String>,
    pub measurements: Vec<PairwiseMeasurement>,
}

pub fn write_measurements<W: Write>(out: &mut W, file: &MeasurementFile) -> Result<()> {
    for (k, name) in file.filenames.iter().enumerate() {
        writeln!(out, " {:6} {} ", k + 1, name)?;
    }
    writeln!(out, "{}", END_OF_FILELIST)?;
    for m in &file.measurements {
        writeln!(
            out,
            " {:>12} {:6} {:6} {:6} {:10} {:>12} ",
            m.offset,
            m.pair_index,
            m.i + 1,
            m.j + 1,
            m.pixels,
            m.std
        )?;
    }
    Ok(())
}

pub fn save_measurements(path: &Path, file: &MeasurementFile) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_measurements(&mut out, file)?;
    out.flush()?;
    Ok(())
}

pub fn read_measurements<R: BufRead>(input: R, source: &Path) -> Result<MeasurementFile> {
    let mut file = MeasurementFile::default();
    let mut in_filelist = true;

    for (line_no, line) in input.lines().enumerate() {
        let line = line?;
        let parse_error = |reason: String| SkyoffError::Parse {
            path: PathBuf::from(source),
            line: line_no + 1,
            reason,
        };

        if line.trim() == END_OF_FILELIST {
            in_filelist = false;
            continue;
        }
        let Some(cols) = columns(&line) else {
            continue;
        };

        if in_filelist {
            if cols.len() < 2 {
                return Err(parse_error("expected `index filename`".into()));
            }
            let index: usize = cols[0]
                .parse()
                .map_err(|e| parse_error(format!("bad image index {:?}: {}", cols[0], e)))?;
            if index != file.filenames.len() + 1 {
                return Err(parse_error(format!(
                    "image index {} out of sequence, expected {}",
                    index,
                    file.filenames.len() + 1
                )));
            }
            file.filenames.push(cols[1].to_string());
            continue;
        }

        if cols.len() < 6 {
            return Err(parse_error(format!("expected 6 columns, found {}", cols.len())));
        }
        let float = |k: usize| -> Result<f64> {
            cols[k]
                .parse::<f64>()
                .map_err(|e| parse_error(format!("bad number {:?}: {}", cols[k], e)))
        };
        let int = |k: usize| -> Result<i64> {
            cols[k]
                .parse::<i64>()
                .map_err(|e| parse_error(format!("bad integer {:?}: {}", cols[k], e)))
        };

        let offset = float(0)?;
        // Older files print the pair index as a float.
        let pair_index = float(1)?.round() as usize;
        let (a, b) = (int(2)?, int(3)?);
        let pixels = int(4)?;
        let std = float(5)?;

        let n = file.filenames.len() as i64;
        if a < 1 || b < 1 || a > n || b > n || a == b {
            return Err(parse_error(format!("invalid image pair ({}, {})", a, b)));
        }
        if pixels < 0 {
            warn!(line = line_no + 1, "Skipping sentinel measurement");
            continue;
        }

        // Normalise to i < j; the reverse direction is the negated offset.
        let (i, j, offset) = if a < b {
            (a as usize - 1, b as usize - 1, offset)
        } else {
            (b as usize - 1, a as usize - 1, -offset)
        };
        file.measurements.push(PairwiseMeasurement {
            i,
            j,
            offset,
            pair_index,
            pixels: pixels as usize,
            std,
        });
    }

    if in_filelist {
        return Err(SkyoffError::Parse {
            path: PathBuf::from(source),
            line: 0,
            reason: format!("missing `{}` line", END_OF_FILELIST),
        });
    }
    Ok(file)
}

pub fn load_measurements(path: &Path) -> Result<MeasurementFile> {
    let reader = BufReader::new(File::open(path)?);
    read_measurements(reader, path)
}
