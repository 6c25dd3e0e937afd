//! Final per-image offsets: ` <filename> <offset>` per line, input order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SkyoffError};

use super::columns;

pub fn write_offsets<W: Write>(out: &mut W, filenames: &[String], offsets: &[f64]) -> Result<()> {
    for (name, offset) in filenames.iter().zip(offsets) {
        writeln!(out, " {} {} ", name, offset)?;
    }
    Ok(())
}

pub fn save_offsets(path: &Path, filenames: &[String], offsets: &[f64]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_offsets(&mut out, filenames, offsets)?;
    out.flush()?;
    Ok(())
}

pub fn load_offsets(path: &Path) -> Result<Vec<(String, f64)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(cols) = columns(&line) else {
            continue;
        };
        let offset = cols
            .get(1)
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| SkyoffError::Parse {
                path: PathBuf::from(path),
                line: line_no + 1,
                reason: "expected `filename offset`".into(),
            })?;
        out.push((cols[0].to_string(), offset));
    }
    Ok(out)
}
