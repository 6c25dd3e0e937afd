//! Bounding-box overlap test between image footprints.
//!
//! This is an approximation: pairs it accepts may still share too few
//! pixels, which the pair estimator's minimum-pixel threshold filters out.

use std::fmt;

use tracing::debug;

use crate::image::{Footprint, ImageRecord};

/// Wrap an RA value into (-180, 180].
#[inline]
fn wrap_ra(ra: f64) -> f64 {
    if ra > 180.0 {
        ra - 360.0
    } else {
        ra
    }
}

/// Decide whether two footprints overlap.
///
/// Centers are compared against the averaged extents along each axis. When
/// either image crosses RA zero both centers are wrapped first, so a pair at
/// 359.9 and 0.1 degrees is 0.2 degrees apart rather than 359.8.
pub fn footprints_overlap(a: &Footprint, b: &Footprint) -> bool {
    let dra = if a.crosses_ra_zero || b.crosses_ra_zero {
        wrap_ra(a.ra_center) - wrap_ra(b.ra_center)
    } else {
        a.ra_center - b.ra_center
    };
    let ddec = a.dec_center - b.dec_center;
    let ra_size = 0.5 * (a.ra_extent + b.ra_extent);
    let dec_size = 0.5 * (a.dec_extent + b.dec_extent);
    dra.abs() < ra_size && ddec.abs() < dec_size
}

/// N x N overlap decisions, computed independently for every ordered pair.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlapMatrix {
    n: usize,
    cells: Vec<bool>,
}

impl OverlapMatrix {
    pub fn from_footprints(footprints: &[&Footprint]) -> Self {
        let n = footprints.len();
        let mut cells = vec![false; n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    cells[i * n + j] = footprints_overlap(footprints[i], footprints[j]);
                }
            }
        }
        Self { n, cells }
    }

    /// Build from image records. Records without an inspected header never
    /// overlap anything.
    pub fn from_records(records: &[ImageRecord]) -> Self {
        let n = records.len();
        let mut cells = vec![false; n * n];
        for (i, a) in records.iter().enumerate() {
            for (j, b) in records.iter().enumerate() {
                if i == j {
                    continue;
                }
                if let (Some(fa), Some(fb)) = (a.footprint(), b.footprint()) {
                    cells[i * n + j] = footprints_overlap(fa, fb);
                }
            }
        }
        let matrix = Self { n, cells };
        debug!(
            images = n,
            overlapping_pairs = matrix.candidate_pairs().count(),
            "Computed overlap matrix"
        );
        matrix
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && self.cells[i * self.n + j]
    }

    /// Overlapping unordered pairs `(i, j)` with `i < j`, each paired with its
    /// 1-based position in the row-major enumeration of all `i < j` pairs.
    pub fn candidate_pairs(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let n = self.n;
        (0..n)
            .flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
            .enumerate()
            .filter(|&(_, (i, j))| self.get(i, j))
            .map(|(k, (i, j))| (k + 1, i, j))
    }
}

impl fmt::Display for OverlapMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.n {
            let row: Vec<&str> = (0..self.n)
                .map(|j| if self.get(i, j) { "1" } else { "0" })
                .collect();
            writeln!(f, "[{}]", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_ra() {
        assert_eq!(wrap_ra(359.5), -0.5);
        assert_eq!(wrap_ra(180.0), 180.0);
        assert_eq!(wrap_ra(10.0), 10.0);
    }
}
