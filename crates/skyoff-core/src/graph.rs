//! Sparse set of pairwise offset measurements over N images.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkyoffError};

/// A valid offset measurement between images `i < j`.
///
/// `offset` is `median(image_i - image_j)`; the reverse direction is its
/// negation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairwiseMeasurement {
    pub i: usize,
    pub j: usize,
    pub offset: f64,
    /// 1-based position of `(i, j)` in the row-major enumeration of all
    /// `i < j` pairs.
    pub pair_index: usize,
    pub pixels: usize,
    pub std: f64,
}

/// One edge seen from a node: the neighbour and `diff[node][neighbor]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub neighbor: usize,
    pub diff: f64,
}

/// Valid pairwise measurements indexed both as an adjacency structure and as
/// a flat observation list.
#[derive(Clone, Debug, Default)]
pub struct OffsetGraph {
    n: usize,
    measurements: Vec<PairwiseMeasurement>,
    lookup: HashMap<(usize, usize), usize>,
    adjacency: Vec<Vec<usize>>,
}

impl OffsetGraph {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            measurements: Vec::new(),
            lookup: HashMap::new(),
            adjacency: vec![Vec::new(); n],
        }
    }

    pub fn from_measurements(
        n: usize,
        measurements: impl IntoIterator<Item = PairwiseMeasurement>,
    ) -> Result<Self> {
        let mut graph = Self::new(n);
        for m in measurements {
            graph.insert(m)?;
        }
        Ok(graph)
    }

    /// Add a measurement. Pairs must satisfy `i < j < n` and appear once.
    pub fn insert(&mut self, m: PairwiseMeasurement) -> Result<()> {
        let invalid = |reason: &str| SkyoffError::InvalidPair {
            i: m.i,
            j: m.j,
            reason: reason.to_string(),
        };
        if m.i >= m.j {
            return Err(invalid("expected i < j"));
        }
        if m.j >= self.n {
            return Err(SkyoffError::ImageIndexOutOfRange {
                index: m.j,
                total: self.n,
            });
        }
        if !m.offset.is_finite() {
            return Err(invalid("offset is not finite"));
        }
        if !m.std.is_finite() {
            return Err(invalid("std is not finite"));
        }
        if self.lookup.contains_key(&(m.i, m.j)) {
            return Err(invalid("duplicate measurement"));
        }
        self.push(m);
        Ok(())
    }

    fn push(&mut self, m: PairwiseMeasurement) {
        let k = self.measurements.len();
        self.lookup.insert((m.i, m.j), k);
        self.adjacency[m.i].push(k);
        self.adjacency[m.j].push(k);
        self.measurements.push(m);
    }

    pub fn image_count(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Observations in insertion order.
    pub fn measurements(&self) -> &[PairwiseMeasurement] {
        &self.measurements
    }

    /// `diff[i][j]`, antisymmetric: `diff(j, i) == -diff(i, j)`.
    pub fn diff(&self, i: usize, j: usize) -> Option<f64> {
        if i < j {
            self.lookup
                .get(&(i, j))
                .map(|&k| self.measurements[k].offset)
        } else {
            self.lookup
                .get(&(j, i))
                .map(|&k| -self.measurements[k].offset)
        }
    }

    /// Edges touching `node`, in insertion order.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flatten()
            .map(move |&k| {
                let m = &self.measurements[k];
                if m.i == node {
                    Edge {
                        neighbor: m.j,
                        diff: m.offset,
                    }
                } else {
                    Edge {
                        neighbor: m.i,
                        diff: -m.offset,
                    }
                }
            })
    }

    /// Number of measurements touching each image.
    pub fn degrees(&self) -> Vec<usize> {
        self.adjacency.iter().map(Vec::len).collect()
    }

    /// A copy without any measurement touching an image in `excluded`.
    pub fn without_images(&self, excluded: &[usize]) -> Self {
        let mut graph = Self::new(self.n);
        for m in &self.measurements {
            if !excluded.contains(&m.i) && !excluded.contains(&m.j) {
                graph.push(m.clone());
            }
        }
        graph
    }
}
