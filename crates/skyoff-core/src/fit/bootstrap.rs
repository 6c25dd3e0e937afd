//! Initial guess by propagating relative offsets outward from a reference.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SkyoffError};
use crate::graph::OffsetGraph;

use super::centre_on_median;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Unresolved,
    /// Offset assigned, neighbours not yet visited.
    Pending,
    Resolved,
}

#[derive(Clone, Debug)]
pub struct BootstrapResult {
    /// Seed offsets, median-centred.
    pub offsets: Vec<f64>,
    pub status: Vec<NodeStatus>,
    /// `(parent, child)` edges along which offsets were propagated.
    pub tree_edges: Vec<(usize, usize)>,
    /// Images not connected to the reference; they keep the neutral seed.
    pub unreached: Vec<usize>,
    /// Number of breadth-first levels processed.
    pub levels: usize,
}

/// Propagate offsets breadth-first from `reference`.
///
/// The reference starts at zero. Each level's pending images are visited in
/// ascending index order; every still-unresolved neighbour `j` of a visited
/// image `i` gets `offset[i] + diff[i][j]` and joins the next level. Images
/// never reached keep zero. The result is re-centred on its median.
pub fn bootstrap_offsets(graph: &OffsetGraph, reference: usize) -> Result<BootstrapResult> {
    let n = graph.image_count();
    if reference >= n {
        return Err(SkyoffError::ImageIndexOutOfRange {
            index: reference,
            total: n,
        });
    }

    let mut offsets = vec![0.0; n];
    let mut status = vec![NodeStatus::Unresolved; n];
    let mut tree_edges = Vec::new();

    status[reference] = NodeStatus::Pending;
    let mut frontier = vec![reference];
    let mut levels = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &i in &frontier {
            for edge in graph.neighbors(i) {
                let j = edge.neighbor;
                if status[j] == NodeStatus::Unresolved {
                    offsets[j] = offsets[i] + edge.diff;
                    status[j] = NodeStatus::Pending;
                    tree_edges.push((i, j));
                    next.push(j);
                }
            }
            status[i] = NodeStatus::Resolved;
        }
        next.sort_unstable();
        debug!(level = levels, resolved = frontier.len(), pending = next.len(), "Bootstrap level complete");
        frontier = next;
        levels += 1;
    }

    let unreached: Vec<usize> = (0..n)
        .filter(|&k| status[k] == NodeStatus::Unresolved)
        .collect();
    if graph.neighbors(reference).next().is_none() {
        warn!(reference, "Bootstrap reference has no valid measurements");
    }
    if !unreached.is_empty() {
        warn!(count = unreached.len(), images = ?unreached, "Images unreachable from the bootstrap reference keep a zero seed");
    }

    let shift = centre_on_median(&mut offsets);
    debug!(shift, "Re-centred bootstrap seed on its median");

    Ok(BootstrapResult {
        offsets,
        status,
        tree_edges,
        unreached,
        levels,
    })
}

/// Neutral seed for runs that skip the bootstrap.
pub fn zero_seed(n: usize) -> Vec<f64> {
    vec![0.0; n]
}
