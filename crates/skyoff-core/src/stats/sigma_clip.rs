use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{
    DEFAULT_CLIP_CONVERGENCE, DEFAULT_CLIP_MAX_ITERATIONS, DEFAULT_CLIP_SIGMA, EPSILON,
};
use crate::error::{Result, SkyoffError};

use super::{mean_std, median_in_place};

/// Parameters for iterative median-centred sigma clipping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigmaClipParams {
    /// Values further than `sigma * std` from the median are rejected (default: 5.0).
    pub sigma: f64,
    /// Iteration cap (default: 10).
    pub max_iterations: usize,
    /// Stop once the retained count changes by less than this fraction of
    /// the previous count (default: 0.0001).
    pub convergence_fraction: f64,
}

impl Default for SigmaClipParams {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_CLIP_SIGMA,
            max_iterations: DEFAULT_CLIP_MAX_ITERATIONS,
            convergence_fraction: DEFAULT_CLIP_CONVERGENCE,
        }
    }
}

/// Statistics of the retained subset after clipping.
#[derive(Clone, Debug, PartialEq)]
pub struct SigmaClipResult {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    /// Number of retained values.
    pub count: usize,
    /// Zero-based iteration at which the retained count settled, or `None`
    /// if the iteration cap was hit first.
    pub converged_at: Option<usize>,
}

impl SigmaClipResult {
    pub fn converged(&self) -> bool {
        self.converged_at.is_some()
    }
}

/// Clip `data` iteratively around its median.
///
/// The first selection uses the statistics of the whole input. Every loop
/// iteration then recomputes median and std from the currently retained
/// subset and re-selects from the *full* input, so values rejected earlier
/// can come back once the bounds widen. The loop stops when the retained
/// count changes by less than `convergence_fraction` of the previous count.
/// A zero spread keeps the current subset and counts as converged.
/// Non-finite values are ignored.
pub fn sigma_clip(data: &[f64], params: &SigmaClipParams) -> Result<SigmaClipResult> {
    let finite: Vec<f64>;
    let data = if data.iter().all(|v| v.is_finite()) {
        data
    } else {
        finite = data.iter().copied().filter(|v| v.is_finite()).collect();
        debug!(dropped = data.len() - finite.len(), "Non-finite values ignored");
        &finite[..]
    };
    if data.is_empty() {
        return Err(SkyoffError::EmptySample);
    }

    let mut scratch: Vec<f64> = Vec::with_capacity(data.len());
    let mut retained: Vec<f64> = data.to_vec();
    let mut count = data.len();
    let mut converged_at = None;

    match select_within(data, &retained, params.sigma, &mut scratch)? {
        Some(next) if !next.is_empty() => retained = next,
        Some(_) => {}
        None => converged_at = Some(0),
    }

    if converged_at.is_none() {
        for iteration in 0..params.max_iterations {
            let next = match select_within(data, &retained, params.sigma, &mut scratch)? {
                Some(next) => next,
                None => {
                    converged_at = Some(iteration);
                    break;
                }
            };
            if next.is_empty() {
                // Nothing survives these bounds; keep the previous subset.
                break;
            }

            let last_count = count;
            count = next.len();
            retained = next;
            debug!(iteration, count, last_count, "Sigma clip pass");

            let change = count.abs_diff(last_count) as f64;
            if change < params.convergence_fraction * last_count as f64 {
                converged_at = Some(iteration);
                break;
            }
        }
    }

    if converged_at.is_none() {
        warn!(
            iterations = params.max_iterations,
            count = retained.len(),
            "Sigma clip had not converged at the iteration cap"
        );
    }

    let (mean, std) = mean_std(&retained).ok_or(SkyoffError::EmptySample)?;
    let count = retained.len();
    let median = median_in_place(&mut retained).ok_or(SkyoffError::EmptySample)?;
    Ok(SigmaClipResult {
        mean,
        median,
        std,
        count,
        converged_at,
    })
}

/// Values of `data` within `sigma * std(subset)` of `median(subset)`.
/// `None` when the subset has no spread.
fn select_within(
    data: &[f64],
    subset: &[f64],
    sigma: f64,
    scratch: &mut Vec<f64>,
) -> Result<Option<Vec<f64>>> {
    let (_, std) = mean_std(subset).ok_or(SkyoffError::EmptySample)?;
    if std < EPSILON {
        return Ok(None);
    }
    scratch.clear();
    scratch.extend_from_slice(subset);
    let median = median_in_place(scratch).ok_or(SkyoffError::EmptySample)?;

    let bound = sigma * std;
    Ok(Some(
        data.iter()
            .copied()
            .filter(|v| (v - median).abs() < bound)
            .collect(),
    ))
}
