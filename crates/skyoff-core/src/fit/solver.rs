//! Global per-image offset fit over all pairwise measurements.
//!
//! The model predicts `offset[j] - offset[i]` for every measured pair. The
//! fit runs twice: unweighted from the seed, then weighted by the per-pair
//! weight proxy starting from the first result. Each result is re-centred on
//! its median.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{DEFAULT_DISPERSION_DIVISOR, EPSILON};
use crate::error::{Result, SkyoffError};
use crate::graph::{OffsetGraph, PairwiseMeasurement};

use super::centre_on_median;
use super::levmar::{levenberg_marquardt, LeastSquaresProblem, SolverParams, Termination};
use super::linalg::symmetric_pinv;

/// Per-observation uncertainty used by the weighted pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WeightProxy {
    /// `std / divisor`; smaller dispersion gives a tighter weight.
    Dispersion { divisor: f64 },
    /// `1 / sqrt(pixels)`.
    Overlap,
    /// Every observation counts the same.
    Equal,
}

impl Default for WeightProxy {
    fn default() -> Self {
        Self::Dispersion {
            divisor: DEFAULT_DISPERSION_DIVISOR,
        }
    }
}

impl std::fmt::Display for WeightProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispersion { divisor } => write!(f, "Dispersion / {}", divisor),
            Self::Overlap => write!(f, "1 / sqrt(pixels)"),
            Self::Equal => write!(f, "Equal"),
        }
    }
}

impl WeightProxy {
    pub fn sigma(&self, m: &PairwiseMeasurement) -> f64 {
        let raw = match self {
            Self::Dispersion { divisor } => m.std / divisor,
            Self::Overlap => 1.0 / (m.pixels.max(1) as f64).sqrt(),
            Self::Equal => 1.0,
        };
        // f64::max would turn NaN into the floor.
        if raw.is_nan() {
            raw
        } else {
            raw.max(EPSILON)
        }
    }
}

/// Pairwise difference model with its pair lookup carried as fit context.
#[derive(Clone, Debug)]
pub struct PairwiseOffsetModel {
    n: usize,
    first: Vec<usize>,
    second: Vec<usize>,
    observed: Vec<f64>,
    sigma: Option<Vec<f64>>,
}

impl PairwiseOffsetModel {
    pub fn new(n: usize, measurements: &[PairwiseMeasurement]) -> Self {
        Self {
            n,
            first: measurements.iter().map(|m| m.i).collect(),
            second: measurements.iter().map(|m| m.j).collect(),
            observed: measurements.iter().map(|m| m.offset).collect(),
            sigma: None,
        }
    }

    pub fn with_sigma(mut self, sigma: Vec<f64>) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn observation_count(&self) -> usize {
        self.observed.len()
    }

    /// `offset[j] - offset[i]` for every observation.
    pub fn predict(&self, offsets: &[f64]) -> Vec<f64> {
        self.first
            .iter()
            .zip(&self.second)
            .map(|(&i, &j)| offsets[j] - offsets[i])
            .collect()
    }

    fn inverse_sigma(&self, k: usize) -> f64 {
        self.sigma.as_ref().map_or(1.0, |s| 1.0 / s[k])
    }
}

impl LeastSquaresProblem for PairwiseOffsetModel {
    fn parameter_count(&self) -> usize {
        self.n
    }

    fn residuals(&self, params: &Array1<f64>) -> Array1<f64> {
        Array1::from_iter((0..self.observed.len()).map(|k| {
            let predicted = params[self.second[k]] - params[self.first[k]];
            (predicted - self.observed[k]) * self.inverse_sigma(k)
        }))
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Array2<f64> {
        let mut jac = Array2::<f64>::zeros((self.observed.len(), self.n));
        for k in 0..self.observed.len() {
            let w = self.inverse_sigma(k);
            jac[[k, self.second[k]]] += w;
            jac[[k, self.first[k]]] -= w;
        }
        jac
    }
}

/// Result of one fit pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FitPass {
    /// Median-centred offsets.
    pub offsets: Vec<f64>,
    /// Square root of the covariance diagonal.
    pub uncertainties: Vec<f64>,
    pub iterations: usize,
    pub termination: Termination,
    /// `0.5 * sum(r^2)` at the solution.
    pub cost: f64,
}

/// One observation compared against the final solution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObservationResidual {
    pub i: usize,
    pub j: usize,
    pub observed: f64,
    pub predicted: f64,
    pub residual: f64,
    pub weight_proxy: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OffsetSolution {
    /// Median-centred seed the first pass started from.
    pub seed: Vec<f64>,
    pub unweighted: FitPass,
    pub weighted: FitPass,
    /// `sum(((predicted - observed) / proxy)^2) / (observations - images)`,
    /// `None` when there are no degrees of freedom.
    pub reduced_chi_square: Option<f64>,
    pub residuals: Vec<ObservationResidual>,
}

impl OffsetSolution {
    /// Final per-image offsets (weighted pass).
    pub fn offsets(&self) -> &[f64] {
        &self.weighted.offsets
    }
}

/// Fit one offset per image to every measurement in `graph`.
pub fn solve_offsets(
    graph: &OffsetGraph,
    seed: &[f64],
    weighting: &WeightProxy,
    params: &SolverParams,
) -> Result<OffsetSolution> {
    let n = graph.image_count();
    if seed.len() != n {
        return Err(SkyoffError::Solver(format!(
            "seed has {} entries for {} images",
            seed.len(),
            n
        )));
    }

    let mut seed = seed.to_vec();
    centre_on_median(&mut seed);

    let measurements = graph.measurements();
    let m = measurements.len();
    let sigma: Vec<f64> = measurements.iter().map(|meas| weighting.sigma(meas)).collect();
    if let Some(k) = sigma.iter().position(|s| !s.is_finite()) {
        let bad = &measurements[k];
        return Err(SkyoffError::Solver(format!(
            "pair ({}, {}) has no usable weight under {}",
            bad.i, bad.j, weighting
        )));
    }

    if m == 0 {
        warn!("No pairwise measurements; returning the seed unchanged");
        let pass = FitPass {
            offsets: seed.clone(),
            uncertainties: vec![f64::INFINITY; n],
            iterations: 0,
            termination: Termination::Gradient,
            cost: 0.0,
        };
        return Ok(OffsetSolution {
            seed,
            unweighted: pass.clone(),
            weighted: pass,
            reduced_chi_square: None,
            residuals: Vec::new(),
        });
    }

    let dof = m.saturating_sub(n);

    // Pass 1: unweighted, covariance scaled by the residual variance.
    let model = PairwiseOffsetModel::new(n, measurements);
    let report = levenberg_marquardt(&model, Array1::from(seed.clone()), params)?;
    let scale = if dof > 0 {
        2.0 * report.cost / dof as f64
    } else {
        f64::INFINITY
    };
    let uncertainties = covariance_sigma(&model, &report.params, scale);
    let mut offsets = report.params.to_vec();
    let shift = centre_on_median(&mut offsets);
    info!(
        iterations = report.iterations,
        cost = report.cost,
        shift,
        "Unweighted fit complete"
    );
    let unweighted = FitPass {
        offsets,
        uncertainties,
        iterations: report.iterations,
        termination: report.termination,
        cost: report.cost,
    };

    // Pass 2: weighted by the proxy, absolute covariance.
    let weighted_model = PairwiseOffsetModel::new(n, measurements).with_sigma(sigma.clone());
    let report = levenberg_marquardt(
        &weighted_model,
        Array1::from(unweighted.offsets.clone()),
        params,
    )?;
    let uncertainties = covariance_sigma(&weighted_model, &report.params, 1.0);
    let mut offsets = report.params.to_vec();
    let shift = centre_on_median(&mut offsets);
    info!(
        iterations = report.iterations,
        cost = report.cost,
        shift,
        "Weighted fit complete"
    );
    let weighted = FitPass {
        offsets,
        uncertainties,
        iterations: report.iterations,
        termination: report.termination,
        cost: report.cost,
    };

    let predicted = model.predict(&weighted.offsets);
    let residuals: Vec<ObservationResidual> = measurements
        .iter()
        .zip(&predicted)
        .zip(&sigma)
        .map(|((meas, &pred), &proxy)| ObservationResidual {
            i: meas.i,
            j: meas.j,
            observed: meas.offset,
            predicted: pred,
            residual: pred - meas.offset,
            weight_proxy: proxy,
        })
        .collect();

    let reduced_chi_square = (dof > 0).then(|| {
        residuals
            .iter()
            .map(|r| (r.residual / r.weight_proxy).powi(2))
            .sum::<f64>()
            / dof as f64
    });
    if let Some(chi2) = reduced_chi_square {
        info!(chi2, observations = m, images = n, "Reduced chi-square");
    } else {
        warn!(observations = m, images = n, "No degrees of freedom for chi-square");
    }

    Ok(OffsetSolution {
        seed,
        unweighted,
        weighted,
        reduced_chi_square,
        residuals,
    })
}

/// Square roots of the diagonal of `scale * pinv(J^T J)`.
fn covariance_sigma(model: &PairwiseOffsetModel, params: &Array1<f64>, scale: f64) -> Vec<f64> {
    let jac = model.jacobian(params);
    let cov = symmetric_pinv(&jac.t().dot(&jac));
    cov.diag()
        .iter()
        .map(|&v| {
            if scale.is_finite() {
                (v * scale).max(0.0).sqrt()
            } else {
                f64::INFINITY
            }
        })
        .collect()
}
