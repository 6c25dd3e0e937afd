//! Damped (Levenberg-Marquardt) nonlinear least squares.
//!
//! The damping term acts as an adaptive trust region: it shrinks after every
//! accepted step and grows after every rejected one.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SkyoffError};

use super::linalg::cholesky_solve;

/// Floor for diagonal scaling so columns without observations stay solvable.
const MIN_DIAGONAL: f64 = 1e-12;

const MAX_DAMPING: f64 = 1e16;

/// A least-squares problem `min 0.5 * |r(p)|^2`.
pub trait LeastSquaresProblem {
    fn parameter_count(&self) -> usize;

    fn residuals(&self, params: &Array1<f64>) -> Array1<f64>;

    /// Jacobian of the residuals, shape `(residuals, parameters)`.
    fn jacobian(&self, params: &Array1<f64>) -> Array2<f64>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Maximum number of accepted-or-rejected Jacobian evaluations (default: 200).
    pub max_iterations: usize,
    /// Relative cost reduction below which the fit stops (default: 1e-10).
    pub ftol: f64,
    /// Relative step size below which the fit stops (default: 1e-10).
    pub xtol: f64,
    /// Gradient infinity norm below which the fit stops (default: 1e-12).
    pub gtol: f64,
    /// Starting damping factor (default: 1e-3).
    pub initial_damping: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_damping: 1e-3,
        }
    }
}

/// Why the solver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    Gradient,
    Cost,
    Step,
    /// Damping grew without finding a better point.
    Stalled,
    MaxIterations,
}

#[derive(Clone, Debug)]
pub struct LevMarReport {
    pub params: Array1<f64>,
    /// `0.5 * |r|^2` at `params`.
    pub cost: f64,
    pub iterations: usize,
    pub termination: Termination,
}

impl LevMarReport {
    pub fn converged(&self) -> bool {
        !matches!(self.termination, Termination::MaxIterations)
    }
}

fn half_squared_norm(r: &Array1<f64>) -> f64 {
    0.5 * r.dot(r)
}

pub fn levenberg_marquardt<P: LeastSquaresProblem + ?Sized>(
    problem: &P,
    initial: Array1<f64>,
    params: &SolverParams,
) -> Result<LevMarReport> {
    if initial.len() != problem.parameter_count() {
        return Err(SkyoffError::Solver(format!(
            "initial guess has {} parameters, expected {}",
            initial.len(),
            problem.parameter_count()
        )));
    }

    let mut x = initial;
    let mut r = problem.residuals(&x);
    let mut cost = half_squared_norm(&r);
    if !cost.is_finite() {
        return Err(SkyoffError::Solver("non-finite initial cost".into()));
    }
    let mut damping = params.initial_damping;

    for iteration in 0..params.max_iterations {
        let jac = problem.jacobian(&x);
        let normal = jac.t().dot(&jac);
        let gradient = jac.t().dot(&r);

        let g_norm = gradient.iter().fold(0.0f64, |acc, g| acc.max(g.abs()));
        if g_norm <= params.gtol {
            return Ok(finish(x, cost, iteration, Termination::Gradient));
        }

        let diagonal: Array1<f64> = normal.diag().mapv(|d| d.max(MIN_DIAGONAL));
        loop {
            let mut damped = normal.clone();
            for k in 0..damped.nrows() {
                damped[[k, k]] += damping * diagonal[k];
            }
            let rhs = gradient.mapv(|g| -g);
            let Some(step) = cholesky_solve(&damped, &rhs) else {
                damping *= 10.0;
                if damping > MAX_DAMPING {
                    return Ok(finish(x, cost, iteration, Termination::Stalled));
                }
                continue;
            };

            let step_norm = step.dot(&step).sqrt();
            let x_norm = x.dot(&x).sqrt();
            if step_norm <= params.xtol * (x_norm + params.xtol) {
                return Ok(finish(x, cost, iteration, Termination::Step));
            }

            let candidate = &x + &step;
            let r_new = problem.residuals(&candidate);
            let cost_new = half_squared_norm(&r_new);

            if cost_new.is_finite() && cost_new < cost {
                let reduction = cost - cost_new;
                let previous = cost;
                x = candidate;
                r = r_new;
                cost = cost_new;
                damping = (damping / 10.0).max(f64::MIN_POSITIVE);
                debug!(iteration, cost, damping, "Accepted step");
                if reduction <= params.ftol * previous {
                    return Ok(finish(x, cost, iteration + 1, Termination::Cost));
                }
                break;
            }

            damping *= 10.0;
            if damping > MAX_DAMPING {
                return Ok(finish(x, cost, iteration, Termination::Stalled));
            }
        }
    }

    Ok(finish(x, cost, params.max_iterations, Termination::MaxIterations))
}

fn finish(params: Array1<f64>, cost: f64, iterations: usize, termination: Termination) -> LevMarReport {
    debug!(iterations, cost, ?termination, "Least-squares fit finished");
    LevMarReport {
        params,
        cost,
        iterations,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// r(p) = [p0 - 3, 10 * (p1 - p0^2)] (scaled Rosenbrock-like valley).
    struct Valley;

    impl LeastSquaresProblem for Valley {
        fn parameter_count(&self) -> usize {
            2
        }

        fn residuals(&self, p: &Array1<f64>) -> Array1<f64> {
            array![p[0] - 3.0, 10.0 * (p[1] - p[0] * p[0])]
        }

        fn jacobian(&self, p: &Array1<f64>) -> Array2<f64> {
            array![[1.0, 0.0], [-20.0 * p[0], 10.0]]
        }
    }

    #[test]
    fn test_nonlinear_valley_converges() {
        let report =
            levenberg_marquardt(&Valley, array![0.0, 0.0], &SolverParams::default()).unwrap();
        assert!(report.converged());
        assert!((report.params[0] - 3.0).abs() < 1e-6);
        assert!((report.params[1] - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_wrong_parameter_count() {
        assert!(levenberg_marquardt(&Valley, array![0.0], &SolverParams::default()).is_err());
    }
}
