pub mod bootstrap;
pub mod levmar;
pub mod linalg;
pub mod solver;

pub use bootstrap::{bootstrap_offsets, zero_seed, BootstrapResult, NodeStatus};
pub use levmar::{levenberg_marquardt, LeastSquaresProblem, SolverParams, Termination};
pub use solver::{solve_offsets, FitPass, ObservationResidual, OffsetSolution, PairwiseOffsetModel, WeightProxy};

use crate::stats::median;

/// Subtract the median from every offset, returning the median removed.
///
/// Offsets are only determined up to a common constant; the median fixes it.
pub fn centre_on_median(offsets: &mut [f64]) -> f64 {
    let Some(m) = median(offsets) else {
        return 0.0;
    };
    for v in offsets.iter_mut() {
        *v -= m;
    }
    m
}
