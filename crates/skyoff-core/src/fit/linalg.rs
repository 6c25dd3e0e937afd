//! Small dense symmetric solvers for the normal equations.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2};

/// Eigenvalues below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Solve `a * x = b` for symmetric positive-definite `a` by Cholesky
/// factorisation. Returns `None` if `a` is not positive definite.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Some(x)
}

/// Moore-Penrose pseudo-inverse of a symmetric positive semi-definite matrix.
///
/// The normal matrix of a pure-difference model is singular (adding a
/// constant to every parameter leaves the residuals unchanged), so the
/// covariance is taken from the pseudo-inverse. Eigenvalues at or below
/// `RANK_TOLERANCE` times the largest are dropped.
pub fn symmetric_pinv(a: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    if n == 0 {
        return Array2::zeros((0, 0));
    }
    let eigen = SymmetricEigen::new(DMatrix::from_fn(n, n, |r, c| a[[r, c]]));
    let max = eigen.eigenvalues.amax();
    let cutoff = max * RANK_TOLERANCE;

    let mut out = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if lambda <= cutoff {
            continue;
        }
        let col = eigen.eigenvectors.column(k);
        for r in 0..n {
            for c in 0..n {
                out[[r, c]] += col[r] * col[c] / lambda;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cholesky_solves_spd_system() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let back = a.dot(&x);
        assert!((back[0] - 2.0).abs() < 1e-12);
        assert!((back[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_singular() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(cholesky_solve(&a, &array![1.0, 1.0]).is_none());
    }

    #[test]
    fn test_pinv_of_full_rank_is_inverse() {
        let a = array![[4.0, 1.0], [1.0, 3.0]];
        let p = symmetric_pinv(&a);
        let id = a.dot(&p);
        assert!((id[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((id[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(id[[0, 1]].abs() < 1e-12);
        assert!(id[[1, 0]].abs() < 1e-12);
    }

    #[test]
    fn test_pinv_of_zero_matrix_is_zero() {
        let p = symmetric_pinv(&Array2::<f64>::zeros((3, 3)));
        assert!(p.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pinv_of_graph_laplacian() {
        // Path graph 0-1-2: null space is the constant vector.
        let l = array![[1.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 1.0]];
        let p = symmetric_pinv(&l);
        // L P L == L
        let lpl = l.dot(&p).dot(&l);
        for (x, y) in lpl.iter().zip(l.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
        // P annihilates the constant vector.
        let ones = array![1.0, 1.0, 1.0];
        for v in p.dot(&ones).iter() {
            assert!(v.abs() < 1e-9);
        }
        // Closed form for the three-node path.
        let expected = [5.0 / 9.0, 2.0 / 9.0, 5.0 / 9.0];
        for (v, e) in p.diag().iter().zip(expected) {
            assert!((v - e).abs() < 1e-9);
        }
    }
}
