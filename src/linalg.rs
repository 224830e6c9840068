//! Small dense linear algebra on `ndarray` matrices
//!
//! Only what the Gaussian process and ridge regression need: a Cholesky
//! factorisation of a symmetric positive definite matrix and the two
//! triangular solves that go with it.

use ndarray::{Array1, Array2};

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Lower-triangular Cholesky factor `L` with `a = L Lᵀ`.
///
/// Returns `None` if `a` is not square or not positive definite.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return None;
    }
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        // Pivots that cancel down to rounding noise mean a singular matrix.
        if !diag.is_finite() || diag <= PIVOT_TOLERANCE * a[[j, j]].abs().max(1.0) {
            return None;
        }
        let d = diag.sqrt();
        l[[j, j]] = d;
        for i in (j + 1)..n {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / d;
        }
    }
    Some(l)
}

/// Solve `L x = b` for lower-triangular `L`.
pub fn solve_lower(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut x = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= l[[i, k]] * x[k];
        }
        x[i] = s / l[[i, i]];
    }
    x
}

/// Solve `Lᵀ x = b` for lower-triangular `L`.
pub fn solve_lower_transpose(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut s = b[i];
        for k in (i + 1)..n {
            s -= l[[k, i]] * x[k];
        }
        x[i] = s / l[[i, i]];
    }
    x
}

/// Solve `a x = b` given the Cholesky factor of `a`.
pub fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    solve_lower_transpose(l, &solve_lower(l, b))
}
