//! Unregularized least squares used for the support refit.
//!
//! The primary path solves the scaled normal equations
//! `(AᵀA / n) w = Aᵀy / n` with a Cholesky factorisation. When that system is
//! singular (fewer rows than columns, or a numerically rank-deficient Gram
//! matrix) the solve reports [`BanditError::Singular`] and [`least_squares`]
//! switches to a minimum-norm SVD solve of `A w ≈ y`. No intercept is fitted.

use nalgebra::{Cholesky, DMatrix, DVector};
use tracing::debug;

use crate::error::{BanditError, Result};

/// Smallest accepted ratio between the squared extreme Cholesky pivots.
///
/// The squared pivots bound the Gram matrix eigenvalues, so this is a cheap
/// reciprocal condition number test.
const MIN_PIVOT_RATIO: f64 = 1e-12;

/// Solve the least-squares problem `min ||y - A w||²`.
///
/// Never surfaces a singular design: the normal-equations solve falls back to
/// [`solve_lstsq`]. Only shape mismatches and non-finite results are errors.
pub fn least_squares(a: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() != y.len() {
        return Err(BanditError::shape(
            format!("{} targets", a.nrows()),
            format!("{} targets", y.len()),
        ));
    }
    if a.nrows() == 0 || a.ncols() == 0 {
        return Ok(DVector::zeros(a.ncols()));
    }

    let w = match solve_normal_equations(a, y) {
        Ok(w) => w,
        Err(BanditError::Singular(reason)) => {
            debug!(
                rows = a.nrows(),
                cols = a.ncols(),
                %reason,
                "normal equations singular, using SVD least squares"
            );
            solve_lstsq(a, y)?
        }
        Err(e) => return Err(e),
    };

    ensure_finite(&w, "least-squares coefficients")?;
    Ok(w)
}

/// Solve `(AᵀA / n) w = Aᵀy / n` directly.
///
/// # Errors
///
/// Returns [`BanditError::Singular`] when the Gram matrix cannot be
/// factorised reliably.
pub fn solve_normal_equations(a: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    let (n, k) = a.shape();
    if n < k {
        return Err(BanditError::Singular(format!(
            "{n} observations for {k} unknowns"
        )));
    }

    let scale = 1.0 / n as f64;
    let gram = a.tr_mul(a) * scale;
    let rhs = a.tr_mul(y) * scale;

    let chol = Cholesky::new(gram)
        .ok_or_else(|| BanditError::Singular("Gram matrix is not positive definite".into()))?;

    let (min_pivot, max_pivot) = chol
        .l_dirty()
        .diagonal()
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    if !(min_pivot * min_pivot >= MIN_PIVOT_RATIO * max_pivot * max_pivot) {
        return Err(BanditError::Singular(format!(
            "ill-conditioned Gram matrix (pivots {min_pivot:e}..{max_pivot:e})"
        )));
    }

    Ok(chol.solve(&rhs))
}

/// Minimum-norm least squares via SVD.
///
/// Singular values below `eps * max(n, k) * sigma_max` are treated as zero,
/// the usual `lstsq` cutoff.
pub fn solve_lstsq(a: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    let (n, k) = a.shape();
    let svd = a.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    let cutoff = f64::EPSILON * n.max(k) as f64 * sigma_max;

    svd.solve(y, cutoff)
        .map_err(|e| BanditError::SolverError(format!("SVD least squares failed: {e}")))
}

/// Reject vectors containing NaN or infinities.
pub(crate) fn ensure_finite(v: &DVector<f64>, what: &str) -> Result<()> {
    match v.iter().position(|x| !x.is_finite()) {
        Some(i) => Err(BanditError::NumericalError(format!(
            "{what}: non-finite value {} at index {i}",
            v[i]
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_exact_fit_full_rank() {
        // y = 2*x0 - x1
        let a = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        let y = DVector::from_vec(vec![2.0, -1.0, 1.0, 3.0]);

        let w = solve_normal_equations(&a, &y).expect("full rank");
        assert!((w[0] - 2.0).abs() < TOL, "got {}", w[0]);
        assert!((w[1] + 1.0).abs() < TOL, "got {}", w[1]);
    }

    #[test]
    fn test_underdetermined_is_singular() {
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            solve_normal_equations(&a, &y),
            Err(BanditError::Singular(_))
        ));
    }

    #[test]
    fn test_duplicate_columns_are_singular() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            solve_normal_equations(&a, &y),
            Err(BanditError::Singular(_))
        ));
    }

    #[test]
    fn test_fallback_gives_minimum_norm_solution() {
        // Collinear columns: any w0 + w1 = 1 fits; minimum norm is (0.5, 0.5).
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        let w = least_squares(&a, &y).expect("fallback never fails");
        assert!((w[0] - 0.5).abs() < 1e-8, "got {}", w[0]);
        assert!((w[1] - 0.5).abs() < 1e-8, "got {}", w[1]);
    }

    #[test]
    fn test_single_observation_many_columns() {
        let a = DMatrix::from_row_slice(1, 2, &[3.0, 4.0]);
        let y = DVector::from_vec(vec![5.0]);

        let w = least_squares(&a, &y).expect("fallback never fails");
        // Minimum-norm solution is y * a / ||a||² = (0.6, 0.8).
        assert!((w[0] - 0.6).abs() < 1e-8);
        assert!((w[1] - 0.8).abs() < 1e-8);
    }

    #[test]
    fn test_zero_design_returns_zero() {
        let a = DMatrix::zeros(3, 2);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let w = least_squares(&a, &y).expect("fallback never fails");
        assert_eq!(w, DVector::zeros(2));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = DMatrix::zeros(3, 2);
        let y = DVector::zeros(2);
        assert!(matches!(
            least_squares(&a, &y),
            Err(BanditError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&DVector::from_vec(vec![1.0, 2.0]), "v").is_ok());
        assert!(matches!(
            ensure_finite(&DVector::from_vec(vec![1.0, f64::NAN]), "v"),
            Err(BanditError::NumericalError(_))
        ));
    }
}
