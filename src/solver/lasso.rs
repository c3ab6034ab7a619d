//! L1-penalized least squares.
//!
//! Every backend minimizes
//!
//! ```text
//! (1 / 2n) ||y - A w||² + λ ||w||₁
//! ```
//!
//! without an intercept. Coefficients that the penalty kills must come back as
//! exact zeros, since the estimator's support is read off the nonzero pattern.

use nalgebra::{DMatrix, DVector};
use tracing::warn;

use super::least_squares::ensure_finite;
use crate::error::{BanditError, Result};

/// A solver for the Lasso problem.
pub trait LassoSolver {
    /// Fit coefficients for `design` (n x d) and `targets` (n) with penalty
    /// `lambda >= 0`. Must accept `n < d`.
    fn fit(&self, design: &DMatrix<f64>, targets: &DVector<f64>, lambda: f64)
        -> Result<DVector<f64>>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}

/// Coordinate descent settings.
#[derive(Debug, Clone)]
pub struct LassoSettings {
    /// Maximum number of full passes over the coordinates.
    pub max_iter: usize,
    /// Relative tolerance on coefficient updates and on the duality gap.
    pub tol: f64,
}

impl Default for LassoSettings {
    fn default() -> Self {
        LassoSettings {
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Cyclic coordinate descent with soft thresholding.
#[derive(Debug, Clone, Default)]
pub struct CoordinateDescent {
    pub settings: LassoSettings,
}

impl CoordinateDescent {
    pub fn new(settings: LassoSettings) -> Self {
        CoordinateDescent { settings }
    }
}

impl LassoSolver for CoordinateDescent {
    fn fit(
        &self,
        design: &DMatrix<f64>,
        targets: &DVector<f64>,
        lambda: f64,
    ) -> Result<DVector<f64>> {
        check_problem(design, targets, lambda)?;

        let (n, d) = design.shape();
        let mut w = DVector::zeros(d);
        if n == 0 || d == 0 {
            return Ok(w);
        }

        // Work with the objective multiplied by n: (1/2)||y - Aw||² + alpha ||w||₁.
        let alpha = lambda * n as f64;
        let col_sq: Vec<f64> = (0..d).map(|j| design.column(j).norm_squared()).collect();
        let gap_tol = self.settings.tol * targets.norm_squared();

        let mut residual = targets.clone();
        let mut converged = false;

        for iter in 0..self.settings.max_iter {
            let mut w_max = 0.0_f64;
            let mut dw_max = 0.0_f64;

            for j in 0..d {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let col = design.column(j);
                let w_old = w[j];
                let rho = col.dot(&residual) + col_sq[j] * w_old;
                let w_new = soft_threshold(rho, alpha) / col_sq[j];

                if w_new != w_old {
                    residual.axpy(w_old - w_new, &col, 1.0);
                    w[j] = w_new;
                }

                dw_max = dw_max.max((w_new - w_old).abs());
                w_max = w_max.max(w_new.abs());
            }

            let last = iter + 1 == self.settings.max_iter;
            if w_max == 0.0 || dw_max / w_max <= self.settings.tol || last {
                let gap = duality_gap(design, targets, &w, &residual, alpha);
                if gap <= gap_tol {
                    converged = true;
                    break;
                }
            }
        }

        if !converged {
            warn!(
                max_iter = self.settings.max_iter,
                rows = n,
                cols = d,
                lambda,
                "coordinate descent did not converge"
            );
        }

        ensure_finite(&w, "lasso coefficients")?;
        Ok(w)
    }

    fn name(&self) -> &'static str {
        "cd"
    }
}

/// Validate the common Lasso inputs.
pub(crate) fn check_problem(design: &DMatrix<f64>, targets: &DVector<f64>, lambda: f64) -> Result<()> {
    if design.nrows() != targets.len() {
        return Err(BanditError::shape(
            format!("{} targets", design.nrows()),
            format!("{} targets", targets.len()),
        ));
    }
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(BanditError::InvalidConfig(format!(
            "lasso penalty must be finite and non-negative, got {lambda}"
        )));
    }
    Ok(())
}

/// `sign(x) * max(|x| - t, 0)`, returning an exact zero inside the band.
pub fn soft_threshold(x: f64, t: f64) -> f64 {
    if x > t {
        x - t
    } else if x < -t {
        x + t
    } else {
        0.0
    }
}

/// Duality gap of the n-scaled Lasso objective at `w` with residual `y - Aw`.
fn duality_gap(
    design: &DMatrix<f64>,
    targets: &DVector<f64>,
    w: &DVector<f64>,
    residual: &DVector<f64>,
    alpha: f64,
) -> f64 {
    let dual_norm = design.tr_mul(residual).amax();
    let r_norm2 = residual.norm_squared();
    let w_l1 = w.lp_norm(1);

    let (scale, mut gap) = if dual_norm > alpha {
        let scale = alpha / dual_norm;
        (scale, 0.5 * (r_norm2 + r_norm2 * scale * scale))
    } else {
        (1.0, r_norm2)
    };
    gap += alpha * w_l1 - scale * residual.dot(targets);
    gap
}

/// Value of the (unscaled) Lasso objective, for diagnostics and tests.
pub fn lasso_objective(design: &DMatrix<f64>, targets: &DVector<f64>, w: &DVector<f64>, lambda: f64) -> f64 {
    let n = design.nrows().max(1) as f64;
    let residual = targets - design * w;
    residual.norm_squared() / (2.0 * n) + lambda * w.lp_norm(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-4;

    fn orthogonal_design() -> (DMatrix<f64>, DVector<f64>) {
        // Orthogonal columns with squared norm 4 (so A^T A / n = I for n = 4).
        let a = DMatrix::from_row_slice(
            4,
            2,
            &[1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0],
        );
        // y = 3 * col0 + 0.05 * col1
        let y = &a.column(0) * 3.0 + &a.column(1) * 0.05;
        (a, y)
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-1.0, 1.0), 0.0);
    }

    #[test]
    fn test_orthogonal_design_closed_form() {
        // With A^T A / n = I the Lasso solution is soft_threshold(A^T y / n, λ).
        let (a, y) = orthogonal_design();
        let w = CoordinateDescent::default()
            .fit(&a, &y, 0.1)
            .expect("solve failed");

        assert!((w[0] - 2.9).abs() < TOL, "Expected 2.9, got {}", w[0]);
        assert_eq!(w[1], 0.0, "small coefficient must be exactly zero");
    }

    #[test]
    fn test_large_penalty_gives_zero_vector() {
        let (a, y) = orthogonal_design();
        let w = CoordinateDescent::default()
            .fit(&a, &y, 10.0)
            .expect("solve failed");
        assert!(w.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_more_features_than_rows() {
        let a = DMatrix::from_row_slice(
            2,
            5,
            &[1.0, 0.2, -0.3, 0.5, 0.0, 0.4, 1.0, 0.1, -0.2, 0.3],
        );
        let y = DVector::from_vec(vec![1.0, 0.5]);
        let w = CoordinateDescent::default()
            .fit(&a, &y, 0.05)
            .expect("solve failed");

        assert_eq!(w.len(), 5);
        assert!(w.iter().all(|v| v.is_finite()));
        assert!(w.iter().filter(|&&v| v == 0.0).count() >= 3);
    }

    #[test]
    fn test_zero_column_stays_zero() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let w = CoordinateDescent::default()
            .fit(&a, &y, 0.01)
            .expect("solve failed");
        assert_eq!(w[1], 0.0);
        assert!(w[0] > 0.9);
    }

    #[test]
    fn test_objective_not_worse_than_zero() {
        let (a, y) = orthogonal_design();
        let lambda = 0.5;
        let w = CoordinateDescent::default()
            .fit(&a, &y, lambda)
            .expect("solve failed");
        let zero = DVector::zeros(2);
        assert!(lasso_objective(&a, &y, &w, lambda) <= lasso_objective(&a, &y, &zero, lambda));
    }

    #[test]
    fn test_negative_penalty_rejected() {
        let (a, y) = orthogonal_design();
        assert!(matches!(
            CoordinateDescent::default().fit(&a, &y, -1.0),
            Err(BanditError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let (a, _) = orthogonal_design();
        let y = DVector::zeros(3);
        assert!(matches!(
            CoordinateDescent::default().fit(&a, &y, 0.1),
            Err(BanditError::ShapeMismatch { .. })
        ));
    }
}
