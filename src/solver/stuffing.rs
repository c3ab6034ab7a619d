//! Matrix stuffing: converts a Lasso problem to conic solver format.
//!
//! The L1 term is moved into the constraints with an epigraph variable `t`:
//!
//! ```text
//! minimize    (1/2) wᵀ (AᵀA / n) w - (Aᵀy / n)ᵀ w + λ 1ᵀ t
//! subject to  w - t <= 0
//!            -w - t <= 0
//! ```
//!
//! which Clarabel accepts as `min (1/2) xᵀ P x + qᵀ x` subject to
//! `G x + s = h`, `s` in the nonnegative cone, with `x = [w; t]`.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CscMatrix;

use crate::sparse::BlockBuilder;

/// Column layout of the stacked optimization variable `x = [w; t]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableMap {
    /// Number of coefficients `d`. `w` occupies `0..d`, `t` occupies `d..2d`.
    pub dim: usize,
}

impl VariableMap {
    pub fn total_vars(&self) -> usize {
        2 * self.dim
    }

    /// Extract `w` from a primal solution.
    pub fn coefficients(&self, x: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(&x[..self.dim])
    }

    /// Extract `t` from a primal solution.
    pub fn bounds(&self, x: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(&x[self.dim..self.total_vars()])
    }
}

/// Lasso quadratic program in Clarabel's standard form.
#[derive(Debug)]
pub struct StuffedProblem {
    /// Quadratic cost, upper triangle only.
    pub p: CscMatrix<f64>,
    pub q: Vec<f64>,
    /// Constraint matrix `G`.
    pub g: CscMatrix<f64>,
    pub h: Vec<f64>,
    pub var_map: VariableMap,
}

impl StuffedProblem {
    /// Number of constraint rows. All of them lie in the nonnegative cone.
    pub fn nonneg_rows(&self) -> usize {
        self.h.len()
    }
}

/// Build the epigraph form of `min (1/2n)||y - Aw||² + λ||w||₁`.
pub fn stuff_lasso(design: &DMatrix<f64>, targets: &DVector<f64>, lambda: f64) -> StuffedProblem {
    let (n, d) = design.shape();
    let var_map = VariableMap { dim: d };
    let total = var_map.total_vars();
    let inv_n = 1.0 / n.max(1) as f64;

    let gram = design.tr_mul(design) * inv_n;
    let p = BlockBuilder::new(total, total)
        .upper_triangle(0, 0, &gram)
        .build();

    let correlation = design.tr_mul(targets) * inv_n;
    let q = correlation
        .iter()
        .map(|c| -c)
        .chain(std::iter::repeat(lambda).take(d))
        .collect();

    // s = t - w >= 0  and  s = t + w >= 0
    let g = BlockBuilder::new(2 * d, total)
        .diagonal(0, 0, d, 1.0)
        .diagonal(0, d, d, -1.0)
        .diagonal(d, 0, d, -1.0)
        .diagonal(d, d, d, -1.0)
        .build();

    StuffedProblem {
        p,
        q,
        g,
        h: vec![0.0; 2 * d],
        var_map,
    }
}
