//! Numerical solvers used by the estimator.
//!
//! This module provides:
//! - Least squares with a singular-design fallback
//! - The [`LassoSolver`] trait with a coordinate-descent backend
//! - Matrix stuffing and a Clarabel-backed Lasso backend

pub mod clarabel;
pub mod lasso;
pub mod least_squares;
pub mod stuffing;

pub use self::clarabel::{ConicLasso, ConicRun, ConicSettings};
pub use lasso::{soft_threshold, CoordinateDescent, LassoSettings, LassoSolver};
pub use least_squares::{least_squares, solve_lstsq, solve_normal_equations};
pub use stuffing::{stuff_lasso, StuffedProblem, VariableMap};

use nalgebra::{DMatrix, DVector};

use crate::error::Result;

/// Lasso backend chosen at run time.
#[derive(Debug, Clone)]
pub enum SolverKind {
    /// Coordinate descent.
    CoordinateDescent(CoordinateDescent),
    /// Clarabel interior point.
    Conic(ConicLasso),
}

impl Default for SolverKind {
    fn default() -> Self {
        SolverKind::CoordinateDescent(CoordinateDescent::default())
    }
}

impl LassoSolver for SolverKind {
    fn fit(&self, design: &DMatrix<f64>, targets: &DVector<f64>, lambda: f64) -> Result<DVector<f64>> {
        match self {
            SolverKind::CoordinateDescent(s) => s.fit(design, targets, lambda),
            SolverKind::Conic(s) => s.fit(design, targets, lambda),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SolverKind::CoordinateDescent(s) => s.name(),
            SolverKind::Conic(s) => s.name(),
        }
    }
}
