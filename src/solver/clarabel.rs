//! Clarabel solver integration.
//!
//! [`ConicLasso`] hands the stuffed Lasso quadratic program to the Clarabel
//! interior-point solver. Interior-point iterates never land exactly on zero,
//! so coefficients within `zero_tol` of zero are snapped to `0.0` afterwards.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::lasso::{check_problem, lasso_objective, LassoSolver};
use super::least_squares::ensure_finite;
use super::stuffing::{stuff_lasso, StuffedProblem};
use crate::error::{BanditError, Result};

/// Conic solver settings.
#[derive(Debug, Clone)]
pub struct ConicSettings {
    /// Print solver output.
    pub verbose: bool,
    pub max_iter: u32,
    pub tol_gap_abs: f64,
    pub tol_gap_rel: f64,
    /// Coefficients with magnitude at or below this are set to exactly zero.
    pub zero_tol: f64,
}

impl Default for ConicSettings {
    fn default() -> Self {
        ConicSettings {
            verbose: false,
            max_iter: 200,
            tol_gap_abs: 1e-9,
            tol_gap_rel: 1e-9,
            zero_tol: 1e-6,
        }
    }
}

/// Primal iterate and diagnostics of one interior-point run.
#[derive(Debug, Clone)]
pub struct ConicRun {
    pub status: SolverStatus,
    /// `x = [w; t]` at termination, whatever the status.
    pub x: Vec<f64>,
    pub iterations: u32,
    /// Seconds.
    pub solve_time: f64,
}

impl ConicRun {
    /// Whether `x` can be trusted as a minimizer.
    pub fn converged(&self) -> bool {
        matches!(self.status, SolverStatus::Solved | SolverStatus::AlmostSolved)
    }

    /// Map a non-converged status to an error.
    fn check(&self) -> Result<()> {
        if self.converged() {
            return Ok(());
        }
        match self.status {
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => Err(
                BanditError::NumericalError(format!("Clarabel stopped with {:?}", self.status)),
            ),
            status => Err(BanditError::SolverError(format!(
                "Clarabel finished with status {status:?} after {} iterations",
                self.iterations
            ))),
        }
    }
}

/// Run Clarabel on a stuffed Lasso program.
pub fn solve(problem: &StuffedProblem, settings: &ConicSettings) -> Result<ConicRun> {
    let p = to_clarabel_csc(&problem.p);
    let g = to_clarabel_csc(&problem.g);
    let cones = [SupportedConeT::NonnegativeConeT(problem.nonneg_rows())];

    let clarabel_settings = DefaultSettingsBuilder::default()
        .verbose(settings.verbose)
        .max_iter(settings.max_iter)
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .build()
        .map_err(|e| BanditError::SolverError(format!("invalid Clarabel settings: {e}")))?;

    let mut solver = DefaultSolver::new(&p, &problem.q, &g, &problem.h, &cones, clarabel_settings);
    solver.solve();

    Ok(ConicRun {
        status: solver.solution.status,
        x: solver.solution.x.clone(),
        iterations: solver.info.iterations,
        solve_time: solver.solution.solve_time,
    })
}

/// Lasso backend built on Clarabel.
#[derive(Debug, Clone, Default)]
pub struct ConicLasso {
    pub settings: ConicSettings,
}

impl ConicLasso {
    pub fn new(settings: ConicSettings) -> Self {
        ConicLasso { settings }
    }
}

impl LassoSolver for ConicLasso {
    fn fit(
        &self,
        design: &DMatrix<f64>,
        targets: &DVector<f64>,
        lambda: f64,
    ) -> Result<DVector<f64>> {
        check_problem(design, targets, lambda)?;
        let (n, d) = design.shape();
        if n == 0 || d == 0 {
            return Ok(DVector::zeros(d));
        }

        let stuffed = stuff_lasso(design, targets, lambda);
        let run = solve(&stuffed, &self.settings)?;
        run.check()?;

        let mut w = stuffed.var_map.coefficients(&run.x);
        ensure_finite(&w, "conic lasso coefficients")?;
        let epigraph_gap = w
            .iter()
            .zip(stuffed.var_map.bounds(&run.x).iter())
            .map(|(wi, ti)| (ti - wi.abs()).abs())
            .fold(0.0_f64, f64::max);
        w.apply(|v| {
            if v.abs() <= self.settings.zero_tol {
                *v = 0.0;
            }
        });

        debug!(
            status = ?run.status,
            iterations = run.iterations,
            solve_time = run.solve_time,
            epigraph_gap,
            objective = lasso_objective(design, targets, &w, lambda),
            "clarabel lasso solve"
        );
        Ok(w)
    }

    fn name(&self) -> &'static str {
        "clarabel"
    }
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}
