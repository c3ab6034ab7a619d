//! Gaussian contexts correlated across arms.
//!
//! Each feature column is drawn from `N(0, V)` with
//! `V = (1 - ρ²) I_K + ρ² 11ᵀ`. When `x_max` is set, arm vectors longer than
//! `x_max` are rescaled onto the ball of radius `x_max`.

use nalgebra::DMatrix;
use rand::Rng;

use super::sampling::{equicorrelated_normal, sparse_ground_truth};
use super::{check_dims, check_rho_sq, Environment, GroundTruth, Outcome};
use crate::error::{BanditError, Result};

#[derive(Debug, Clone)]
pub struct Gaussian<R> {
    arms: usize,
    dim: usize,
    rho_sq: f64,
    x_max: Option<f64>,
    truth: GroundTruth,
    rng: R,
    current: Option<DMatrix<f64>>,
}

impl<R: Rng> Gaussian<R> {
    pub fn new(
        arms: usize,
        dim: usize,
        sparsity: usize,
        x_max: Option<f64>,
        rho_sq: f64,
        mut rng: R,
    ) -> Result<Self> {
        check_dims(arms, dim, sparsity)?;
        check_rho_sq(rho_sq)?;
        if let Some(m) = x_max {
            if !m.is_finite() || m <= 0.0 {
                return Err(BanditError::InvalidConfig(format!(
                    "x_max must be positive, got {m}"
                )));
            }
        }
        let truth = GroundTruth::new(sparse_ground_truth(&mut rng, dim, sparsity));
        Ok(Gaussian {
            arms,
            dim,
            rho_sq,
            x_max,
            truth,
            rng,
            current: None,
        })
    }
}

impl<R: Rng> Environment for Gaussian<R> {
    fn arms(&self) -> usize {
        self.arms
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn context(&mut self) -> &DMatrix<f64> {
        let mut x = equicorrelated_normal(&mut self.rng, self.arms, self.dim, self.rho_sq);
        if let Some(x_max) = self.x_max {
            for mut row in x.row_iter_mut() {
                let norm = row.norm();
                if norm > x_max {
                    row *= x_max / norm;
                }
            }
        }
        self.current.insert(x)
    }

    fn pull(&mut self, action: usize) -> Result<Outcome> {
        self.truth.pull(self.current.as_ref(), action, &mut self.rng)
    }

    fn ground_truth(&self) -> &GroundTruth {
        &self.truth
    }
}
