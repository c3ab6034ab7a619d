//! Elliptically distributed contexts.
//!
//! A mixing matrix `A` (`dim x ell`, entries `U(-1, 1)`) is fixed when the
//! environment is built. Each round every arm gets `R · A u`, with `u` uniform
//! on the unit sphere of `R^ell` and a standard normal radius `R`.

use nalgebra::{DMatrix, DVector};
use rand::Rng;

use super::sampling::{sparse_ground_truth, standard_normal, uniform_matrix};
use super::{check_dims, Environment, GroundTruth, Outcome};
use crate::error::{BanditError, Result};

#[derive(Debug, Clone)]
pub struct Elliptical<R> {
    arms: usize,
    dim: usize,
    mixing: DMatrix<f64>,
    truth: GroundTruth,
    rng: R,
    current: Option<DMatrix<f64>>,
}

impl<R: Rng> Elliptical<R> {
    pub fn new(arms: usize, dim: usize, sparsity: usize, ell: usize, mut rng: R) -> Result<Self> {
        check_dims(arms, dim, sparsity)?;
        if ell == 0 {
            return Err(BanditError::InvalidConfig(
                "elliptical parameter ell must be positive".into(),
            ));
        }
        let mixing = uniform_matrix(&mut rng, dim, ell, -1.0, 1.0);
        let truth = GroundTruth::new(sparse_ground_truth(&mut rng, dim, sparsity));
        Ok(Elliptical {
            arms,
            dim,
            mixing,
            truth,
            rng,
            current: None,
        })
    }

    /// Latent dimension `ell` of the mixing matrix.
    pub fn ell(&self) -> usize {
        self.mixing.ncols()
    }

    fn unit_direction(&mut self) -> DVector<f64> {
        let ell = self.ell();
        loop {
            let u = DVector::from_fn(ell, |_, _| standard_normal(&mut self.rng));
            let norm = u.norm();
            if norm > 0.0 {
                return u / norm;
            }
        }
    }
}

impl<R: Rng> Environment for Elliptical<R> {
    fn arms(&self) -> usize {
        self.arms
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn context(&mut self) -> &DMatrix<f64> {
        let mut x = DMatrix::zeros(self.arms, self.dim);
        for k in 0..self.arms {
            let u = self.unit_direction();
            let radius = standard_normal(&mut self.rng);
            let row = (&self.mixing * u) * radius;
            x.set_row(k, &row.transpose());
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
