//! Contexts with i.i.d. `U(-1, 1)` entries.

use nalgebra::DMatrix;
use rand::Rng;

use super::sampling::{sparse_ground_truth, uniform_matrix};
use super::{check_dims, Environment, GroundTruth, Outcome};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Uniform<R> {
    arms: usize,
    dim: usize,
    truth: GroundTruth,
    rng: R,
    current: Option<DMatrix<f64>>,
}

impl<R: Rng> Uniform<R> {
    pub fn new(arms: usize, dim: usize, sparsity: usize, mut rng: R) -> Result<Self> {
        check_dims(arms, dim, sparsity)?;
        let truth = GroundTruth::new(sparse_ground_truth(&mut rng, dim, sparsity));
        Ok(Uniform {
            arms,
            dim,
            truth,
            rng,
            current: None,
        })
    }
}

impl<R: Rng> Environment for Uniform<R> {
    fn arms(&self) -> usize {
        self.arms
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn context(&mut self) -> &DMatrix<f64> {
        let x = uniform_matrix(&mut self.rng, self.arms, self.dim, -1.0, 1.0);
        self.current.insert(x)
    }

    fn pull(&mut self, action: usize) -> Result<Outcome> {
        self.truth.pull(self.current.as_ref(), action, &mut self.rng)
    }

    fn ground_truth(&self) -> &GroundTruth {
        &self.truth
    }
}
