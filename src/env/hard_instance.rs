//! Three-arm instance where naive support recovery is hard.
//!
//! The truth is `(1, 0.1, 1, 0, ..., 0)`. The first three features come from
//! one of two fixed blocks (the first with probability 0.3); the remaining
//! `dim - 3` features are equicorrelated Gaussian noise across arms.

use nalgebra::{DMatrix, DVector, Matrix3};
use rand::Rng;

use super::sampling::equicorrelated_normal;
use super::{check_rho_sq, Environment, GroundTruth, Outcome};
use crate::error::{BanditError, Result};

/// Number of arms in the hard instance.
pub const HARD_ARMS: usize = 3;

/// Size of the informative feature block.
pub const SUPPORT_DIM: usize = 3;

/// Probability of drawing the first support block.
const FIRST_BLOCK_PROB: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct HardInstance<R> {
    dim: usize,
    rho_sq: f64,
    blocks: [Matrix3<f64>; 2],
    truth: GroundTruth,
    rng: R,
    current: Option<DMatrix<f64>>,
}

impl<R: Rng> HardInstance<R> {
    pub fn new(dim: usize, rho_sq: f64, rng: R) -> Result<Self> {
        if dim < SUPPORT_DIM {
            return Err(BanditError::InvalidConfig(format!(
                "hard instance needs dim >= {SUPPORT_DIM}, got {dim}"
            )));
        }
        check_rho_sq(rho_sq)?;

        let mut beta = DVector::zeros(dim);
        beta[0] = 1.0;
        beta[1] = 0.1;
        beta[2] = 1.0;

        #[rustfmt::skip]
        let blocks = [
            Matrix3::new(
                1.0, 0.0, 0.0,
                0.0, 1.0, 0.0,
                0.9, 0.5, 0.0,
            ),
            Matrix3::new(
                0.0, 1.0, 0.0,
                0.0, 0.0, 1.0,
                0.0, 0.5, 0.9,
            ),
        ];

        Ok(HardInstance {
            dim,
            rho_sq,
            blocks,
            truth: GroundTruth::new(beta),
            rng,
            current: None,
        })
    }
}

impl<R: Rng> Environment for HardInstance<R> {
    fn arms(&self) -> usize {
        HARD_ARMS
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn context(&mut self) -> &DMatrix<f64> {
        let block = if self.rng.random::<f64>() < FIRST_BLOCK_PROB {
            &self.blocks[0]
        } else {
            &self.blocks[1]
        };
        let noise = equicorrelated_normal(
            &mut self.rng,
            HARD_ARMS,
            self.dim - SUPPORT_DIM,
            self.rho_sq,
        );

        let mut x = DMatrix::zeros(HARD_ARMS, self.dim);
        x.fixed_view_mut::<3, 3>(0, 0).copy_from(block);
        x.columns_mut(SUPPORT_DIM, self.dim - SUPPORT_DIM)
            .copy_from(&noise);
        self.current.insert(x)
    }

    fn pull(&mut self, action: usize) -> Result<Outcome> {
        self.truth.pull(self.current.as_ref(), action, &mut self.rng)
    }

    fn ground_truth(&self) -> &GroundTruth {
        &self.truth
    }
}
