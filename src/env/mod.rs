//! Synthetic linear bandit environments.
//!
//! All variants share the [`Environment`] contract and differ only in how the
//! per-round `arms x dim` context matrix is sampled. Rewards are linear in a
//! hidden ground-truth vector plus standard normal noise.

pub mod elliptical;
pub mod gaussian;
pub mod hard_instance;
pub mod sampling;
pub mod uniform;

pub use elliptical::Elliptical;
pub use gaussian::Gaussian;
pub use hard_instance::HardInstance;
pub use uniform::Uniform;

use nalgebra::{DMatrix, DVector};
use rand::Rng;

use crate::error::{BanditError, Result};

/// Reward and instantaneous regret of one pull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub reward: f64,
    /// Best expected reward this round minus the chosen arm's. Never negative.
    pub regret: f64,
}

/// A synthetic linear contextual bandit.
pub trait Environment {
    fn arms(&self) -> usize;

    fn dim(&self) -> usize;

    /// Sample this round's context matrix. Call once per round before
    /// [`pull`](Environment::pull).
    fn context(&mut self) -> &DMatrix<f64>;

    /// Play `action` against the current context.
    fn pull(&mut self, action: usize) -> Result<Outcome>;

    /// The hidden coefficient vector. Only for diagnostics.
    fn ground_truth(&self) -> &GroundTruth;

    /// Estimated nonzeros where the truth is zero.
    fn false_positive(&self, estimate: &DVector<f64>) -> usize {
        self.ground_truth().false_positive(estimate)
    }

    /// True nonzeros the estimate sets to exactly zero.
    fn false_negative(&self, estimate: &DVector<f64>) -> usize {
        self.ground_truth().false_negative(estimate)
    }

    fn error_l1(&self, estimate: &DVector<f64>) -> f64 {
        self.ground_truth().error_l1(estimate)
    }

    fn error_l2(&self, estimate: &DVector<f64>) -> f64 {
        self.ground_truth().error_l2(estimate)
    }
}

/// Ground-truth coefficients and the reward model built on them.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruth {
    beta: DVector<f64>,
}

impl GroundTruth {
    pub fn new(beta: DVector<f64>) -> Self {
        GroundTruth { beta }
    }

    pub fn beta(&self) -> &DVector<f64> {
        &self.beta
    }

    /// Indices of the nonzero coefficients.
    pub fn support(&self) -> Vec<usize> {
        (0..self.beta.len()).filter(|&i| self.beta[i] != 0.0).collect()
    }

    /// Reward and regret of `action` under `contexts`, with `N(0, 1)` noise.
    pub fn pull<R: Rng + ?Sized>(
        &self,
        contexts: Option<&DMatrix<f64>>,
        action: usize,
        rng: &mut R,
    ) -> Result<Outcome> {
        let contexts = contexts
            .ok_or_else(|| BanditError::InvalidConfig("pull called before context".into()))?;
        if action >= contexts.nrows() {
            return Err(BanditError::shape(
                format!("arm < {}", contexts.nrows()),
                format!("arm {action}"),
            ));
        }

        let expected = contexts * &self.beta;
        let chosen = expected[action];
        let best = expected.max();
        let noise = sampling::standard_normal(rng);

        Ok(Outcome {
            reward: chosen + noise,
            regret: best - chosen,
        })
    }

    pub fn false_positive(&self, estimate: &DVector<f64>) -> usize {
        self.beta
            .iter()
            .zip(estimate.iter())
            .filter(|(&truth, &est)| truth == 0.0 && est != 0.0)
            .count()
    }

    pub fn false_negative(&self, estimate: &DVector<f64>) -> usize {
        self.beta
            .iter()
            .zip(estimate.iter())
            .filter(|(&truth, &est)| truth != 0.0 && est == 0.0)
            .count()
    }

    pub fn error_l1(&self, estimate: &DVector<f64>) -> f64 {
        (&self.beta - estimate).lp_norm(1)
    }

    pub fn error_l2(&self, estimate: &DVector<f64>) -> f64 {
        (&self.beta - estimate).norm()
    }
}

/// Shared constructor checks.
pub(crate) fn check_dims(arms: usize, dim: usize, sparsity: usize) -> Result<()> {
    if arms == 0 {
        return Err(BanditError::InvalidConfig("at least one arm is required".into()));
    }
    if dim == 0 {
        return Err(BanditError::InvalidConfig("feature dimension must be positive".into()));
    }
    if sparsity > dim {
        return Err(BanditError::InvalidConfig(format!(
            "sparsity {sparsity} exceeds dimension {dim}"
        )));
    }
    Ok(())
}

pub(crate) fn check_rho_sq(rho_sq: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&rho_sq) {
        return Err(BanditError::InvalidConfig(format!(
            "rho_sq must lie in [0, 1], got {rho_sq}"
        )));
    }
    Ok(())
}
