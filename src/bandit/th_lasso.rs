//! Thresholded-Lasso bandit.
//!
//! Each round the estimator scores arms with its current sparse coefficient
//! vector `β` and plays the argmax (or a uniformly random arm while the
//! support is empty). After observing the reward it refits:
//!
//! 1. Lasso over the whole history with the decaying penalty `λ_t`.
//! 2. Keep features with `|β_i| > 4λ_t`.
//! 3. One refinement pass: keep features with `|β_i| > 4λ_t · sqrt(|S|)`,
//!    where `|S|` is the size of the step-2 support.
//! 4. Ordinary least squares restricted to the surviving support.
//!
//! Entries of `β` outside the support are exactly zero after every update.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use tracing::{debug, trace};

use super::schedule::{PenaltySchedule, DEFAULT_LAMBDA0};
use super::Policy;
use crate::error::{BanditError, Result};
use crate::solver::least_squares::{ensure_finite, least_squares};
use crate::solver::{LassoSolver, SolverKind};

/// Estimator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BanditConfig {
    /// Number of arms K.
    pub arms: usize,
    /// Feature dimension d.
    pub dim: usize,
    /// Base regularization scale λ0.
    pub lambda0: f64,
}

impl BanditConfig {
    /// Configuration with the default `λ0 = 0.02`.
    pub fn new(arms: usize, dim: usize) -> Self {
        BanditConfig {
            arms,
            dim,
            lambda0: DEFAULT_LAMBDA0,
        }
    }

    /// Override the base regularization scale.
    pub fn lambda0(mut self, lambda0: f64) -> Self {
        self.lambda0 = lambda0;
        self
    }

    /// Check that the configuration describes a usable estimator.
    pub fn validate(&self) -> Result<()> {
        if self.arms == 0 {
            return Err(BanditError::InvalidConfig("at least one arm is required".into()));
        }
        if self.dim < 2 {
            return Err(BanditError::InvalidConfig(format!(
                "feature dimension must be at least 2, got {}",
                self.dim
            )));
        }
        if !self.lambda0.is_finite() || self.lambda0 <= 0.0 {
            return Err(BanditError::InvalidConfig(format!(
                "lambda0 must be positive and finite, got {}",
                self.lambda0
            )));
        }
        Ok(())
    }
}

/// The Thresholded-Lasso bandit estimator.
///
/// Owns its random source, so a fresh instance per trial is fully
/// determined by the seed of `R`.
#[derive(Debug, Clone)]
pub struct ThLassoBandit<R, S = SolverKind> {
    config: BanditConfig,
    schedule: PenaltySchedule,
    solver: S,
    rng: R,
    beta: DVector<f64>,
    support: Vec<usize>,
    /// Played feature vectors, row-major, `dim` values per round.
    features: Vec<f64>,
    rewards: Vec<f64>,
}

impl<R: Rng> ThLassoBandit<R, SolverKind> {
    /// Create an estimator with the default coordinate-descent Lasso.
    pub fn new(config: BanditConfig, rng: R) -> Result<Self> {
        Self::with_solver(config, SolverKind::default(), rng)
    }
}

impl<R: Rng, S: LassoSolver> ThLassoBandit<R, S> {
    /// Create an estimator with an explicit Lasso backend.
    pub fn with_solver(config: BanditConfig, solver: S, rng: R) -> Result<Self> {
        config.validate()?;
        let dim = config.dim;
        Ok(ThLassoBandit {
            schedule: PenaltySchedule::new(config.lambda0),
            config,
            solver,
            rng,
            beta: DVector::zeros(dim),
            support: (0..dim).collect(),
            features: Vec::new(),
            rewards: Vec::new(),
        })
    }

    pub fn config(&self) -> &BanditConfig {
        &self.config
    }

    /// Current coefficient estimate (length `dim`).
    pub fn beta(&self) -> &DVector<f64> {
        &self.beta
    }

    /// Current active support, in increasing index order.
    pub fn support(&self) -> &[usize] {
        &self.support
    }

    /// Number of completed updates in this trial.
    pub fn history_len(&self) -> usize {
        self.rewards.len()
    }

    /// Observed rewards, oldest first.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Played feature vectors, row-major.
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Number of stored feature rows.
    pub fn feature_rows(&self) -> usize {
        self.features.len() / self.config.dim
    }

    /// Penalty the estimator uses at round `t`.
    pub fn penalty(&self, t: usize) -> f64 {
        self.schedule.penalty(t, self.config.dim)
    }

    /// Forget all history and return to the initial state.
    pub fn reset(&mut self) {
        self.beta.fill(0.0);
        self.support = (0..self.config.dim).collect();
        self.features.clear();
        self.rewards.clear();
    }

    /// Pick an arm for the `arms x dim` context matrix of round `round`.
    ///
    /// Records a copy of the chosen row in the feature history.
    pub fn choose_action(&mut self, contexts: &DMatrix<f64>, round: usize) -> Result<usize> {
        let (arms, dim) = (self.config.arms, self.config.dim);
        if contexts.shape() != (arms, dim) {
            return Err(BanditError::shape(
                format!("{arms}x{dim} context"),
                format!("{}x{}", contexts.nrows(), contexts.ncols()),
            ));
        }

        let action = if self.support.is_empty() {
            self.rng.random_range(0..arms)
        } else {
            argmax(&(contexts * &self.beta))
        };
        trace!(round, action, explore = self.support.is_empty(), "chose action");

        self.features.extend(contexts.row(action).iter().copied());
        Ok(action)
    }

    /// Record `reward` for the last chosen action and refit `β`.
    ///
    /// # Errors
    ///
    /// A non-finite reward or estimate is a [`BanditError::NumericalError`];
    /// an update without a preceding [`choose_action`] is
    /// [`BanditError::InvalidConfig`]. Singular refits are handled internally.
    ///
    /// [`choose_action`]: ThLassoBandit::choose_action
    pub fn update_beta(&mut self, reward: f64, round: usize) -> Result<()> {
        if self.feature_rows() != self.rewards.len() + 1 {
            return Err(BanditError::InvalidConfig(
                "update_beta called without a preceding choose_action".into(),
            ));
        }
        if !reward.is_finite() {
            return Err(BanditError::NumericalError(format!(
                "non-finite reward {reward} at round {round}"
            )));
        }
        self.rewards.push(reward);

        let lambda = self.penalty(round);
        if lambda <= 0.0 {
            // No usable penalty yet: nothing survives thresholding.
            self.clear_estimate();
            debug!(round, "penalty is zero, skipping regularized fit");
            return Ok(());
        }

        let n = self.rewards.len();
        let design = DMatrix::from_row_slice(n, self.config.dim, &self.features);
        let targets = DVector::from_column_slice(&self.rewards);

        let raw = self.solver.fit(&design, &targets, lambda)?;
        ensure_finite(&raw, "lasso estimate")?;

        let first = PenaltySchedule::threshold(lambda);
        let mut support: Vec<usize> = (0..self.config.dim)
            .filter(|&i| raw[i].abs() > first)
            .collect();
        let first_len = support.len();
        if support.is_empty() {
            self.clear_estimate();
            debug!(round, lambda, "no feature survived the first threshold");
            return Ok(());
        }

        let refined = PenaltySchedule::refined_threshold(lambda, first_len);
        support.retain(|&i| raw[i].abs() > refined);
        if support.is_empty() {
            self.clear_estimate();
            debug!(round, lambda, first_len, "no feature survived the refined threshold");
            return Ok(());
        }

        let restricted = design.select_columns(support.iter());
        let coef = least_squares(&restricted, &targets)?;

        self.beta.fill(0.0);
        for (&i, &c) in support.iter().zip(coef.iter()) {
            self.beta[i] = c;
        }
        support.retain(|&i| self.beta[i] != 0.0);
        debug!(
            round,
            lambda,
            history = self.history_len(),
            solver = self.solver.name(),
            first_len,
            support_len = support.len(),
            "updated estimate"
        );
        self.support = support;
        Ok(())
    }

    fn clear_estimate(&mut self) {
        self.beta.fill(0.0);
        self.support.clear();
    }
}

impl<R: Rng, S: LassoSolver> Policy for ThLassoBandit<R, S> {
    fn choose_action(&mut self, contexts: &DMatrix<f64>, round: usize) -> Result<usize> {
        ThLassoBandit::choose_action(self, contexts, round)
    }

    fn update(&mut self, reward: f64, round: usize) -> Result<()> {
        self.update_beta(reward, round)
    }

    fn beta(&self) -> &DVector<f64> {
        &self.beta
    }

    fn name(&self) -> &'static str {
        "THLassoBandit"
    }
}

/// Index of the largest score; ties go to the lowest index.
fn argmax(scores: &DVector<f64>) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}
