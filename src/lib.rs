//! # thlasso
//!
//! A Rust implementation of the Thresholded-Lasso contextual bandit together
//! with the synthetic sparse environments used to evaluate it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use thlasso::prelude::*;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! let mut env = Uniform::new(2, 100, 5, Xoshiro256PlusPlus::seed_from_u64(0))?;
//! let mut bandit = ThLassoBandit::new(BanditConfig::new(2, 100), Xoshiro256PlusPlus::seed_from_u64(1))?;
//!
//! for t in 1..=500 {
//!     let arm = bandit.choose_action(env.context(), t)?;
//!     let outcome = env.pull(arm)?;
//!     bandit.update_beta(outcome.reward, t)?;
//! }
//! println!("false negatives: {}", env.false_negative(bandit.beta()));
//! ```
//!
//! ## Estimator
//!
//! Each round the estimator:
//!
//! - fits a Lasso over its full history with penalty
//!   `λ_t = λ0 · sqrt(2 ln(t) ln(d) / t)`
//! - keeps features with `|β_i| > 4λ_t`, then those with
//!   `|β_i| > 4λ_t · sqrt(|S|)`
//! - refits ordinary least squares on the surviving support
//!
//! ## Architecture
//!
//! - **Solvers**: coordinate-descent Lasso, Clarabel conic Lasso, and least
//!   squares with an SVD fallback for singular designs
//! - **Environments** behind one [`env::Environment`] trait
//! - **Experiments** run seeded trials in parallel with rayon and write one
//!   CSV table per metric

pub mod bandit;
pub mod env;
pub mod error;
pub mod experiment;
pub mod solver;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use thlasso::prelude::*;
/// ```
pub mod prelude {
    // Estimator
    pub use crate::bandit::{BanditConfig, PenaltySchedule, Policy, ThLassoBandit};

    // Environments
    pub use crate::env::{
        Elliptical, Environment, Gaussian, GroundTruth, HardInstance, Outcome, Uniform,
    };

    // Solvers
    pub use crate::solver::{
        least_squares, ConicLasso, ConicSettings, CoordinateDescent, LassoSettings, LassoSolver,
        SolverKind,
    };

    // Experiments
    pub use crate::experiment::{
        run_experiment, run_trial, EnvFamily, ExperimentConfig, Metric, SolverChoice, Trajectory,
    };

    // Errors
    pub use crate::error::{BanditError, Result};
}

// Re-export main types at crate root
pub use bandit::{BanditConfig, ThLassoBandit};
pub use error::{BanditError, Result};
