//! Experiment configuration.

use std::path::{Path, PathBuf};

use rand_xoshiro::Xoshiro256PlusPlus;

use crate::bandit::{BanditConfig, DEFAULT_LAMBDA0};
use crate::env::hard_instance::HARD_ARMS;
use crate::env::{Elliptical, Environment, Gaussian, HardInstance, Uniform};
use crate::error::{BanditError, Result};
use crate::solver::{ConicLasso, CoordinateDescent, SolverKind};

/// Environment family and its family-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvFamily {
    Elliptical { sparsity: usize, ell: usize },
    Gaussian {
        sparsity: usize,
        rho_sq: f64,
        x_max: Option<f64>,
    },
    /// Always three arms.
    HardInstance { rho_sq: f64 },
    Uniform { sparsity: usize },
}

impl EnvFamily {
    pub fn name(&self) -> &'static str {
        match self {
            EnvFamily::Elliptical { .. } => "elliptical",
            EnvFamily::Gaussian { .. } => "gaussian",
            EnvFamily::HardInstance { .. } => "hard_instance",
            EnvFamily::Uniform { .. } => "uniform",
        }
    }
}

/// Lasso backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SolverChoice {
    /// Coordinate descent.
    #[default]
    Cd,
    /// Clarabel interior point.
    Clarabel,
}

/// One experiment: a family, its sizes, and how many seeded trials to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub family: EnvFamily,
    /// Requested number of arms. Ignored by the hard instance.
    pub arms: usize,
    pub rounds: usize,
    pub dim: usize,
    pub trials: usize,
    /// Base seed; trial seeds are derived from it.
    pub seed: u64,
    pub lambda0: f64,
    pub solver: SolverChoice,
}

impl ExperimentConfig {
    pub fn new(family: EnvFamily, arms: usize, rounds: usize, dim: usize) -> Self {
        ExperimentConfig {
            family,
            arms,
            rounds,
            dim,
            trials: 1,
            seed: 0,
            lambda0: DEFAULT_LAMBDA0,
            solver: SolverChoice::default(),
        }
    }

    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn lambda0(mut self, lambda0: f64) -> Self {
        self.lambda0 = lambda0;
        self
    }

    pub fn solver(mut self, solver: SolverChoice) -> Self {
        self.solver = solver;
        self
    }

    /// Number of arms actually played.
    pub fn effective_arms(&self) -> usize {
        match self.family {
            EnvFamily::HardInstance { .. } => HARD_ARMS,
            _ => self.arms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(BanditError::InvalidConfig("rounds must be at least 1".into()));
        }
        if self.trials == 0 {
            return Err(BanditError::InvalidConfig("trials must be at least 1".into()));
        }
        self.bandit_config().validate()?;

        let check_sparsity = |s: usize| {
            if s > self.dim {
                Err(BanditError::InvalidConfig(format!(
                    "sparsity {s} exceeds dimension {}",
                    self.dim
                )))
            } else {
                Ok(())
            }
        };
        let check_rho = |rho_sq: f64| {
            if (0.0..=1.0).contains(&rho_sq) {
                Ok(())
            } else {
                Err(BanditError::InvalidConfig(format!(
                    "rho_sq must lie in [0, 1], got {rho_sq}"
                )))
            }
        };

        match self.family {
            EnvFamily::Elliptical { sparsity, ell } => {
                check_sparsity(sparsity)?;
                if ell == 0 {
                    return Err(BanditError::InvalidConfig("ell must be positive".into()));
                }
            }
            EnvFamily::Gaussian { sparsity, rho_sq, .. } => {
                check_sparsity(sparsity)?;
                check_rho(rho_sq)?;
            }
            EnvFamily::HardInstance { rho_sq } => {
                if self.dim < 3 {
                    return Err(BanditError::InvalidConfig(
                        "hard instance needs dim >= 3".into(),
                    ));
                }
                check_rho(rho_sq)?;
            }
            EnvFamily::Uniform { sparsity } => check_sparsity(sparsity)?,
        }
        Ok(())
    }

    pub fn bandit_config(&self) -> BanditConfig {
        BanditConfig::new(self.effective_arms(), self.dim).lambda0(self.lambda0)
    }

    pub fn build_solver(&self) -> SolverKind {
        match self.solver {
            SolverChoice::Cd => SolverKind::CoordinateDescent(CoordinateDescent::default()),
            SolverChoice::Clarabel => SolverKind::Conic(ConicLasso::default()),
        }
    }

    /// Fresh environment for one trial, driven by `rng`.
    pub fn build_environment(
        &self,
        rng: Xoshiro256PlusPlus,
    ) -> Result<Box<dyn Environment + Send>> {
        let env: Box<dyn Environment + Send> = match self.family {
            EnvFamily::Elliptical { sparsity, ell } => {
                Box::new(Elliptical::new(self.arms, self.dim, sparsity, ell, rng)?)
            }
            EnvFamily::Gaussian {
                sparsity,
                rho_sq,
                x_max,
            } => Box::new(Gaussian::new(
                self.arms, self.dim, sparsity, x_max, rho_sq, rng,
            )?),
            EnvFamily::HardInstance { rho_sq } => {
                Box::new(HardInstance::new(self.dim, rho_sq, rng)?)
            }
            EnvFamily::Uniform { sparsity } => {
                Box::new(Uniform::new(self.arms, self.dim, sparsity, rng)?)
            }
        };
        Ok(env)
    }

    /// Output directory for this configuration under `root`.
    pub fn log_dir(&self, root: &Path, policy: &str) -> PathBuf {
        let (k, d) = (self.arms, self.dim);
        let leaf = match self.family {
            EnvFamily::Elliptical { sparsity, ell } => format!("K{k}_d{d}_s{sparsity}_l{ell}"),
            EnvFamily::Gaussian {
                sparsity, rho_sq, ..
            } => format!("K{k}_d{d}_s{sparsity}_rho{rho_sq:?}"),
            EnvFamily::HardInstance { rho_sq } => format!("d{d}_rho{rho_sq:?}"),
            EnvFamily::Uniform { sparsity } => format!("K{k}_d{d}_s{sparsity}"),
        };
        let dir = root.join(self.family.name()).join(leaf);
        match self.family {
            EnvFamily::Uniform { .. } => dir.join(policy),
            _ => dir,
        }
    }
}
