//! Run Thresholded-Lasso bandit experiments and write metric tables.
//!
//! # Usage
//!
//! ```bash
//! # Elliptical contexts with the default sizes
//! cargo run --release -- elliptical
//!
//! # Hard instance with independent arms, fixed seed
//! cargo run --release -- --seed 7 hard-instance --rho_sq 0.0 --T 2000
//!
//! # Uniform contexts, Clarabel Lasso backend, CSVs under ./results
//! cargo run --release -- --solver clarabel --output results uniform --s0 10
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use thlasso::bandit::DEFAULT_LAMBDA0;
use thlasso::experiment::{run_experiment, EnvFamily, ExperimentConfig, Metric, SolverChoice};

/// Thresholded-Lasso bandit experiments
#[derive(Parser, Debug)]
#[command(name = "thlasso")]
#[command(about = "Simulate the Thresholded-Lasso bandit on synthetic sparse environments")]
#[command(version)]
struct Cli {
    /// Root directory for metric tables
    #[arg(short, long, default_value = "log", global = true)]
    output: PathBuf,

    /// Base seed for all trials (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Base regularization scale
    #[arg(long, default_value_t = DEFAULT_LAMBDA0, global = true)]
    lambda0: f64,

    /// Lasso backend
    #[arg(long, value_enum, default_value_t = SolverChoice::Cd, global = true)]
    solver: SolverChoice,

    /// Log per-round estimator details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    family: Family,
}

/// Sizes shared by every family.
#[derive(Args, Debug)]
struct Common {
    /// Number of rounds
    #[arg(long = "T", default_value_t = 1000)]
    rounds: usize,

    /// Dimension of feature vectors
    #[arg(long = "d", default_value_t = 1000)]
    dim: usize,

    /// Number of trials
    #[arg(long = "num_trial", default_value_t = 20)]
    num_trial: usize,
}

#[derive(Subcommand, Debug)]
enum Family {
    /// Elliptically distributed contexts
    Elliptical {
        #[command(flatten)]
        common: Common,
        /// Number of arms
        #[arg(long = "K", default_value_t = 2)]
        arms: usize,
        /// Sparsity index
        #[arg(long, default_value_t = 5)]
        s0: usize,
        /// Parameter of the elliptical distribution
        #[arg(long, default_value_t = 200)]
        l: usize,
    },
    /// Gaussian contexts correlated across arms
    Gaussian {
        #[command(flatten)]
        common: Common,
        /// Number of arms
        #[arg(long = "K", default_value_t = 2)]
        arms: usize,
        /// Sparsity index
        #[arg(long, default_value_t = 5)]
        s0: usize,
        /// Correlation level between feature vectors of arms
        #[arg(long = "rho_sq", default_value_t = 0.3)]
        rho_sq: f64,
        /// Clip arm vectors to this L2 norm
        #[arg(long = "x_max")]
        x_max: Option<f64>,
    },
    /// Three-arm hard instance
    HardInstance {
        #[command(flatten)]
        common: Common,
        /// Correlation level between feature vectors of arms
        #[arg(long = "rho_sq", default_value_t = 0.7)]
        rho_sq: f64,
    },
    /// Uniform contexts on [-1, 1]
    Uniform {
        #[command(flatten)]
        common: Common,
        /// Number of arms
        #[arg(long = "K", default_value_t = 2)]
        arms: usize,
        /// Sparsity index
        #[arg(long, default_value_t = 20)]
        s0: usize,
    },
}

impl Family {
    fn into_config(self) -> ExperimentConfig {
        let (family, arms, common) = match self {
            Family::Elliptical { common, arms, s0, l } => (
                EnvFamily::Elliptical {
                    sparsity: s0,
                    ell: l,
                },
                arms,
                common,
            ),
            Family::Gaussian {
                common,
                arms,
                s0,
                rho_sq,
                x_max,
            } => (
                EnvFamily::Gaussian {
                    sparsity: s0,
                    rho_sq,
                    x_max,
                },
                arms,
                common,
            ),
            Family::HardInstance { common, rho_sq } => {
                (EnvFamily::HardInstance { rho_sq }, 3, common)
            }
            Family::Uniform { common, arms, s0 } => {
                (EnvFamily::Uniform { sparsity: s0 }, arms, common)
            }
        };
        ExperimentConfig::new(family, arms, common.rounds, common.dim).trials(common.num_trial)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "thlasso=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let config = cli
        .family
        .into_config()
        .seed(seed)
        .lambda0(cli.lambda0)
        .solver(cli.solver);
    config.validate().context("invalid experiment configuration")?;

    info!(
        family = config.family.name(),
        trials = config.trials,
        seed,
        "run experiments"
    );
    let trajectory = run_experiment(&config).context("experiment failed")?;
    if let Some(regret) = trajectory.mean(Metric::Regrets).last() {
        info!(mean_regret = *regret, "final cumulative regret over trials");
    }

    let dir = config.log_dir(&cli.output, "THLassoBandit");
    let paths = trajectory
        .write_all(&dir)
        .with_context(|| format!("failed to write logs to {}", dir.display()))?;
    for path in &paths {
        info!(path = %path.display(), "wrote log");
    }

    Ok(())
}
