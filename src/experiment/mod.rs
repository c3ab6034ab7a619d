//! Experiment driver: configuration, trial loop, and metric tables.

pub mod config;
pub mod log;
pub mod runner;

pub use config::{EnvFamily, ExperimentConfig, SolverChoice};
pub use log::{Metric, RoundRecord, TrialLog, Trajectory};
pub use runner::{run_experiment, run_seeded_trial, run_trial, stream_seed, trial_seed};
