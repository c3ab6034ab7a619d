//! Trial loop and parallel experiment execution.
//!
//! Trials share nothing: each one builds its own environment and estimator
//! from a seed derived from the experiment's base seed and the trial index,
//! so results do not depend on how rayon schedules them.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use tracing::info;

use super::config::ExperimentConfig;
use super::log::{RoundRecord, TrialLog, Trajectory};
use crate::bandit::{Policy, ThLassoBandit};
use crate::env::Environment;
use crate::error::Result;

/// Progress is logged every this many rounds.
pub const PROGRESS_EVERY: usize = 100;

const ENV_STREAM: u64 = 0;
const POLICY_STREAM: u64 = 1;

/// SplitMix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for trial `trial` of an experiment with base seed `base`.
pub fn trial_seed(base: u64, trial: u64) -> u64 {
    mix(base ^ mix(trial))
}

/// Independent sub-seed for one consumer (environment, policy) of a trial.
pub fn stream_seed(seed: u64, stream: u64) -> u64 {
    mix(seed.wrapping_add(mix(stream.wrapping_add(1))))
}

/// Run `rounds` interactions between `env` and `policy`.
///
/// Round indices passed to the policy start at 1.
pub fn run_trial<E, P>(env: &mut E, policy: &mut P, rounds: usize, trial: usize) -> Result<TrialLog>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let mut log = TrialLog::with_capacity(rounds);
    let mut cumulative_reward = 0.0;
    let mut cumulative_regret = 0.0;

    for t in 0..rounds {
        if t % PROGRESS_EVERY == 0 {
            info!(trial, round = t, regret = cumulative_regret, "progress");
        }
        let round = t + 1;

        let action = policy.choose_action(env.context(), round)?;
        let outcome = env.pull(action)?;
        policy.update(outcome.reward, round)?;

        cumulative_reward += outcome.reward;
        cumulative_regret += outcome.regret;

        let beta = policy.beta();
        log.push(RoundRecord {
            cumulative_reward,
            cumulative_regret,
            false_negative: env.false_negative(beta),
            false_positive: env.false_positive(beta),
            error_l1: env.error_l1(beta),
            error_l2: env.error_l2(beta),
        });
    }

    Ok(log)
}

/// Run one fully seeded trial of `config`.
pub fn run_seeded_trial(config: &ExperimentConfig, trial: usize) -> Result<TrialLog> {
    let seed = trial_seed(config.seed, trial as u64);
    let env_rng = Xoshiro256PlusPlus::seed_from_u64(stream_seed(seed, ENV_STREAM));
    let policy_rng = Xoshiro256PlusPlus::seed_from_u64(stream_seed(seed, POLICY_STREAM));

    let mut env = config.build_environment(env_rng)?;
    let mut policy =
        ThLassoBandit::with_solver(config.bandit_config(), config.build_solver(), policy_rng)?;

    info!(trial, seed, family = config.family.name(), "run trial");
    run_trial(env.as_mut(), &mut policy, config.rounds, trial)
}

/// Run every trial of `config` in parallel and collect them in trial order.
///
/// The first failing trial aborts the experiment.
pub fn run_experiment(config: &ExperimentConfig) -> Result<Trajectory> {
    config.validate()?;
    info!(
        trials = config.trials,
        rounds = config.rounds,
        dim = config.dim,
        arms = config.effective_arms(),
        "run experiment"
    );

    let logs = (0..config.trials)
        .into_par_iter()
        .map(|trial| run_seeded_trial(config, trial))
        .collect::<Result<Vec<_>>>()?;

    Trajectory::new(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::config::EnvFamily;
    use crate::experiment::log::Metric;

    #[test]
    fn test_seeds_are_distinct() {
        let seeds: Vec<u64> = (0..100).map(|t| trial_seed(42, t)).collect();
        let mut sorted = seeds.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), seeds.len());
        assert_ne!(stream_seed(7, ENV_STREAM), stream_seed(7, POLICY_STREAM));
    }

    #[test]
    fn test_trials_are_reproducible() {
        let cfg = ExperimentConfig::new(EnvFamily::Uniform { sparsity: 2 }, 2, 15, 8)
            .trials(3)
            .seed(99);
        let a = run_experiment(&cfg).expect("run");
        let b = run_experiment(&cfg).expect("run");
        assert_eq!(a, b);

        let single = run_seeded_trial(&cfg, 1).expect("run");
        assert_eq!(&a.trials()[1], &single);
    }

    #[test]
    fn test_single_round() {
        let cfg = ExperimentConfig::new(EnvFamily::Uniform { sparsity: 2 }, 2, 1, 8).seed(1);
        let traj = run_experiment(&cfg).expect("T = 1 must not fail");
        assert_eq!(traj.rounds(), 1);
        assert_eq!(traj.table(Metric::Regrets).shape(), (1, 1));
    }
}
