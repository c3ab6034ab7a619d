//! Behavioral tests for the Thresholded-Lasso estimator driven by real
//! environments.

use nalgebra::DMatrix;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use thlasso::prelude::*;

fn rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Indices of the nonzero entries of the bandit's estimate.
fn nonzeros<R: rand::Rng, S: LassoSolver>(bandit: &ThLassoBandit<R, S>) -> Vec<usize> {
    (0..bandit.beta().len())
        .filter(|&i| bandit.beta()[i] != 0.0)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Actions stay in range, the estimate is supported exactly on the active
    /// support, and the history grows by one row per round.
    #[test]
    fn round_invariants_hold(
        arms in 1usize..=4,
        dim in 2usize..=8,
        rounds in 1usize..=25,
        seed in any::<u64>(),
    ) {
        let mut env = Uniform::new(arms, dim, 1, rng(seed)).expect("valid env");
        let mut bandit =
            ThLassoBandit::new(BanditConfig::new(arms, dim), rng(seed.wrapping_add(1)))
                .expect("valid config");

        for t in 1..=rounds {
            let action = bandit.choose_action(env.context(), t).expect("shape ok");
            prop_assert!(action < arms);
            prop_assert_eq!(bandit.feature_rows(), t);

            let outcome = env.pull(action).expect("valid arm");
            prop_assert!(outcome.regret >= 0.0);
            bandit.update_beta(outcome.reward, t).expect("update ok");

            prop_assert_eq!(bandit.history_len(), t);
            prop_assert_eq!(bandit.features().len(), t * dim);
            prop_assert_eq!(nonzeros(&bandit), bandit.support().to_vec());
            prop_assert!(bandit.beta().iter().all(|b| b.is_finite()));
        }
    }

    /// The penalty is positive once both the round and the dimension exceed one.
    #[test]
    fn penalty_positive_after_round_one(t in 2usize..10_000, d in 2usize..5_000) {
        let lambda = PenaltySchedule::default().penalty(t, d);
        prop_assert!(lambda > 0.0);
        prop_assert!(lambda.is_finite());
    }
}

#[test]
fn empty_support_explores_uniformly() {
    // After round one the support is empty, so the round-two choice is a
    // uniform draw. Count it over many independently seeded estimators.
    let arms = 3;
    let reps = 3000;
    let x = DMatrix::from_fn(arms, 4, |i, j| (i * 4 + j) as f64);
    let mut counts = vec![0usize; arms];

    for seed in 0..reps {
        let mut bandit =
            ThLassoBandit::new(BanditConfig::new(arms, 4), rng(seed)).expect("valid config");
        bandit.choose_action(&x, 1).expect("shape ok");
        bandit.update_beta(1.0, 1).expect("update ok");
        assert!(bandit.support().is_empty());

        counts[bandit.choose_action(&x, 2).expect("shape ok")] += 1;
    }

    let expected = reps as f64 / arms as f64;
    for (arm, &c) in counts.iter().enumerate() {
        // Five standard deviations of a binomial(3000, 1/3).
        assert!(
            (c as f64 - expected).abs() < 130.0,
            "arm {arm} chosen {c} times, expected about {expected}"
        );
    }
}

#[test]
fn same_seed_same_decisions() {
    let play = |seed: u64| {
        let mut env = Gaussian::new(2, 12, 3, None, 0.3, rng(seed)).expect("valid env");
        let mut bandit =
            ThLassoBandit::new(BanditConfig::new(2, 12), rng(seed + 100)).expect("valid config");
        let mut actions = Vec::new();
        for t in 1..=40 {
            let a = bandit.choose_action(env.context(), t).expect("shape ok");
            let outcome = env.pull(a).expect("valid arm");
            bandit.update_beta(outcome.reward, t).expect("update ok");
            actions.push(a);
        }
        (actions, bandit.beta().clone())
    };

    assert_eq!(play(5), play(5));
}

#[test]
fn conic_backend_keeps_invariants() {
    let dim = 10;
    let mut env = Uniform::new(2, dim, 2, rng(11)).expect("valid env");
    let mut bandit = ThLassoBandit::with_solver(
        BanditConfig::new(2, dim),
        ConicLasso::default(),
        rng(12),
    )
    .expect("valid config");

    for t in 1..=30 {
        let a = bandit.choose_action(env.context(), t).expect("shape ok");
        let outcome = env.pull(a).expect("valid arm");
        bandit.update_beta(outcome.reward, t).expect("update ok");
        assert_eq!(nonzeros(&bandit), bandit.support().to_vec());
    }
}

#[test]
fn policy_trait_drives_estimator() {
    let mut env = Uniform::new(3, 6, 2, rng(3)).expect("valid env");
    let mut policy: Box<dyn Policy> = Box::new(
        ThLassoBandit::new(BanditConfig::new(3, 6), rng(4)).expect("valid config"),
    );
    assert_eq!(policy.name(), "THLassoBandit");

    let log = run_trial(&mut env, policy.as_mut(), 20, 0).expect("trial runs");
    assert_eq!(log.len(), 20);
    assert_eq!(policy.beta().len(), 6);
}
