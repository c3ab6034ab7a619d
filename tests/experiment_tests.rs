//! End-to-end experiment scenarios.

use tempfile::TempDir;

use thlasso::prelude::*;

#[test]
fn uniform_run_is_sparse_and_regret_monotone() {
    // A regularization scale large enough to separate two signals from
    // eight noise features within 50 rounds.
    let config = ExperimentConfig::new(EnvFamily::Uniform { sparsity: 2 }, 2, 50, 10)
        .seed(2024)
        .lambda0(0.2);
    let trajectory = run_experiment(&config).expect("experiment runs");
    let trial = &trajectory.trials()[0];

    let regret = trial.series(Metric::Regrets);
    assert_eq!(regret.len(), 50);
    assert!(regret.windows(2).all(|w| w[1] >= w[0]), "regret decreased");

    let fp = trial.series(Metric::FalsePositive);
    let fn_ = trial.series(Metric::FalseNegative);
    for round in 20..50 {
        let nonzeros = fp[round] + (2.0 - fn_[round]);
        assert!(nonzeros <= 2.0, "{nonzeros} nonzeros at round {round}");
    }
}

#[test]
fn single_round_experiment_succeeds() {
    for family in [
        EnvFamily::Elliptical { sparsity: 2, ell: 5 },
        EnvFamily::Gaussian {
            sparsity: 2,
            rho_sq: 0.3,
            x_max: None,
        },
        EnvFamily::HardInstance { rho_sq: 0.7 },
        EnvFamily::Uniform { sparsity: 2 },
    ] {
        let config = ExperimentConfig::new(family, 2, 1, 8).trials(2).seed(3);
        let trajectory = run_experiment(&config).expect("T = 1 must not fail");
        assert_eq!(trajectory.rounds(), 1);
        assert_eq!(trajectory.trials().len(), 2);
    }
}

#[test]
fn hard_instance_false_negatives_decrease() {
    let rounds = 500;
    let trials = 24;
    let config = ExperimentConfig::new(EnvFamily::HardInstance { rho_sq: 0.0 }, 3, rounds, 10)
        .trials(trials)
        .seed(17);
    let trajectory = run_experiment(&config).expect("experiment runs");

    let window = rounds / 10;
    let mean = trajectory.mean(Metric::FalseNegative);
    let early = mean[..window].iter().sum::<f64>() / window as f64;
    let late = mean[rounds - window..].iter().sum::<f64>() / window as f64;
    assert!(
        late < early,
        "false negatives did not decrease: early {early}, late {late}"
    );
    // Only the 0.1 coefficient may still be missed, and not in most trials.
    assert!(late <= 0.7, "late false negatives {late} over {trials} trials");

    // Both unit coefficients are recovered in every trial.
    for (i, trial) in trajectory.trials().iter().enumerate() {
        let worst = trial.series(Metric::FalseNegative)[rounds - window..]
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);
        assert!(worst <= 1.0, "trial {i} misses {worst} features late");
    }
}

#[test]
fn clarabel_backend_runs_experiment() {
    let config = ExperimentConfig::new(EnvFamily::Uniform { sparsity: 2 }, 2, 30, 8)
        .seed(5)
        .solver(SolverChoice::Clarabel);
    let trajectory = run_experiment(&config).expect("experiment runs");
    assert_eq!(trajectory.rounds(), 30);
    assert!(trajectory
        .trials()
        .iter()
        .all(|t| t.series(Metric::ErrorL2).iter().all(|e| e.is_finite())));
}

#[test]
fn experiment_writes_metric_tables() {
    let config = ExperimentConfig::new(EnvFamily::Elliptical { sparsity: 3, ell: 10 }, 2, 12, 10)
        .trials(3)
        .seed(8);
    let trajectory = run_experiment(&config).expect("experiment runs");

    let temp_dir = TempDir::new().expect("temp dir");
    let dir = config.log_dir(temp_dir.path(), "THLassoBandit");
    let paths = trajectory.write_all(&dir).expect("write tables");
    assert_eq!(paths.len(), Metric::ALL.len());

    for metric in Metric::ALL {
        let path = dir.join(format!("{}.csv", metric.file_stem()));
        let content = std::fs::read_to_string(&path).expect("read table");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "#index,0,1,2");
        assert_eq!(lines.len(), 13);
        assert!(lines[12].starts_with("11,"));
    }
}

#[test]
fn invalid_experiment_rejected() {
    let config = ExperimentConfig::new(EnvFamily::Uniform { sparsity: 20 }, 2, 10, 10);
    assert!(matches!(
        run_experiment(&config),
        Err(BanditError::InvalidConfig(_))
    ));
}
