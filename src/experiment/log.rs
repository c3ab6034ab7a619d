//! Per-round metrics and their CSV tables.
//!
//! Each metric is persisted as one table: rows are rounds (0-indexed),
//! columns are trials (0-indexed), header `#index,0,1,...`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;

use crate::error::{BanditError, Result};

/// A tracked per-round quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Cumulative reward.
    Rewards,
    /// Cumulative regret.
    Regrets,
    FalseNegative,
    FalsePositive,
    ErrorL1,
    ErrorL2,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Rewards,
        Metric::Regrets,
        Metric::FalseNegative,
        Metric::FalsePositive,
        Metric::ErrorL1,
        Metric::ErrorL2,
    ];

    /// File name without extension.
    pub fn file_stem(self) -> &'static str {
        match self {
            Metric::Rewards => "rewards",
            Metric::Regrets => "regrets",
            Metric::FalseNegative => "false_negative",
            Metric::FalsePositive => "false_positive",
            Metric::ErrorL1 => "error_l1",
            Metric::ErrorL2 => "error_l2",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Everything recorded after one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRecord {
    pub cumulative_reward: f64,
    pub cumulative_regret: f64,
    pub false_negative: usize,
    pub false_positive: usize,
    pub error_l1: f64,
    pub error_l2: f64,
}

/// Metric series of a single trial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialLog {
    series: [Vec<f64>; 6],
}

impl TrialLog {
    pub fn with_capacity(rounds: usize) -> Self {
        TrialLog {
            series: std::array::from_fn(|_| Vec::with_capacity(rounds)),
        }
    }

    pub fn push(&mut self, record: RoundRecord) {
        self.series[Metric::Rewards.index()].push(record.cumulative_reward);
        self.series[Metric::Regrets.index()].push(record.cumulative_regret);
        self.series[Metric::FalseNegative.index()].push(record.false_negative as f64);
        self.series[Metric::FalsePositive.index()].push(record.false_positive as f64);
        self.series[Metric::ErrorL1.index()].push(record.error_l1);
        self.series[Metric::ErrorL2.index()].push(record.error_l2);
    }

    /// Number of recorded rounds.
    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn series(&self, metric: Metric) -> &[f64] {
        &self.series[metric.index()]
    }
}

/// Metric tables for all trials of one experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    rounds: usize,
    trials: Vec<TrialLog>,
}

impl Trajectory {
    /// Collect trial logs, which must all cover the same number of rounds.
    pub fn new(trials: Vec<TrialLog>) -> Result<Self> {
        let rounds = trials.first().map_or(0, TrialLog::len);
        if let Some((i, t)) = trials.iter().enumerate().find(|(_, t)| t.len() != rounds) {
            return Err(BanditError::shape(
                format!("{rounds} rounds"),
                format!("{} rounds in trial {i}", t.len()),
            ));
        }
        Ok(Trajectory { rounds, trials })
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn trials(&self) -> &[TrialLog] {
        &self.trials
    }

    /// `rounds x trials` table for `metric`.
    pub fn table(&self, metric: Metric) -> DMatrix<f64> {
        DMatrix::from_fn(self.rounds, self.trials.len(), |r, c| {
            self.trials[c].series(metric)[r]
        })
    }

    /// Mean over trials at each round.
    pub fn mean(&self, metric: Metric) -> Vec<f64> {
        let n = self.trials.len().max(1) as f64;
        (0..self.rounds)
            .map(|r| self.trials.iter().map(|t| t.series(metric)[r]).sum::<f64>() / n)
            .collect()
    }

    /// Write one metric table to `path`.
    pub fn write_csv(&self, metric: Metric, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "#index")?;
        for trial in 0..self.trials.len() {
            write!(writer, ",{trial}")?;
        }
        writeln!(writer)?;

        for round in 0..self.rounds {
            write!(writer, "{round}")?;
            for trial in &self.trials {
                write!(writer, ",{}", trial.series(metric)[round])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write every metric into `dir` (created if missing). Returns the paths.
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut paths = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let path = dir.join(format!("{}.csv", metric.file_stem()));
            self.write_csv(metric, &path)?;
            paths.push(path);
        }
        Ok(paths)
    }
}
