//! Bandit policies.

pub mod schedule;
pub mod th_lasso;

pub use schedule::{PenaltySchedule, DEFAULT_LAMBDA0, THRESHOLD_SCALE};
pub use th_lasso::{BanditConfig, ThLassoBandit};

use nalgebra::{DMatrix, DVector};

use crate::error::Result;

/// A linear contextual bandit policy driven one round at a time.
pub trait Policy {
    /// Choose an arm for the `arms x dim` context matrix of round `round` (1-based).
    fn choose_action(&mut self, contexts: &DMatrix<f64>, round: usize) -> Result<usize>;

    /// Feed back the reward of the arm chosen this round.
    fn update(&mut self, reward: f64, round: usize) -> Result<()>;

    /// Current coefficient estimate.
    fn beta(&self) -> &DVector<f64>;

    /// Name used for log directories.
    fn name(&self) -> &'static str;
}
