//! Regularization schedule and thresholds.

/// Default base regularization scale.
pub const DEFAULT_LAMBDA0: f64 = 0.02;

/// Multiplier applied to the penalty to obtain the hard threshold.
pub const THRESHOLD_SCALE: f64 = 4.0;

/// Decaying Lasso penalty `λ_t = λ0 · sqrt(2 ln(t) ln(d) / t)`.
///
/// The formula is zero at `t = 1` and undefined below it. [`penalty`] returns
/// `0.0` for every `t <= 1` (and for `d <= 1`), which the estimator reads as
/// "no regularized fit this round".
///
/// [`penalty`]: PenaltySchedule::penalty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltySchedule {
    lambda0: f64,
}

impl PenaltySchedule {
    pub fn new(lambda0: f64) -> Self {
        PenaltySchedule { lambda0 }
    }

    /// Penalty for round `t` in dimension `d`. Never negative or NaN for a
    /// finite, non-negative `lambda0`.
    pub fn penalty(&self, t: usize, d: usize) -> f64 {
        if t <= 1 || d <= 1 {
            return 0.0;
        }
        let t = t as f64;
        let d = d as f64;
        self.lambda0 * (2.0 * t.ln() * d.ln() / t).sqrt()
    }

    /// First-stage threshold `4λ`.
    pub fn threshold(lambda: f64) -> f64 {
        THRESHOLD_SCALE * lambda
    }

    /// Second-stage threshold `4λ · sqrt(|S|)` for a first-stage support of
    /// size `support_len`.
    pub fn refined_threshold(lambda: f64, support_len: usize) -> f64 {
        THRESHOLD_SCALE * lambda * (support_len as f64).sqrt()
    }
}

impl Default for PenaltySchedule {
    fn default() -> Self {
        PenaltySchedule::new(DEFAULT_LAMBDA0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_one_is_zero() {
        let s = PenaltySchedule::default();
        assert_eq!(s.penalty(1, 1000), 0.0);
        assert_eq!(s.penalty(0, 1000), 0.0);
        assert_eq!(s.penalty(10, 1), 0.0);
    }

    #[test]
    fn test_known_value() {
        let s = PenaltySchedule::new(0.02);
        let t = 100.0_f64;
        let d = 10.0_f64;
        let expected = 0.02 * (2.0 * t.ln() * d.ln() / t).sqrt();
        assert!((s.penalty(100, 10) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_decays_after_peak() {
        // ln(t)/t peaks at t = e, so the schedule is decreasing from t = 3 on.
        let s = PenaltySchedule::default();
        let mut prev = s.penalty(3, 50);
        for t in 4..2000 {
            let cur = s.penalty(t, 50);
            assert!(cur > 0.0 && cur.is_finite());
            assert!(cur < prev, "penalty increased at t = {t}");
            prev = cur;
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(PenaltySchedule::threshold(0.5), 2.0);
        assert_eq!(PenaltySchedule::refined_threshold(0.5, 4), 4.0);
    }
}
