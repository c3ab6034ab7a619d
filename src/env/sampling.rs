//! Random draws shared by the environments.

use nalgebra::{DMatrix, DVector};
use rand::seq::index;
use rand::Rng;
use rand_distr::StandardNormal;

/// Range of the nonzero ground-truth coefficients.
pub const COEF_LOW: f64 = 1.0;
pub const COEF_HIGH: f64 = 2.0;

/// A `dim`-vector with `sparsity` distinct nonzero entries drawn from
/// `U(COEF_LOW, COEF_HIGH)` at uniformly chosen positions.
pub fn sparse_ground_truth<R: Rng + ?Sized>(rng: &mut R, dim: usize, sparsity: usize) -> DVector<f64> {
    let mut beta = DVector::zeros(dim);
    for i in index::sample(rng, dim, sparsity).into_iter() {
        beta[i] = rng.random_range(COEF_LOW..COEF_HIGH);
    }
    beta
}

/// One standard normal draw.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(StandardNormal)
}

/// `rows x cols` matrix whose columns are i.i.d. `N(0, V)` with
/// `V = (1 - ρ²) I + ρ² 11ᵀ`.
///
/// Uses the one-factor representation `x_k = sqrt(1 - ρ²) z_k + ρ z_0`, which
/// stays valid at `ρ² = 1` where `V` is singular.
pub fn equicorrelated_normal<R: Rng + ?Sized>(
    rng: &mut R,
    rows: usize,
    cols: usize,
    rho_sq: f64,
) -> DMatrix<f64> {
    let own = (1.0 - rho_sq).sqrt();
    let shared = rho_sq.sqrt();
    let mut x = DMatrix::zeros(rows, cols);
    for j in 0..cols {
        let common = standard_normal(rng);
        for k in 0..rows {
            x[(k, j)] = own * standard_normal(rng) + shared * common;
        }
    }
    x
}

/// Matrix with i.i.d. `U(low, high)` entries.
pub fn uniform_matrix<R: Rng + ?Sized>(
    rng: &mut R,
    rows: usize,
    cols: usize,
    low: f64,
    high: f64,
) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| rng.random_range(low..high))
}
