//! Block assembly of sparse matrices for the conic backend.
//!
//! Conic programs here are small block matrices (a Gram block, a few signed
//! identities). [`BlockBuilder`] places those blocks at row/column offsets
//! and compresses the result to CSC once.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Entries with magnitude at or below this are not stored.
const DROP_TOL: f64 = 1e-15;

/// Accumulates triplets for one `nrows x ncols` matrix.
///
/// Duplicate positions are summed on [`build`](BlockBuilder::build).
/// Entries falling outside the matrix are ignored.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    coo: CooMatrix<f64>,
}

impl BlockBuilder {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        BlockBuilder {
            coo: CooMatrix::new(nrows, ncols),
        }
    }

    fn push(&mut self, row: usize, col: usize, value: f64) {
        if row < self.coo.nrows() && col < self.coo.ncols() && value.abs() > DROP_TOL {
            self.coo.push(row, col, value);
        }
    }

    /// `value · I_n` with its top-left corner at `(row, col)`.
    pub fn diagonal(mut self, row: usize, col: usize, n: usize, value: f64) -> Self {
        for i in 0..n {
            self.push(row + i, col + i, value);
        }
        self
    }

    /// Upper triangle of the symmetric `block`, top-left corner at `(row, col)`.
    ///
    /// Clarabel reads only the upper triangle of the quadratic cost.
    pub fn upper_triangle(mut self, row: usize, col: usize, block: &DMatrix<f64>) -> Self {
        for j in 0..block.ncols() {
            for i in 0..=j.min(block.nrows().saturating_sub(1)) {
                self.push(row + i, col + j, block[(i, j)]);
            }
        }
        self
    }

    pub fn build(&self) -> CscMatrix<f64> {
        CscMatrix::from(&self.coo)
    }
}

/// Dense copy of a CSC matrix.
#[cfg(test)]
pub(crate) fn to_dense(sparse: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(sparse.nrows(), sparse.ncols());
    for (row, col, val) in sparse.triplet_iter() {
        dense[(row, col)] += *val;
    }
    dense
}
