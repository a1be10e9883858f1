//! `Matrix` — a two-dimensional matrix of reals.
//!
//! This is a thin newtype around `nalgebra::DMatrix<f64>` exposing the
//! handful of operations the spline code needs: construction, shape queries,
//! row access, and row blocks.

use ms_core::Real;
use nalgebra::DMatrix;
use std::ops::{Index, IndexMut};

/// A dynamically-sized 2D matrix of `Real` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<Real>);

impl Matrix {
    /// Create a zero-filled `rows × cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Create from a row-major data slice.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[Real]) -> Self {
        Self(DMatrix::from_row_slice(rows, cols, data))
    }

    /// Create a `1 × n` matrix holding `data`.
    pub fn row_vector(data: &[Real]) -> Self {
        Self::from_row_slice(1, data.len(), data)
    }

    /// Build a matrix entry by entry.
    pub fn from_fn<F: FnMut(usize, usize) -> Real>(rows: usize, cols: usize, f: F) -> Self {
        Self(DMatrix::from_fn(rows, cols, f))
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    /// Borrow the inner `DMatrix`.
    pub fn inner(&self) -> &DMatrix<Real> {
        &self.0
    }

    /// Consume and return the inner `DMatrix`.
    pub fn into_inner(self) -> DMatrix<Real> {
        self.0
    }

    /// Frobenius norm.
    pub fn norm(&self) -> Real {
        self.0.norm()
    }

    /// Copy row `i` out as a `Vec`.
    pub fn row(&self, i: usize) -> Vec<Real> {
        self.0.row(i).iter().copied().collect()
    }

    /// Copy `count` consecutive rows starting at `start`.
    pub fn row_block(&self, start: usize, count: usize) -> Self {
        Self::from_fn(count, self.cols(), |i, j| self.0[(start + i, j)])
    }

    /// Return `true` if every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

// ── From / Into ───────────────────────────────────────────────────────────────

impl From<DMatrix<Real>> for Matrix {
    fn from(m: DMatrix<Real>) -> Self {
        Self(m)
    }
}

// ── Indexing ──────────────────────────────────────────────────────────────────

impl Index<(usize, usize)> for Matrix {
    type Output = Real;
    fn index(&self, (i, j): (usize, usize)) -> &Real {
        &self.0[(i, j)]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Real {
        &mut self.0[(i, j)]
    }
}
