//! Sparse vectors and sparse matrices.
//!
//! B-spline bases have local support, so basis vectors, design matrices, and
//! knot transforms are overwhelmingly zero.  [`SparseVector`] stores only the
//! nonzero entries ordered by index; [`SparseMatrix`] is a compressed-column
//! `faer` matrix.

use crate::matrix::Matrix;
use faer::dyn_stack::{MemBuffer, MemStack};
use faer::sparse::linalg::matmul::{
    sparse_sparse_matmul_numeric, sparse_sparse_matmul_numeric_scratch,
    sparse_sparse_matmul_symbolic,
};
use faer::sparse::{SparseColMat, SparseColMatMut, Triplet};
use faer::{Accum, Par};
use ms_core::{
    ensure,
    errors::{Error, Result},
    Real,
};

// ── SparseVector ──────────────────────────────────────────────────────────────

/// A vector of logical length `len` storing only its nonzero entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    len: usize,
    indices: Vec<usize>,
    values: Vec<Real>,
}

impl SparseVector {
    /// An all-zero vector of length `len`.
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs.  Entries are sorted, duplicates
    /// are summed, and exact zeros are dropped.
    pub fn from_entries(len: usize, mut entries: Vec<(usize, Real)>) -> Self {
        entries.sort_by_key(|&(i, _)| i);
        let mut indices: Vec<usize> = Vec::with_capacity(entries.len());
        let mut values: Vec<Real> = Vec::with_capacity(entries.len());
        for (i, v) in entries {
            debug_assert!(i < len, "sparse index {i} out of range [0, {len})");
            if indices.last() == Some(&i) {
                if let Some(last) = values.last_mut() {
                    *last += v;
                }
            } else {
                indices.push(i);
                values.push(v);
            }
        }
        let mut out = Self {
            len,
            indices,
            values,
        };
        out.prune();
        out
    }

    fn prune(&mut self) {
        let mut k = 0;
        for j in 0..self.values.len() {
            if self.values[j] != 0.0 {
                self.indices[k] = self.indices[j];
                self.values[k] = self.values[j];
                k += 1;
            }
        }
        self.indices.truncate(k);
        self.values.truncate(k);
    }

    /// Logical length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` if the logical length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over the nonzero entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Real)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Indices of the nonzero entries.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Value at `i` (zero when not stored).
    pub fn get(&self, i: usize) -> Real {
        match self.indices.binary_search(&i) {
            Ok(k) => self.values[k],
            Err(_) => 0.0,
        }
    }

    /// Dot product with a dense slice of the same length.
    pub fn dot(&self, dense: &[Real]) -> Real {
        debug_assert_eq!(dense.len(), self.len);
        self.iter().map(|(i, v)| v * dense[i]).sum()
    }

    /// Expand to a dense `Vec`.
    pub fn to_dense(&self) -> Vec<Real> {
        let mut out = vec![0.0; self.len];
        for (i, v) in self.iter() {
            out[i] = v;
        }
        out
    }
}

// ── SparseMatrix ──────────────────────────────────────────────────────────────

/// Compressed sparse column matrix backed by `faer`.
#[derive(Clone)]
pub struct SparseMatrix(SparseColMat<usize, Real>);

impl std::fmt::Debug for SparseMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseMatrix")
            .field("nrows", &self.nrows())
            .field("ncols", &self.ncols())
            .field("nnz", &self.nnz())
            .finish()
    }
}

impl SparseMatrix {
    /// Build from `(row, col, value)` triplets.  Duplicates are summed.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] if an index lies outside the
    /// `nrows × ncols` shape.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: Vec<(usize, usize, Real)>,
    ) -> Result<Self> {
        let entries = triplets
            .into_iter()
            .map(|(i, j, v)| {
                if i >= nrows {
                    Err(Error::IndexOutOfRange {
                        index: i,
                        size: nrows,
                    })
                } else if j >= ncols {
                    Err(Error::IndexOutOfRange {
                        index: j,
                        size: ncols,
                    })
                } else {
                    Ok(Triplet::new(i, j, v))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        SparseColMat::try_new_from_triplets(nrows, ncols, &entries)
            .map(Self)
            .map_err(|e| Error::Runtime(format!("cannot assemble {nrows}×{ncols} sparse matrix: {e:?}")))
    }

    /// Build from sparse rows, each of logical length `ncols`.
    ///
    /// # Errors
    /// Returns an error if a row has a different length.
    pub fn from_rows(ncols: usize, rows: Vec<SparseVector>) -> Result<Self> {
        ensure!(
            rows.iter().all(|r| r.len() == ncols),
            "every row must have length {ncols}"
        );
        let triplets = rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |(j, v)| (i, j, v)))
            .collect();
        Self::from_triplets(rows.len(), ncols, triplets)
    }

    /// The `n × n` identity.
    ///
    /// # Errors
    /// Propagates assembly failures.
    pub fn identity(n: usize) -> Result<Self> {
        Self::from_triplets(n, n, (0..n).map(|i| (i, i, 1.0)).collect())
    }

    /// The underlying `faer` matrix.
    pub fn as_faer(&self) -> &SparseColMat<usize, Real> {
        &self.0
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.0.ncols()
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.0.val().len()
    }

    /// All stored entries as `(row, col, value)`, column by column.
    pub fn triplets(&self) -> Vec<(usize, usize, Real)> {
        let (symbolic, values) = self.0.parts();
        let col_ptr = symbolic.col_ptr();
        let row_idx = symbolic.row_idx();
        let mut out = Vec::with_capacity(values.len());
        for col in 0..self.ncols() {
            for idx in col_ptr[col]..col_ptr[col + 1] {
                out.push((row_idx[idx], col, values[idx]));
            }
        }
        out
    }

    /// Entry `(i, j)` (zero when not stored).
    pub fn get(&self, i: usize, j: usize) -> Real {
        let (symbolic, values) = self.0.parts();
        let col_ptr = symbolic.col_ptr();
        let row_idx = symbolic.row_idx();
        (col_ptr[j]..col_ptr[j + 1])
            .filter(|&idx| row_idx[idx] == i)
            .map(|idx| values[idx])
            .sum()
    }

    /// Sparse product `self * rhs`.
    ///
    /// # Errors
    /// Returns an error if the inner dimensions differ.
    pub fn mul(&self, rhs: &SparseMatrix) -> Result<SparseMatrix> {
        ensure!(
            self.ncols() == rhs.nrows(),
            "cannot multiply {}×{} by {}×{}",
            self.nrows(),
            self.ncols(),
            rhs.nrows(),
            rhs.ncols()
        );
        let (symbolic, info) = sparse_sparse_matmul_symbolic(self.0.symbolic(), rhs.0.symbolic())
            .map_err(|e| Error::Runtime(format!("sparse product pattern failed: {e:?}")))?;
        let mut values = vec![0.0; symbolic.row_idx().len()];
        let mut scratch = MemBuffer::new(sparse_sparse_matmul_numeric_scratch::<usize, Real>(
            symbolic.as_ref(),
            Par::Seq,
        ));
        let mut stack = MemStack::new(&mut scratch);
        sparse_sparse_matmul_numeric(
            SparseColMatMut::new(symbolic.as_ref(), &mut values),
            Accum::Replace,
            self.0.as_ref(),
            rhs.0.as_ref(),
            1.0,
            &info,
            Par::Seq,
            &mut stack,
        );
        Ok(Self(SparseColMat::new(symbolic, values)))
    }

    /// Product `self * x` with a dense matrix.
    ///
    /// # Errors
    /// Returns an error if the inner dimensions differ.
    pub fn mul_dense(&self, x: &Matrix) -> Result<Matrix> {
        ensure!(
            self.ncols() == x.rows(),
            "cannot multiply {}×{} by {}×{}",
            self.nrows(),
            self.ncols(),
            x.rows(),
            x.cols()
        );
        let mut out = Matrix::zeros(self.nrows(), x.cols());
        for (i, k, a) in self.triplets() {
            for j in 0..x.cols() {
                out[(i, j)] += a * x[(k, j)];
            }
        }
        Ok(out)
    }

    /// Re-express the rows of `m` through this transform: `m * selfᵀ`.
    ///
    /// With `self` of shape `new × old` and `m` of shape `k × old`, the
    /// result is `k × new`.
    ///
    /// # Errors
    /// Returns an error if `m.cols() != ncols`.
    pub fn transform_rows(&self, m: &Matrix) -> Result<Matrix> {
        ensure!(
            m.cols() == self.ncols(),
            "matrix with {} columns cannot be transformed by a {}×{} operator",
            m.cols(),
            self.nrows(),
            self.ncols()
        );
        let mut out = Matrix::zeros(m.rows(), self.nrows());
        for (r, c, a) in self.triplets() {
            for k in 0..m.rows() {
                out[(k, r)] += a * m[(k, c)];
            }
        }
        Ok(out)
    }

    /// Expand to a dense [`Matrix`].
    pub fn to_dense(&self) -> Matrix {
        let mut out = Matrix::zeros(self.nrows(), self.ncols());
        for (i, j, v) in self.triplets() {
            out[(i, j)] += v;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dense_product(a: &Matrix, b: &Matrix) -> Matrix {
        Matrix::from(a.inner() * b.inner())
    }

    #[test]
    fn vector_entries_are_sorted_and_merged() {
        let v = SparseVector::from_entries(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (4, 0.0)]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0, 1.5, 0.0]);
        assert_eq!(v.dot(&[1.0, 1.0, 1.0, 2.0, 1.0]), 5.0);
    }

    #[test]
    fn triplets_are_assembled_and_summed() {
        let m = SparseMatrix::from_triplets(
            2,
            3,
            vec![(1, 2, 4.0), (0, 0, 1.0), (0, 2, 2.0), (1, 2, 1.0)],
        )
        .unwrap();
        assert_eq!(m.get(1, 2), 5.0);
        assert_eq!(m.get(0, 2), 2.0);
        assert_eq!(m.get(1, 0), 0.0);
        assert!(matches!(
            SparseMatrix::from_triplets(2, 2, vec![(2, 0, 1.0)]),
            Err(Error::IndexOutOfRange { index: 2, size: 2 })
        ));
    }

    #[test]
    fn rows_keep_their_order() {
        let rows = vec![
            SparseVector::from_entries(3, vec![(2, 1.0)]),
            SparseVector::zeros(3),
            SparseVector::from_entries(3, vec![(0, -1.0), (1, 2.0)]),
        ];
        let m = SparseMatrix::from_rows(3, rows).unwrap();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.to_dense().row(2), vec![-1.0, 2.0, 0.0]);
        assert!(SparseMatrix::from_rows(2, vec![SparseVector::zeros(3)]).is_err());
    }

    #[test]
    fn sparse_products_match_dense() {
        let a = SparseMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)])
            .unwrap();
        let b = SparseMatrix::from_triplets(2, 2, vec![(0, 0, 4.0), (1, 0, 5.0), (1, 1, 6.0)])
            .unwrap();
        let expected = dense_product(&a.to_dense(), &b.to_dense());
        assert_eq!(a.mul(&b).unwrap().to_dense(), expected);
        assert_eq!(a.mul_dense(&b.to_dense()).unwrap(), expected);
        let c = SparseMatrix::from_triplets(3, 2, vec![(0, 0, 1.0)]).unwrap();
        assert!(a.mul(&c).is_err());
    }

    #[test]
    fn transform_rows_applies_transpose() {
        // 3 × 2 operator acting on 1 × 2 rows.
        let t = SparseMatrix::from_triplets(
            3,
            2,
            vec![(0, 0, 1.0), (1, 0, 0.5), (1, 1, 0.5), (2, 1, 1.0)],
        )
        .unwrap();
        let c = Matrix::row_vector(&[2.0, 4.0]);
        let out = t.transform_rows(&c).unwrap();
        assert_eq!(out, Matrix::row_vector(&[2.0, 3.0, 4.0]));
        assert!(t.transform_rows(&Matrix::row_vector(&[1.0])).is_err());
    }

    #[test]
    fn identity_is_neutral() {
        let i = SparseMatrix::identity(3).unwrap();
        let m = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(i.transform_rows(&m).unwrap(), m);
        assert_eq!(i.nnz(), 3);
    }

    fn sparse_matrix(rows: usize, cols: usize) -> impl Strategy<Value = SparseMatrix> {
        prop::collection::vec((0..rows, 0..cols, -4i32..=4), 0..12).prop_map(move |entries| {
            let triplets = entries
                .into_iter()
                .map(|(i, j, v)| (i, j, Real::from(v)))
                .collect();
            SparseMatrix::from_triplets(rows, cols, triplets).unwrap()
        })
    }

    proptest! {
        #[test]
        fn sparse_product_agrees_with_dense_product(
            a in sparse_matrix(4, 3),
            b in sparse_matrix(3, 5),
        ) {
            let expected = dense_product(&a.to_dense(), &b.to_dense());
            prop_assert_eq!(a.mul(&b).unwrap().to_dense(), expected.clone());
            prop_assert_eq!(a.mul_dense(&b.to_dense()).unwrap(), expected);
        }
    }
}
