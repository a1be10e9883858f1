//! Tensor-product indexing and Kronecker products of sparse factors.
//!
//! A multi-index `(i_0, …, i_{d-1})` over per-dimension sizes
//! `(n_0, …, n_{d-1})` is flattened with the last dimension varying fastest:
//! `flat = Σ i_k · stride_k` with `stride_{d-1} = 1` and
//! `stride_k = stride_{k+1} · n_{k+1}`.

use ms_core::{ensure, errors::Result};
use ms_math::{SparseMatrix, SparseVector};

/// Row-major (last dimension fastest) layout of a tensor grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorIndex {
    sizes: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorIndex {
    /// Layout for the given per-dimension sizes.
    pub fn new(sizes: &[usize]) -> Self {
        let mut strides = vec![1usize; sizes.len()];
        for k in (0..sizes.len().saturating_sub(1)).rev() {
            strides[k] = strides[k + 1] * sizes[k + 1];
        }
        Self {
            sizes: sizes.to_vec(),
            strides,
        }
    }

    /// Per-dimension sizes.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Per-dimension strides.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Return `true` if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat position of a multi-index.
    pub fn flatten(&self, multi: &[usize]) -> usize {
        debug_assert_eq!(multi.len(), self.sizes.len());
        multi.iter().zip(&self.strides).map(|(i, s)| i * s).sum()
    }

    /// Multi-index of a flat position.
    pub fn unflatten(&self, mut flat: usize) -> Vec<usize> {
        self.strides
            .iter()
            .map(|&s| {
                let i = flat / s;
                flat %= s;
                i
            })
            .collect()
    }
}

/// Kronecker product `f_0 ⊗ f_1 ⊗ … ⊗ f_{d-1}` of sparse vectors.
pub fn tensor_product(factors: &[SparseVector]) -> SparseVector {
    let sizes: Vec<usize> = factors.iter().map(SparseVector::len).collect();
    let index = TensorIndex::new(&sizes);
    let mut entries = vec![(0usize, 1.0)];
    for (factor, &stride) in factors.iter().zip(index.strides()) {
        entries = entries
            .iter()
            .flat_map(|&(i, v)| factor.iter().map(move |(j, w)| (i + j * stride, v * w)))
            .collect();
    }
    SparseVector::from_entries(index.len(), entries)
}

/// Kronecker product of sparse matrices, in the same flattening order as
/// [`tensor_product`] for both rows and columns.
///
/// # Errors
/// Propagates assembly failures.
pub fn tensor_transform(factors: &[SparseMatrix]) -> Result<SparseMatrix> {
    let row_sizes: Vec<usize> = factors.iter().map(SparseMatrix::nrows).collect();
    let col_sizes: Vec<usize> = factors.iter().map(SparseMatrix::ncols).collect();
    let rows = TensorIndex::new(&row_sizes);
    let cols = TensorIndex::new(&col_sizes);
    let mut entries = vec![(0usize, 0usize, 1.0)];
    for (k, factor) in factors.iter().enumerate() {
        let (row_stride, col_stride) = (rows.strides()[k], cols.strides()[k]);
        let local = factor.triplets();
        entries = entries
            .iter()
            .flat_map(|&(r, c, v)| {
                local
                    .iter()
                    .map(move |&(i, j, w)| (r + i * row_stride, c + j * col_stride, v * w))
            })
            .collect();
    }
    SparseMatrix::from_triplets(rows.len(), cols.len(), entries)
}

/// Lift a transform acting on dimension `dim` to the whole tensor grid,
/// with identities on every other dimension.
///
/// # Errors
/// Propagates assembly failures.
pub fn expand_transform(
    transform: SparseMatrix,
    dim: usize,
    sizes: &[usize],
) -> Result<SparseMatrix> {
    ensure!(
        dim < sizes.len(),
        "dimension {dim} out of range for a {}-dimensional grid",
        sizes.len()
    );
    let mut factors = sizes
        .iter()
        .map(|&n| SparseMatrix::identity(n))
        .collect::<Result<Vec<_>>>()?;
    factors[dim] = transform;
    tensor_transform(&factors)
}
