//! # ms-math
//!
//! Linear algebra for multisplines: a dense matrix newtype (over nalgebra),
//! sparse vectors and matrices, and the sparse/dense solver chain used to
//! compute B-spline control points.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Linear solvers and the fallback chain.
pub mod linear_solvers;

/// Dense matrix newtype.
pub mod matrix;

/// Sparse vector and CSR matrix types.
pub mod sparse;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use linear_solvers::{DenseQr, LinearSolver, SolverChain, SparseLu};
pub use matrix::Matrix;
pub use sparse::{SparseMatrix, SparseVector};
