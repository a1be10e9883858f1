//! Linear solvers for `A · X = B` with a sparse `A`.
//!
//! Each numerical method sits behind the [`LinearSolver`] trait.  A
//! [`SolverChain`] tries its solvers in order, accepts the first solution that
//! is finite and (for square systems) reproduces `B` to within a relative
//! residual tolerance, and reports a single [`Error::SingularSystem`] when
//! every attempt fails.
//!
//! - [`SparseLu`] — sparse LU factorisation (via `faer`); fast on large,
//!   well-conditioned square systems.
//! - [`DenseQr`] — Householder QR on the densified matrix (via `nalgebra`);
//!   slower but handles least-squares shapes and detects rank deficiency.

use crate::matrix::Matrix;
use crate::sparse::SparseMatrix;
use faer::linalg::solvers::Solve;
use faer::Mat;
use log::{debug, warn};
use ms_core::{
    ensure,
    errors::{Error, Result},
    Real,
};

/// A numerical method for `A · X = B`.
pub trait LinearSolver: std::fmt::Debug {
    /// Short human-readable name used in log messages.
    fn name(&self) -> &'static str;

    /// Solve `A · X = B` for `X` (`A` is `m × n`, `B` is `m × k`, `X` is `n × k`).
    fn solve(&self, a: &SparseMatrix, b: &Matrix) -> Result<Matrix>;
}

// ── Sparse LU ─────────────────────────────────────────────────────────────────

/// Sparse LU factorisation with partial pivoting.  Square systems only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseLu;

impl LinearSolver for SparseLu {
    fn name(&self) -> &'static str {
        "sparse LU"
    }

    fn solve(&self, a: &SparseMatrix, b: &Matrix) -> Result<Matrix> {
        ensure!(
            a.nrows() == a.ncols(),
            "sparse LU needs a square system, got {}×{}",
            a.nrows(),
            a.ncols()
        );
        ensure!(
            b.rows() == a.nrows(),
            "right-hand side has {} rows, system has {}",
            b.rows(),
            a.nrows()
        );

        let lu = a
            .as_faer()
            .as_ref()
            .sp_lu()
            .map_err(|e| Error::SingularSystem(format!("sparse LU factorisation failed: {e:?}")))?;

        let rhs = Mat::<f64>::from_fn(b.rows(), b.cols(), |i, j| b[(i, j)]);
        let x = lu.solve(rhs.as_ref());
        Ok(Matrix::from_fn(a.ncols(), b.cols(), |i, j| x[(i, j)]))
    }
}

// ── Dense QR ──────────────────────────────────────────────────────────────────

/// Householder QR on the dense form of `A`; least squares when `m > n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseQr;

impl LinearSolver for DenseQr {
    fn name(&self) -> &'static str {
        "dense QR"
    }

    fn solve(&self, a: &SparseMatrix, b: &Matrix) -> Result<Matrix> {
        let (m, n) = (a.nrows(), a.ncols());
        ensure!(
            m >= n,
            "QR needs at least as many equations ({m}) as unknowns ({n})"
        );
        ensure!(
            b.rows() == m,
            "right-hand side has {} rows, system has {m}",
            b.rows()
        );

        let qr = a.to_dense().into_inner().qr();
        let r = qr.r();
        let q = qr.q();

        // Rank check on the diagonal of R, threshold as in LAPACK's xGELSY.
        let max_diag = (0..n).map(|i| r[(i, i)].abs()).fold(0.0_f64, f64::max);
        let threshold = m.max(n) as Real * f64::EPSILON * max_diag;
        if max_diag == 0.0 || (0..n).any(|i| r[(i, i)].abs() <= threshold) {
            return Err(Error::SingularSystem(
                "dense QR: matrix is rank deficient".into(),
            ));
        }

        let qtb = q.transpose() * b.inner();
        r.solve_upper_triangular(&qtb)
            .map(Matrix::from)
            .ok_or_else(|| Error::SingularSystem("dense QR: back substitution failed".into()))
    }
}

// ── Solver chain ──────────────────────────────────────────────────────────────

/// Ordered list of solvers tried one after the other.
#[derive(Debug)]
pub struct SolverChain {
    attempts: Vec<Box<dyn LinearSolver>>,
    residual_tolerance: Real,
}

impl SolverChain {
    /// An empty chain accepting solutions whose relative residual is at most
    /// `residual_tolerance`.
    pub fn new(residual_tolerance: Real) -> Self {
        Self {
            attempts: Vec::new(),
            residual_tolerance,
        }
    }

    /// Append a solver to the chain.
    pub fn then<S: LinearSolver + 'static>(mut self, solver: S) -> Self {
        self.attempts.push(Box::new(solver));
        self
    }

    /// Names of the solvers in the order they are tried.
    pub fn names(&self) -> Vec<&'static str> {
        self.attempts.iter().map(|s| s.name()).collect()
    }

    /// Solve `A · X = B` with the first solver that succeeds.
    ///
    /// # Errors
    /// [`Error::SingularSystem`] if every solver fails or produces an
    /// unacceptable solution.
    pub fn solve(&self, a: &SparseMatrix, b: &Matrix) -> Result<Matrix> {
        for solver in &self.attempts {
            debug!(
                "solving {}×{} system ({} right-hand sides) with {}",
                a.nrows(),
                a.ncols(),
                b.cols(),
                solver.name()
            );
            match solver.solve(a, b) {
                Ok(x) => match self.check(a, &x, b) {
                    Ok(()) => return Ok(x),
                    Err(reason) => warn!("{} rejected: {reason}", solver.name()),
                },
                Err(e) => warn!("{} failed: {e}", solver.name()),
            }
        }
        Err(Error::SingularSystem(format!(
            "no solver produced a solution (tried {})",
            self.names().join(", ")
        )))
    }

    fn check(&self, a: &SparseMatrix, x: &Matrix, b: &Matrix) -> Result<(), String> {
        if !x.is_finite() {
            return Err("solution contains non-finite values".into());
        }
        if a.nrows() != a.ncols() {
            return Ok(());
        }
        let ax = a.mul_dense(x).map_err(|e| e.to_string())?;
        let diff = Matrix::from_fn(b.rows(), b.cols(), |i, j| ax[(i, j)] - b[(i, j)]);
        let relative = diff.norm() / b.norm().max(1.0);
        if relative > self.residual_tolerance {
            return Err(format!("relative residual {relative:e} exceeds tolerance"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tridiagonal(n: usize) -> SparseMatrix {
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 4.0));
            if i > 0 {
                t.push((i, i - 1, 1.0));
            }
            if i + 1 < n {
                t.push((i, i + 1, 1.0));
            }
        }
        SparseMatrix::from_triplets(n, n, t).unwrap()
    }

    fn singular() -> SparseMatrix {
        SparseMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 4.0)],
        )
        .unwrap()
    }

    #[test]
    fn dense_qr_solves_square_system() {
        let a = tridiagonal(6);
        let x_true = Matrix::from_fn(6, 2, |i, j| (i + 3 * j) as Real);
        let b = a.mul_dense(&x_true).unwrap();
        let x = DenseQr.solve(&a, &b).unwrap();
        for i in 0..6 {
            for j in 0..2 {
                assert_abs_diff_eq!(x[(i, j)], x_true[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn dense_qr_least_squares() {
        // Fit y = 1 + 2x through exact data.
        let a = SparseMatrix::from_triplets(
            3,
            2,
            vec![(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 2.0), (2, 0, 1.0), (2, 1, 3.0)],
        )
        .unwrap();
        let b = Matrix::from_row_slice(3, 1, &[3.0, 5.0, 7.0]);
        let x = DenseQr.solve(&a, &b).unwrap();
        assert_abs_diff_eq!(x[(0, 0)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[(1, 0)], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn dense_qr_detects_rank_deficiency() {
        let b = Matrix::from_row_slice(2, 1, &[1.0, 2.0]);
        assert!(matches!(
            DenseQr.solve(&singular(), &b),
            Err(Error::SingularSystem(_))
        ));
    }

    #[test]
    fn sparse_lu_solves_square_system() {
        let a = tridiagonal(50);
        let x_true = Matrix::from_fn(50, 1, |i, _| (i as Real).sin());
        let b = a.mul_dense(&x_true).unwrap();
        let x = SparseLu.solve(&a, &b).unwrap();
        for i in 0..50 {
            assert_abs_diff_eq!(x[(i, 0)], x_true[(i, 0)], epsilon = 1e-12);
        }
    }

    #[test]
    fn sparse_lu_rejects_rectangular_system() {
        let a = SparseMatrix::from_triplets(3, 2, vec![(0, 0, 1.0)]).unwrap();
        let b = Matrix::zeros(3, 1);
        assert!(SparseLu.solve(&a, &b).is_err());
    }

    #[test]
    fn chain_reports_single_terminal_error() {
        let chain = SolverChain::new(1e-8).then(DenseQr);
        let b = Matrix::from_row_slice(2, 1, &[1.0, 3.0]);
        assert!(matches!(
            chain.solve(&singular(), &b),
            Err(Error::SingularSystem(_))
        ));
    }

    #[test]
    fn chain_keeps_insertion_order() {
        let chain = SolverChain::new(1e-8).then(SparseLu).then(DenseQr);
        assert_eq!(chain.names(), vec!["sparse LU", "dense QR"]);
    }

    #[test]
    fn chain_falls_through_to_next_solver() {
        // Rectangular: sparse LU refuses, dense QR answers.
        let a = SparseMatrix::from_triplets(
            3,
            2,
            vec![(0, 0, 1.0), (1, 1, 1.0), (2, 0, 1.0), (2, 1, 1.0)],
        )
        .unwrap();
        let b = Matrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let x = SolverChain::new(1e-8)
            .then(SparseLu)
            .then(DenseQr)
            .solve(&a, &b)
            .unwrap();
        assert_abs_diff_eq!(x[(0, 0)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[(1, 0)], 2.0, epsilon = 1e-12);
    }
}
