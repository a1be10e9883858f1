//! Control points for grid interpolation.
//!
//! For samples `(x_i, y_i)` on a complete grid and a basis with as many
//! functions as samples, the basis function matrix `A` (row `i` = basis
//! values at `x_i`) is square and nonsingular.  Solving
//! `A · [X | c] = [Bx | By]` yields both the knot averages `X` (which
//! reproduce the sample points) and the coefficients `c` (which reproduce
//! the sample values).

use crate::basis::BSplineBasis;
use crate::data_table::DataTable;
use log::{debug, info};
use ms_core::{
    errors::{Error, Result},
    Real,
};
use ms_math::{DenseQr, Matrix, SolverChain, SparseLu, SparseMatrix, SparseVector};

/// Below this many samples the dense solver is used directly.
pub const DENSE_THRESHOLD: usize = 1024;

/// Accepted relative residual `‖A·X − B‖ / max(‖B‖, 1)`.
pub const RESIDUAL_TOLERANCE: Real = 1e-8;

/// Tuning knobs for the control point solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Systems with fewer samples than this skip the sparse solver.
    pub dense_threshold: usize,
    /// Maximum accepted relative residual.
    pub residual_tolerance: Real,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            dense_threshold: DENSE_THRESHOLD,
            residual_tolerance: RESIDUAL_TOLERANCE,
        }
    }
}

/// Solution of the interpolation system.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoints {
    /// `1 × N` coefficient row.
    pub coefficients: Matrix,
    /// `d × N` knot averages.
    pub knot_averages: Matrix,
}

/// Assembles and solves the interpolation system for a basis.
#[derive(Debug, Clone, Copy)]
pub struct ControlPointSolver<'a> {
    basis: &'a BSplineBasis,
    settings: SolverSettings,
}

impl<'a> ControlPointSolver<'a> {
    /// Solver for `basis` with the given settings.
    pub fn new(basis: &'a BSplineBasis, settings: SolverSettings) -> Self {
        Self { basis, settings }
    }

    /// The `m × N` matrix whose row `i` holds the basis values at sample `i`.
    ///
    /// # Errors
    /// Returns an error if a sample lies outside the basis support or has
    /// the wrong dimension.
    pub fn basis_function_matrix(&self, samples: &DataTable) -> Result<SparseMatrix> {
        let rows = samples
            .samples()
            .iter()
            .map(|s| self.basis.eval(s.x()))
            .collect::<Result<Vec<SparseVector>>>()?;
        SparseMatrix::from_rows(self.basis.num_basis_functions(), rows)
    }

    /// Right-hand sides: the `m × d` sample points `Bx` and the `m × 1`
    /// sample values `By`.
    pub fn right_hand_sides(&self, samples: &DataTable) -> (Matrix, Matrix) {
        let s = samples.samples();
        let d = samples.num_variables();
        let bx = Matrix::from_fn(s.len(), d, |i, k| s[i].x()[k]);
        let by = Matrix::from_fn(s.len(), 1, |i, _| s[i].y());
        (bx, by)
    }

    /// Solvers to try for a system with `num_samples` equations.
    pub fn solver_chain(&self, num_samples: usize) -> SolverChain {
        let chain = SolverChain::new(self.settings.residual_tolerance);
        if num_samples < self.settings.dense_threshold {
            chain.then(DenseQr)
        } else {
            chain.then(SparseLu).then(DenseQr)
        }
    }

    /// Solve for the knot averages and coefficients.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if the samples do not match the basis;
    /// - [`Error::SingularSystem`] if no solver produces an acceptable
    ///   solution.
    pub fn solve(&self, samples: &DataTable) -> Result<ControlPoints> {
        let d = self.basis.num_variables();
        if samples.num_variables() != d {
            return Err(Error::InvalidArgument(format!(
                "samples have {} variables, basis has {d}",
                samples.num_variables()
            )));
        }

        let a = self.basis_function_matrix(samples)?;
        let (bx, by) = self.right_hand_sides(samples);
        let m = a.nrows();
        let rhs = Matrix::from_fn(m, d + 1, |i, k| if k < d { bx[(i, k)] } else { by[(i, 0)] });

        let chain = self.solver_chain(m);
        debug!(
            "solving for {} control points from {m} samples ({})",
            a.ncols(),
            chain.names().join(" → ")
        );
        let x = chain.solve(&a, &rhs)?;
        info!("computed {} control points", x.rows());

        let n = x.rows();
        Ok(ControlPoints {
            knot_averages: Matrix::from_fn(d, n, |k, j| x[(j, k)]),
            coefficients: Matrix::from_fn(1, n, |_, j| x[(j, d)]),
        })
    }
}
