//! Tensor-product B-spline functions `f: ℝᵈ → ℝ`.
//!
//! A [`BSpline`] pairs a [`BSplineBasis`] with one coefficient per basis
//! function, `f(x) = Σ_i c_i B_i(x)`, and tracks the knot averages so that
//! the control points `(μ_i, c_i)` stay available.  Knot operations re-express
//! the same function in a finer (or smaller) basis; each one either succeeds
//! completely or leaves the spline untouched.

use crate::basis::BSplineBasis;
use crate::control_points::{ControlPointSolver, SolverSettings};
use crate::data_table::DataTable;
use crate::knot_vector::KnotVector;
use log::{debug, info};
use ms_core::{
    ensure, ensure_post,
    errors::{Error, Result},
    Real,
};
use ms_math::{Matrix, SparseMatrix};

/// Degree presets for interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BSplineType {
    /// Degree 1.
    Linear,
    /// Degree 2.
    Quadratic,
    /// Degree 3.
    #[default]
    Cubic,
}

impl BSplineType {
    /// Polynomial degree of the preset.
    pub fn degree(self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Quadratic => 2,
            Self::Cubic => 3,
        }
    }

    /// Preset for a degree; anything other than 1 or 2 maps to cubic.
    pub fn from_degree(degree: usize) -> Self {
        match degree {
            1 => Self::Linear,
            2 => Self::Quadratic,
            _ => Self::Cubic,
        }
    }
}

/// A tensor-product B-spline function.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    basis: BSplineBasis,
    coefficients: Matrix,
    knot_averages: Matrix,
}

impl BSpline {
    // ── Construction ──────────────────────────────────────────────────────────

    /// Spline with explicit coefficients, knot vectors and degrees.
    ///
    /// Knot averages are set to the Greville abscissae.
    ///
    /// # Errors
    /// Returns an error if the basis is invalid or the number of
    /// coefficients differs from the number of basis functions.
    pub fn new(coefficients: &[Real], knot_vectors: Vec<Vec<Real>>, degrees: &[usize]) -> Result<Self> {
        let knots = knot_vectors
            .into_iter()
            .map(KnotVector::new)
            .collect::<Result<Vec<_>>>()?;
        let basis = BSplineBasis::new(knots, degrees)?;
        Self::from_basis(basis, Matrix::row_vector(coefficients))
    }

    /// Spline over `basis` with a `1 × N` coefficient row and Greville knot
    /// averages.
    ///
    /// # Errors
    /// Returns an error if the coefficient row does not match the basis.
    pub fn from_basis(basis: BSplineBasis, coefficients: Matrix) -> Result<Self> {
        let knot_averages = basis.knot_averages();
        let spline = Self {
            basis,
            coefficients,
            knot_averages,
        };
        spline.check_control_points()?;
        Ok(spline)
    }

    /// Interpolate samples on a complete grid with the default solver
    /// settings.
    ///
    /// # Errors
    /// See [`interpolate_with`](Self::interpolate_with).
    pub fn interpolate(samples: &DataTable, kind: BSplineType) -> Result<Self> {
        Self::interpolate_with(samples, kind, &SolverSettings::default())
    }

    /// Interpolate samples on a complete grid.
    ///
    /// Every variable gets a free-end knot vector of the preset degree, so
    /// the interpolation system is square.
    ///
    /// # Errors
    /// - [`Error::IncompleteGrid`] if the samples do not form a complete grid;
    /// - an error if some variable has too few distinct values for the degree;
    /// - [`Error::SingularSystem`] if the control points cannot be solved for.
    pub fn interpolate_with(samples: &DataTable, kind: BSplineType, settings: &SolverSettings) -> Result<Self> {
        samples.ensure_complete_grid()?;
        let degrees = vec![kind.degree(); samples.num_variables()];
        let basis = BSplineBasis::for_grid(samples.grid_values(), &degrees)?;
        info!(
            "interpolating {} samples in {} variables with a degree {} basis",
            samples.num_samples(),
            samples.num_variables(),
            kind.degree()
        );
        let cp = ControlPointSolver::new(&basis, *settings).solve(samples)?;
        let spline = Self {
            basis,
            coefficients: cp.coefficients,
            knot_averages: cp.knot_averages,
        };
        spline.check_control_points()?;
        Ok(spline)
    }

    // ── Inspectors ────────────────────────────────────────────────────────────

    /// The underlying basis.
    pub fn basis(&self) -> &BSplineBasis {
        &self.basis
    }

    /// Number of input variables `d`.
    pub fn num_variables(&self) -> usize {
        self.basis.num_variables()
    }

    /// Number of basis functions (and coefficients) `N`.
    pub fn num_basis_functions(&self) -> usize {
        self.basis.num_basis_functions()
    }

    /// Per-variable knot vectors.
    pub fn knot_vectors(&self) -> Vec<Vec<Real>> {
        self.basis.knot_vectors()
    }

    /// Per-variable degrees.
    pub fn basis_degrees(&self) -> Vec<usize> {
        self.basis.degrees()
    }

    /// Lower corner of the domain.
    pub fn domain_lower_bound(&self) -> Vec<Real> {
        self.basis.support_lower_bound()
    }

    /// Upper corner of the domain.
    pub fn domain_upper_bound(&self) -> Vec<Real> {
        self.basis.support_upper_bound()
    }

    /// Return `true` if `x` lies in the domain.
    pub fn point_in_domain(&self, x: &[Real]) -> bool {
        self.basis.inside_support(x)
    }

    /// The `1 × N` coefficient row.
    pub fn coefficients(&self) -> &Matrix {
        &self.coefficients
    }

    /// The `d × N` knot averages.
    pub fn knot_averages(&self) -> &Matrix {
        &self.knot_averages
    }

    /// Control points as a `(d + 1) × N` matrix: the knot averages stacked
    /// above the coefficients.
    pub fn control_points(&self) -> Matrix {
        let d = self.num_variables();
        let n = self.num_basis_functions();
        Matrix::from_fn(d + 1, n, |r, j| {
            if r < d {
                self.knot_averages[(r, j)]
            } else {
                self.coefficients[(0, j)]
            }
        })
    }

    /// Replace the control points with a `(d + 1) × N` matrix.
    ///
    /// # Errors
    /// Returns an error (leaving the spline unchanged) if the shape is wrong.
    pub fn set_control_points(&mut self, control_points: &Matrix) -> Result<()> {
        let d = self.num_variables();
        let n = self.num_basis_functions();
        ensure!(
            control_points.rows() == d + 1 && control_points.cols() == n,
            "control points must be {}×{n}, got {}×{}",
            d + 1,
            control_points.rows(),
            control_points.cols()
        );
        self.knot_averages = control_points.row_block(0, d);
        self.coefficients = control_points.row_block(d, 1);
        Ok(())
    }

    fn check_control_points(&self) -> Result<()> {
        let n = self.num_basis_functions();
        ensure!(
            self.coefficients.rows() == 1 && self.coefficients.cols() == n,
            "expected 1×{n} coefficients, got {}×{}",
            self.coefficients.rows(),
            self.coefficients.cols()
        );
        ensure_post!(
            self.knot_averages.rows() == self.num_variables() && self.knot_averages.cols() == n,
            "knot averages are {}×{}, expected {}×{n}",
            self.knot_averages.rows(),
            self.knot_averages.cols(),
            self.num_variables()
        );
        Ok(())
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// `f(x)`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] on a dimension mismatch and
    /// [`Error::Domain`] outside the domain.
    pub fn eval(&self, x: &[Real]) -> Result<Real> {
        let values = self.basis.eval(x)?;
        Ok(values.iter().map(|(i, v)| v * self.coefficients[(0, i)]).sum())
    }

    /// Gradient of `f` at `x` as a `1 × d` matrix.
    ///
    /// # Errors
    /// As for [`eval`](Self::eval).
    pub fn eval_jacobian(&self, x: &[Real]) -> Result<Matrix> {
        let db = self.basis.eval_jacobian(x)?;
        let mut out = Matrix::zeros(1, self.num_variables());
        for (i, k, v) in db.triplets() {
            out[(0, k)] += self.coefficients[(0, i)] * v;
        }
        Ok(out)
    }

    /// Hessian of `f` at `x` as a symmetric `d × d` matrix.
    ///
    /// # Errors
    /// As for [`eval`](Self::eval).
    pub fn eval_hessian(&self, x: &[Real]) -> Result<Matrix> {
        let d = self.num_variables();
        let n = self.num_basis_functions();
        let ddb = self.basis.eval_hessian(x)?;
        let mut out = Matrix::zeros(d, d);
        for (q, c, v) in ddb.triplets() {
            let (r, i) = (q / n, q % n);
            out[(r, c)] += self.coefficients[(0, i)] * v;
        }
        Ok(out)
    }

    // ── Knot operations ───────────────────────────────────────────────────────

    /// Insert `tau` with the given multiplicity into the knots of variable
    /// `dim`.  The function is unchanged; only its representation grows.
    ///
    /// # Errors
    /// - [`Error::IndexOutOfRange`] for an invalid `dim`;
    /// - [`Error::Domain`] if `tau` lies outside the domain;
    /// - [`Error::KnotMultiplicity`] if the multiplicity would exceed
    ///   `degree + 1`.
    pub fn insert_knots(&mut self, tau: Real, dim: usize, multiplicity: usize) -> Result<()> {
        let mut basis = self.basis.clone();
        let transform = basis.insert_knots(tau, dim, multiplicity)?;
        self.commit(basis, &transform)
    }

    /// Insert the midpoint of every knot interval in every variable.
    ///
    /// # Errors
    /// Propagates failures of the underlying insertions.
    pub fn refine_knot_vectors(&mut self) -> Result<()> {
        let mut basis = self.basis.clone();
        let transform = basis.refine_knots()?;
        self.commit(basis, &transform)
    }

    /// Restrict the spline to the box `[lb, ub]`.
    ///
    /// The bounds are clipped to the current domain.  If the clipped box is
    /// strictly smaller, the knots at the new bounds are optionally raised to
    /// multiplicity `degree + 1` (so the new domain is exactly the box),
    /// basis functions that vanish on the box are removed, and the knot
    /// vectors are optionally refined.  The spline is unchanged on error.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if the bounds have the wrong dimension;
    /// - [`Error::Domain`] if `lb ≥ ub` in some variable or the box does not
    ///   meet the domain.
    pub fn reduce_domain(&mut self, lb: &[Real], ub: &[Real], regularize: bool, refine: bool) -> Result<()> {
        let d = self.num_variables();
        if lb.len() != d || ub.len() != d {
            return Err(Error::InvalidArgument(format!(
                "bounds have {} and {} coordinates, spline has {d} variables",
                lb.len(),
                ub.len()
            )));
        }

        let current_lb = self.domain_lower_bound();
        let current_ub = self.domain_upper_bound();
        let mut new_lb = current_lb.clone();
        let mut new_ub = current_ub.clone();
        let mut strictly_smaller = false;
        for k in 0..d {
            if lb[k] >= ub[k] {
                return Err(Error::Domain(format!(
                    "lower bound {} must be smaller than upper bound {} in variable {k}",
                    lb[k], ub[k]
                )));
            }
            if lb[k] >= current_ub[k] || ub[k] <= current_lb[k] {
                return Err(Error::Domain(format!(
                    "[{}, {}] does not meet the domain [{}, {}] in variable {k}",
                    lb[k], ub[k], current_lb[k], current_ub[k]
                )));
            }
            if lb[k] > current_lb[k] {
                new_lb[k] = lb[k];
                strictly_smaller = true;
            }
            if ub[k] < current_ub[k] {
                new_ub[k] = ub[k];
                strictly_smaller = true;
            }
        }
        if !strictly_smaller {
            return Ok(());
        }

        let mut reduced = self.clone();
        if regularize {
            reduced.regularize_knot_vectors(&new_lb, &new_ub)?;
        }
        let mut basis = reduced.basis.clone();
        let transform = basis.reduce_support(&new_lb, &new_ub)?;
        reduced.commit(basis, &transform)?;
        if refine {
            reduced.refine_knot_vectors()?;
        }
        debug!(
            "reduced domain to {new_lb:?}..{new_ub:?} ({} → {} basis functions)",
            self.num_basis_functions(),
            reduced.num_basis_functions()
        );
        *self = reduced;
        Ok(())
    }

    /// Raise the multiplicity of the knots at `lb` and `ub` to `degree + 1`
    /// in every variable.
    fn regularize_knot_vectors(&mut self, lb: &[Real], ub: &[Real]) -> Result<()> {
        let degrees = self.basis_degrees();
        for (k, &p) in degrees.iter().enumerate() {
            for bound in [lb[k], ub[k]] {
                let missing = (p + 1).saturating_sub(self.basis.knot_multiplicity(k, bound)?);
                if missing > 0 {
                    self.insert_knots(bound, k, missing)?;
                }
            }
        }
        Ok(())
    }

    /// Move the control points through `transform` and adopt `basis`.
    fn commit(&mut self, basis: BSplineBasis, transform: &SparseMatrix) -> Result<()> {
        let coefficients = transform.transform_rows(&self.coefficients)?;
        let knot_averages = transform.transform_rows(&self.knot_averages)?;
        ensure_post!(
            coefficients.cols() == basis.num_basis_functions(),
            "transform produced {} coefficients for {} basis functions",
            coefficients.cols(),
            basis.num_basis_functions()
        );
        self.basis = basis;
        self.coefficients = coefficients;
        self.knot_averages = knot_averages;
        Ok(())
    }
}
