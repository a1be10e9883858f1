//! Tensor-product B-spline basis in `d` variables.
//!
//! The basis is the Kronecker product of one [`BSplineBasis1D`] per
//! variable.  Basis functions are numbered in the flattening order of
//! [`TensorIndex`] (last variable fastest).

use crate::basis_1d::BSplineBasis1D;
use crate::knot_vector::KnotVector;
use crate::tensor::{expand_transform, tensor_product, tensor_transform, TensorIndex};
use log::debug;
use ms_core::{
    ensure,
    errors::{Error, Result},
    Real,
};
use ms_math::{Matrix, SparseMatrix, SparseVector};

/// Tensor product of univariate B-spline bases.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineBasis {
    bases: Vec<BSplineBasis1D>,
}

impl BSplineBasis {
    /// Build a basis from one knot vector and one degree per variable.
    ///
    /// # Errors
    /// Returns an error if the inputs are empty or of different lengths, or
    /// if any univariate basis is invalid.
    pub fn new(knot_vectors: Vec<KnotVector>, degrees: &[usize]) -> Result<Self> {
        ensure!(!knot_vectors.is_empty(), "a basis needs at least one variable");
        ensure!(
            knot_vectors.len() == degrees.len(),
            "{} knot vectors given for {} degrees",
            knot_vectors.len(),
            degrees.len()
        );
        let bases = knot_vectors
            .into_iter()
            .zip(degrees)
            .map(|(k, &p)| BSplineBasis1D::new(k, p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bases })
    }

    /// Interpolation basis over a grid: free-end knot vectors built from the
    /// distinct values of each variable.
    ///
    /// # Errors
    /// Returns an error if a variable has too few distinct values for its
    /// degree.
    pub fn for_grid(grid: &[Vec<Real>], degrees: &[usize]) -> Result<Self> {
        ensure!(
            grid.len() == degrees.len(),
            "{} grid variables given for {} degrees",
            grid.len(),
            degrees.len()
        );
        let knots = grid
            .iter()
            .zip(degrees)
            .map(|(values, &p)| KnotVector::free_end(values, p))
            .collect::<Result<Vec<_>>>()?;
        Self::new(knots, degrees)
    }

    // ── Inspectors ────────────────────────────────────────────────────────────

    /// Number of variables `d`.
    pub fn num_variables(&self) -> usize {
        self.bases.len()
    }

    /// The univariate basis of variable `dim`.
    ///
    /// # Panics
    /// If `dim >= num_variables()`.
    pub fn basis(&self, dim: usize) -> &BSplineBasis1D {
        &self.bases[dim]
    }

    /// Per-variable number of basis functions.
    pub fn sizes(&self) -> Vec<usize> {
        self.bases.iter().map(BSplineBasis1D::num_basis_functions).collect()
    }

    /// Total number of basis functions.
    pub fn num_basis_functions(&self) -> usize {
        self.sizes().iter().product()
    }

    /// Upper bound on the nonzero basis values at any point, `Π (p_k + 1)`.
    pub fn max_nonzeros_per_sample(&self) -> usize {
        self.bases.iter().map(|b| b.degree() + 1).product()
    }

    /// Per-variable degrees.
    pub fn degrees(&self) -> Vec<usize> {
        self.bases.iter().map(BSplineBasis1D::degree).collect()
    }

    /// Per-variable knot vectors.
    pub fn knot_vectors(&self) -> Vec<Vec<Real>> {
        self.bases
            .iter()
            .map(|b| b.knots().as_slice().to_vec())
            .collect()
    }

    /// Lower corner of the support box.
    pub fn support_lower_bound(&self) -> Vec<Real> {
        self.bases.iter().map(BSplineBasis1D::support_lower_bound).collect()
    }

    /// Upper corner of the support box.
    pub fn support_upper_bound(&self) -> Vec<Real> {
        self.bases.iter().map(BSplineBasis1D::support_upper_bound).collect()
    }

    /// Return `true` if `x` has the right dimension and lies in the support.
    pub fn inside_support(&self, x: &[Real]) -> bool {
        x.len() == self.bases.len() && self.bases.iter().zip(x).all(|(b, &v)| b.inside_support(v))
    }

    /// Multiplicity of `value` in the knot vector of variable `dim`.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] for an invalid `dim`.
    pub fn knot_multiplicity(&self, dim: usize, value: Real) -> Result<usize> {
        Ok(self.checked_basis(dim)?.knot_multiplicity(value))
    }

    /// Greville abscissae of the tensor basis as a `d × N` matrix: column
    /// `j` holds the knot averages of basis function `j`.
    pub fn knot_averages(&self) -> Matrix {
        let per_dim: Vec<Vec<Real>> = self.bases.iter().map(BSplineBasis1D::greville).collect();
        let index = TensorIndex::new(&self.sizes());
        let mut out = Matrix::zeros(self.num_variables(), index.len());
        for j in 0..index.len() {
            for (k, i) in index.unflatten(j).into_iter().enumerate() {
                out[(k, j)] = per_dim[k][i];
            }
        }
        out
    }

    fn checked_basis(&self, dim: usize) -> Result<&BSplineBasis1D> {
        self.bases.get(dim).ok_or(Error::IndexOutOfRange {
            index: dim,
            size: self.bases.len(),
        })
    }

    fn check_point(&self, x: &[Real]) -> Result<()> {
        if x.len() != self.bases.len() {
            return Err(Error::InvalidArgument(format!(
                "point has {} coordinates, basis has {} variables",
                x.len(),
                self.bases.len()
            )));
        }
        if !self.inside_support(x) {
            return Err(Error::Domain(format!(
                "{x:?} lies outside the support [{:?}, {:?}]",
                self.support_lower_bound(),
                self.support_upper_bound()
            )));
        }
        Ok(())
    }

    /// Per-variable derivatives of orders `0..=max_order` at `x`.
    fn univariate_derivatives(&self, x: &[Real], max_order: usize) -> Result<Vec<Vec<SparseVector>>> {
        self.bases
            .iter()
            .zip(x)
            .map(|(b, &v)| {
                (0..=max_order)
                    .map(|k| b.eval_derivative(v, k))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Values of all `N` basis functions at `x`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] on a dimension mismatch and
    /// [`Error::Domain`] outside the support.
    pub fn eval(&self, x: &[Real]) -> Result<SparseVector> {
        self.check_point(x)?;
        let values = self
            .bases
            .iter()
            .zip(x)
            .map(|(b, &v)| b.eval(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(tensor_product(&values))
    }

    /// First partial derivatives as an `N × d` sparse matrix; column `k`
    /// holds `∂B/∂x_k`.
    ///
    /// # Errors
    /// As for [`eval`](Self::eval).
    pub fn eval_jacobian(&self, x: &[Real]) -> Result<SparseMatrix> {
        self.check_point(x)?;
        let ders = self.univariate_derivatives(x, 1)?;
        let d = self.num_variables();
        let n = self.num_basis_functions();
        let mut triplets = Vec::new();
        for col in 0..d {
            let factors: Vec<SparseVector> = (0..d)
                .map(|k| ders[k][usize::from(k == col)].clone())
                .collect();
            triplets.extend(tensor_product(&factors).iter().map(|(i, v)| (i, col, v)));
        }
        SparseMatrix::from_triplets(n, d, triplets)
    }

    /// Second partial derivatives as a `(d·N) × d` sparse matrix; entry
    /// `(r·N + i, c)` holds `∂²B_i/∂x_r∂x_c`.
    ///
    /// # Errors
    /// As for [`eval`](Self::eval).
    pub fn eval_hessian(&self, x: &[Real]) -> Result<SparseMatrix> {
        self.check_point(x)?;
        let ders = self.univariate_derivatives(x, 2)?;
        let d = self.num_variables();
        let n = self.num_basis_functions();
        let mut triplets = Vec::new();
        for r in 0..d {
            for c in 0..d {
                let factors: Vec<SparseVector> = (0..d)
                    .map(|k| {
                        let order = usize::from(k == r) + usize::from(k == c);
                        ders[k][order].clone()
                    })
                    .collect();
                triplets.extend(tensor_product(&factors).iter().map(|(i, v)| (r * n + i, c, v)));
            }
        }
        SparseMatrix::from_triplets(d * n, d, triplets)
    }

    // ── Knot operations ───────────────────────────────────────────────────────

    /// Insert `tau` with the given multiplicity into the knots of variable
    /// `dim`, returning the `N_new × N_old` coefficient transform.
    ///
    /// The basis is unchanged when an error is returned.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] for an invalid `dim`, otherwise as for
    /// [`BSplineBasis1D::insert_knots`].
    pub fn insert_knots(&mut self, tau: Real, dim: usize, multiplicity: usize) -> Result<SparseMatrix> {
        let old_sizes = self.sizes();
        let mut basis = self.checked_basis(dim)?.clone();
        let step = basis.insert_knots(tau, multiplicity)?;
        let transform = expand_transform(step, dim, &old_sizes)?;
        self.bases[dim] = basis;
        Ok(transform)
    }

    /// Halve every knot interval in every variable.
    ///
    /// # Errors
    /// Propagates failures of the univariate refinements.
    pub fn refine_knots(&mut self) -> Result<SparseMatrix> {
        let mut bases = self.bases.clone();
        let steps = bases
            .iter_mut()
            .map(BSplineBasis1D::refine)
            .collect::<Result<Vec<_>>>()?;
        let transform = tensor_transform(&steps)?;
        debug!(
            "refined basis from {} to {} functions",
            self.num_basis_functions(),
            transform.nrows()
        );
        self.bases = bases;
        Ok(transform)
    }

    /// Remove the basis functions whose support misses the box `[lb, ub]`.
    ///
    /// The basis is unchanged when an error is returned.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] on a dimension mismatch, otherwise as for
    /// [`BSplineBasis1D::reduce_support`].
    pub fn reduce_support(&mut self, lb: &[Real], ub: &[Real]) -> Result<SparseMatrix> {
        let d = self.num_variables();
        if lb.len() != d || ub.len() != d {
            return Err(Error::InvalidArgument(format!(
                "bounds have {} and {} coordinates, basis has {d} variables",
                lb.len(),
                ub.len()
            )));
        }
        let mut bases = self.bases.clone();
        let steps = bases
            .iter_mut()
            .zip(lb.iter().zip(ub))
            .map(|(b, (&l, &u))| b.reduce_support(l, u))
            .collect::<Result<Vec<_>>>()?;
        let transform = tensor_transform(&steps)?;
        self.bases = bases;
        Ok(transform)
    }
}
