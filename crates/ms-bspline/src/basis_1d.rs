//! Univariate B-spline basis of fixed degree over a knot vector.
//!
//! With `n + p + 1` knots `t_0 ≤ … ≤ t_{n+p}` and degree `p` there are `n`
//! basis functions; the support of the basis is `[t_p, t_n]`.  Values and
//! derivatives are computed with the Cox–de Boor recurrence, and knot
//! insertion uses Boehm's algorithm.  Every operation that changes the knots
//! returns the sparse `new × old` transform `T` that carries coefficients
//! over: `c_new = c_old · Tᵀ`.

use crate::knot_vector::KnotVector;
use log::trace;
use ms_core::{
    ensure, ensure_post,
    errors::{Error, Result},
    Real,
};
use ms_math::{SparseMatrix, SparseVector};

/// B-spline basis functions of degree `p` in one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineBasis1D {
    degree: usize,
    knots: KnotVector,
}

impl BSplineBasis1D {
    /// Create a basis of the given degree over `knots`.
    ///
    /// # Errors
    /// - the degree is zero, or there are fewer than `degree + 2` knots;
    /// - [`Error::KnotMultiplicity`] if a knot occurs more than `degree + 1`
    ///   times;
    /// - the support `[t_p, t_n]` is empty.
    pub fn new(knots: KnotVector, degree: usize) -> Result<Self> {
        ensure!(degree >= 1, "basis degree must be at least 1");
        ensure!(
            knots.len() >= 2 && degree <= knots.len() - 2,
            "a degree {degree} basis needs at least {} knots, got {}",
            degree.saturating_add(2),
            knots.len()
        );
        if let Some(&value) = knots
            .distinct()
            .iter()
            .find(|&&v| knots.multiplicity(v) > degree + 1)
        {
            return Err(Error::KnotMultiplicity {
                value,
                multiplicity: knots.multiplicity(value),
                max: degree + 1,
            });
        }
        let n = knots.len() - degree - 1;
        ensure!(
            knots[degree] < knots[n],
            "basis support [{}, {}] is empty",
            knots[degree],
            knots[n]
        );
        Ok(Self { degree, knots })
    }

    /// Polynomial degree `p`.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The knot vector.
    pub fn knots(&self) -> &KnotVector {
        &self.knots
    }

    /// Number of basis functions, `len(knots) - p - 1`.
    pub fn num_basis_functions(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    /// Lower end of the support, `t_p`.
    pub fn support_lower_bound(&self) -> Real {
        self.knots[self.degree]
    }

    /// Upper end of the support, `t_n`.
    pub fn support_upper_bound(&self) -> Real {
        self.knots[self.num_basis_functions()]
    }

    /// Return `true` if `x` lies in the closed support.
    pub fn inside_support(&self, x: Real) -> bool {
        self.support_lower_bound() <= x && x <= self.support_upper_bound()
    }

    /// How many times `value` occurs in the knot vector.
    pub fn knot_multiplicity(&self, value: Real) -> usize {
        self.knots.multiplicity(value)
    }

    /// Greville abscissae of the basis functions.
    pub fn greville(&self) -> Vec<Real> {
        self.knots.greville(self.degree)
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Values of all basis functions at `x`.
    ///
    /// # Errors
    /// [`Error::Domain`] if `x` lies outside the support.
    pub fn eval(&self, x: Real) -> Result<SparseVector> {
        self.eval_derivative(x, 0)
    }

    /// Derivatives of the given order of all basis functions at `x`.
    ///
    /// Orders above the degree are identically zero.
    ///
    /// # Errors
    /// [`Error::Domain`] if `x` lies outside the support.
    pub fn eval_derivative(&self, x: Real, order: usize) -> Result<SparseVector> {
        self.check_inside(x)?;
        let n = self.num_basis_functions();
        let p = self.degree;
        if order > p {
            return Ok(SparseVector::zeros(n));
        }

        let mu = self.find_span(x);
        let table = self.lower_degree_values(x, mu);
        let t = self.knots.as_slice();

        // Raise the degree one step at a time, differentiating at each step:
        // B^(k)_{i,q} = q·(B^(k-1)_{i,q-1}/(t_{i+q}-t_i) - B^(k-1)_{i+1,q-1}/(t_{i+q+1}-t_{i+1}))
        let mut d = table[p - order].clone();
        for q in (p - order + 1)..=p {
            let first = mu - q;
            let next = (0..=q)
                .map(|a| {
                    let i = first + a;
                    let left = if a >= 1 { d[a - 1] } else { 0.0 };
                    let right = if a < q { d[a] } else { 0.0 };
                    let dl = t[i + q] - t[i];
                    let dr = t[i + q + 1] - t[i + 1];
                    let l = if dl > 0.0 { left / dl } else { 0.0 };
                    let r = if dr > 0.0 { right / dr } else { 0.0 };
                    q as Real * (l - r)
                })
                .collect();
            d = next;
        }

        let entries = d
            .into_iter()
            .enumerate()
            .map(|(a, v)| (mu - p + a, v))
            .collect();
        Ok(SparseVector::from_entries(n, entries))
    }

    fn check_inside(&self, x: Real) -> Result<()> {
        if self.inside_support(x) {
            Ok(())
        } else {
            Err(Error::Domain(format!(
                "{x} lies outside the basis support [{}, {}]",
                self.support_lower_bound(),
                self.support_upper_bound()
            )))
        }
    }

    /// Index `μ` of the knot span containing `x`: `t_μ ≤ x ≤ t_{μ+1}` with
    /// `t_μ < t_{μ+1}` and `p ≤ μ < n`.  The upper end of the support maps
    /// to the last nonempty span.
    fn find_span(&self, x: Real) -> usize {
        let n = self.num_basis_functions();
        let t = self.knots.as_slice();
        if x >= t[n] {
            let mut mu = n - 1;
            while t[mu] == t[mu + 1] {
                mu -= 1;
            }
            return mu;
        }
        t.partition_point(|&k| k <= x) - 1
    }

    /// Nonzero values of the degree `q` functions at `x` for `q = 0..=p`.
    /// Entry `q` holds the values of `B_{μ-q,q}, …, B_{μ,q}`.
    fn lower_degree_values(&self, x: Real, mu: usize) -> Vec<Vec<Real>> {
        let p = self.degree;
        let t = self.knots.as_slice();
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];
        let mut table = Vec::with_capacity(p + 1);
        table.push(vec![1.0]);
        for j in 1..=p {
            left[j] = x - t[mu + 1 - j];
            right[j] = t[mu + j] - x;
            let prev = &table[j - 1];
            let mut next = vec![0.0; j + 1];
            let mut saved = 0.0;
            for r in 0..j {
                let temp = prev[r] / (right[r + 1] + left[j - r]);
                next[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            next[j] = saved;
            table.push(next);
        }
        table
    }

    // ── Knot operations ───────────────────────────────────────────────────────

    /// Insert `tau` with the given multiplicity.
    ///
    /// On success the knots are updated and the `new × old` coefficient
    /// transform is returned.  On failure nothing changes.
    ///
    /// # Errors
    /// - [`Error::Domain`] if `tau` lies outside the support;
    /// - [`Error::KnotMultiplicity`] if the resulting multiplicity would
    ///   exceed `degree + 1`.
    pub fn insert_knots(&mut self, tau: Real, multiplicity: usize) -> Result<SparseMatrix> {
        self.check_inside(tau)?;
        let current = self.knots.multiplicity(tau);
        if current.saturating_add(multiplicity) > self.degree + 1 {
            return Err(Error::KnotMultiplicity {
                value: tau,
                multiplicity: current.saturating_add(multiplicity),
                max: self.degree + 1,
            });
        }

        let mut knots = self.knots.clone();
        let mut transform = SparseMatrix::identity(self.num_basis_functions())?;
        for _ in 0..multiplicity {
            let step = boehm_step(&knots, self.degree, tau)?;
            knots.insert(tau, 1);
            transform = step.mul(&transform)?;
        }
        trace!("inserted knot {tau} (multiplicity {multiplicity})");
        self.knots = knots;
        Ok(transform)
    }

    /// Insert the midpoint of every nonempty knot interval inside the
    /// support.
    ///
    /// # Errors
    /// Propagates failures of the individual insertions.
    pub fn refine(&mut self) -> Result<SparseMatrix> {
        let (lb, ub) = (self.support_lower_bound(), self.support_upper_bound());
        let breakpoints: Vec<Real> = self
            .knots
            .distinct()
            .into_iter()
            .filter(|&k| lb <= k && k <= ub)
            .collect();
        let midpoints: Vec<Real> = breakpoints
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect();

        let mut refined = self.clone();
        let mut transform = SparseMatrix::identity(self.num_basis_functions())?;
        for m in midpoints {
            let step = refined.insert_knots(m, 1)?;
            transform = step.mul(&transform)?;
        }
        *self = refined;
        Ok(transform)
    }

    /// Drop every basis function whose support does not meet `(lb, ub)`.
    ///
    /// The knots are cut down to those of the kept functions, and the
    /// returned transform selects the kept coefficients.
    ///
    /// # Errors
    /// [`Error::Domain`] if `lb ≥ ub` or the bounds lie outside the support.
    pub fn reduce_support(&mut self, lb: Real, ub: Real) -> Result<SparseMatrix> {
        if lb >= ub {
            return Err(Error::Domain(format!(
                "lower bound {lb} must be smaller than upper bound {ub}"
            )));
        }
        if !(self.inside_support(lb) && self.inside_support(ub)) {
            return Err(Error::Domain(format!(
                "[{lb}, {ub}] is not contained in the support [{}, {}]",
                self.support_lower_bound(),
                self.support_upper_bound()
            )));
        }

        let p = self.degree;
        let n = self.num_basis_functions();
        let t = self.knots.as_slice();
        let kept: Vec<usize> = (0..n)
            .filter(|&i| t[i + p + 1] > lb && t[i] < ub)
            .collect();
        let (Some(&first), Some(&last)) = (kept.first(), kept.last()) else {
            return Err(Error::Domain(format!(
                "no basis function is supported on [{lb}, {ub}]"
            )));
        };

        let reduced = Self::new(self.knots.sub_vector(first, last + p + 1), p)?;
        ensure_post!(
            reduced.support_lower_bound() <= lb && reduced.support_upper_bound() >= ub,
            "reduced basis no longer covers [{lb}, {ub}]"
        );

        let count = last - first + 1;
        let transform = SparseMatrix::from_triplets(
            count,
            n,
            (0..count).map(|i| (i, first + i, 1.0)).collect(),
        )?;
        trace!("kept basis functions {first}..={last} of {n}");
        *self = reduced;
        Ok(transform)
    }
}

/// Boehm transform for inserting `tau` once into `knots`.
///
/// `α_i` is 1 where `t_{i+p} ≤ τ`, 0 where `t_i ≥ τ`, and
/// `(τ - t_i)/(t_{i+p} - t_i)` in between; then `c'_i = α_i c_i + (1-α_i) c_{i-1}`.
fn boehm_step(knots: &KnotVector, degree: usize, tau: Real) -> Result<SparseMatrix> {
    let t = knots.as_slice();
    let n = t.len() - degree - 1;
    let mut triplets = Vec::with_capacity(2 * (n + 1));
    for i in 0..=n {
        let alpha = if t[i + degree] <= tau {
            1.0
        } else if t[i] >= tau {
            0.0
        } else {
            (tau - t[i]) / (t[i + degree] - t[i])
        };
        if i < n && alpha != 0.0 {
            triplets.push((i, i, alpha));
        }
        if i >= 1 && alpha != 1.0 {
            triplets.push((i, i - 1, 1.0 - alpha));
        }
    }
    SparseMatrix::from_triplets(n + 1, n, triplets)
}
