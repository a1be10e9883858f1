//! Knot vectors: non-decreasing sequences of breakpoints.

use ms_core::{ensure, errors::Result, Real};
use std::ops::Index;

/// A non-decreasing sequence of finite knots.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotVector(Vec<Real>);

impl KnotVector {
    /// Wrap `knots` after checking they are finite and non-decreasing.
    ///
    /// # Errors
    /// Returns an error if a knot is not finite or the sequence decreases.
    pub fn new(knots: Vec<Real>) -> Result<Self> {
        ensure!(
            knots.iter().all(|k| k.is_finite()),
            "knot vector contains non-finite values"
        );
        ensure!(
            knots.windows(2).all(|w| w[0] <= w[1]),
            "knot vector must be non-decreasing"
        );
        Ok(Self(knots))
    }

    /// Knot vector with free end conditions for interpolating at `values`.
    ///
    /// The distinct sorted values `x_0 < … < x_{n-1}` give `degree + 1`
    /// copies of each end value and the interior values with `degree - 1`
    /// of them left out (the first `⌊(degree-1)/2⌋` and the last
    /// `⌈(degree-1)/2⌉`).  The resulting basis has exactly `n` functions and
    /// the interpolation matrix at `values` is nonsingular.
    ///
    /// # Errors
    /// Returns an error if `degree` is zero or there are fewer than
    /// `degree + 1` distinct values.
    pub fn free_end(values: &[Real], degree: usize) -> Result<Self> {
        ensure!(degree >= 1, "degree must be at least 1");
        ensure!(
            values.iter().all(|v| v.is_finite()),
            "grid values must be finite"
        );
        let mut unique = values.to_vec();
        unique.sort_by(|a, b| a.total_cmp(b));
        unique.dedup();
        let n = unique.len();
        ensure!(
            n > degree,
            "need at least {} distinct values for a degree {degree} knot vector, got {n}",
            degree + 1
        );

        let skip_front = (degree - 1) / 2;
        let skip_back = degree - 1 - skip_front;

        let mut knots = Vec::with_capacity(n + degree + 1);
        knots.extend(std::iter::repeat(unique[0]).take(degree + 1));
        knots.extend_from_slice(&unique[1 + skip_front..n - 1 - skip_back]);
        knots.extend(std::iter::repeat(unique[n - 1]).take(degree + 1));
        debug_assert_eq!(knots.len(), n + degree + 1);
        Ok(Self(knots))
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if there are no knots.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The knots as a slice.
    pub fn as_slice(&self) -> &[Real] {
        &self.0
    }

    /// How many times `value` occurs.
    pub fn multiplicity(&self, value: Real) -> usize {
        self.0.iter().filter(|&&k| k == value).count()
    }

    /// Distinct knot values in increasing order.
    pub fn distinct(&self) -> Vec<Real> {
        let mut out = self.0.clone();
        out.dedup();
        out
    }

    /// Insert `count` copies of `value`, keeping the sequence sorted.
    pub(crate) fn insert(&mut self, value: Real, count: usize) {
        let pos = self.0.partition_point(|&k| k <= value);
        self.0
            .splice(pos..pos, std::iter::repeat(value).take(count));
    }

    /// The knots `first..=last` as a new knot vector.
    pub(crate) fn sub_vector(&self, first: usize, last: usize) -> Self {
        Self(self.0[first..=last].to_vec())
    }

    /// Greville abscissae (knot averages) for a basis of the given degree:
    /// `μ_j = (t_{j+1} + … + t_{j+degree}) / degree`.
    pub fn greville(&self, degree: usize) -> Vec<Real> {
        let n = self.0.len().saturating_sub(degree + 1);
        (0..n)
            .map(|j| self.0[j + 1..=j + degree].iter().sum::<Real>() / degree as Real)
            .collect()
    }
}

impl Index<usize> for KnotVector {
    type Output = Real;
    fn index(&self, i: usize) -> &Real {
        &self.0[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rejects_decreasing_knots() {
        assert!(KnotVector::new(vec![0.0, 1.0, 0.5]).is_err());
        assert!(KnotVector::new(vec![0.0, Real::NAN]).is_err());
        assert!(KnotVector::new(vec![0.0, 0.0, 1.0]).is_ok());
    }

    #[test]
    fn multiplicity_counts() {
        let k = KnotVector::new(vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0]).unwrap();
        assert_eq!(k.multiplicity(0.0), 3);
        assert_eq!(k.multiplicity(0.5), 1);
        assert_eq!(k.multiplicity(0.7), 0);
        assert_eq!(k.distinct(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn free_end_linear_uses_every_value() {
        let k = KnotVector::free_end(&[2.0, 0.0, 1.0, 3.0, 1.0], 1).unwrap();
        assert_eq!(k.as_slice(), &[0.0, 0.0, 1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn free_end_cubic_drops_neighbours_of_the_ends() {
        let values: Vec<Real> = (0..6).map(|i| i as Real).collect();
        let k = KnotVector::free_end(&values, 3).unwrap();
        assert_eq!(
            k.as_slice(),
            &[0.0, 0.0, 0.0, 0.0, 2.0, 3.0, 5.0, 5.0, 5.0, 5.0]
        );
        // n + p + 1 knots
        assert_eq!(k.len(), 6 + 3 + 1);
    }

    #[test]
    fn free_end_quadratic() {
        let k = KnotVector::free_end(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();
        assert_eq!(k.as_slice(), &[0.0, 0.0, 0.0, 1.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn free_end_needs_enough_values() {
        assert!(KnotVector::free_end(&[0.0, 1.0, 2.0], 3).is_err());
        assert!(KnotVector::free_end(&[0.0, 1.0], 0).is_err());
    }

    #[test]
    fn insert_keeps_order() {
        let mut k = KnotVector::new(vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        k.insert(0.25, 2);
        k.insert(1.0, 1);
        assert_eq!(k.as_slice(), &[0.0, 0.0, 0.25, 0.25, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn greville_abscissae() {
        let k = KnotVector::new(vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0]).unwrap();
        let g = k.greville(2);
        assert_eq!(g.len(), 4);
        assert_abs_diff_eq!(g[0], 0.0);
        assert_abs_diff_eq!(g[1], 0.5);
        assert_abs_diff_eq!(g[2], 1.5);
        assert_abs_diff_eq!(g[3], 2.0);
    }
}
