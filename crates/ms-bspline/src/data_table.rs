//! Scattered samples `(x, y)` with `x ∈ ℝᵈ`, kept sorted.
//!
//! Besides the samples themselves, the table tracks the distinct values seen
//! in each coordinate.  A table whose samples cover every combination of
//! those values exactly once is a complete grid and can be interpolated.

use log::warn;
use ms_core::{
    errors::{Error, Result},
    Real,
};
use std::cmp::Ordering;

/// One sample: a point and the function value observed there.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSample {
    x: Vec<Real>,
    y: Real,
}

impl DataSample {
    /// The sample point.
    pub fn x(&self) -> &[Real] {
        &self.x
    }

    /// The sample value.
    pub fn y(&self) -> Real {
        self.y
    }
}

fn lexicographic(a: &[Real], b: &[Real]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(u, v)| u.total_cmp(v))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Samples sorted lexicographically by point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    allow_duplicates: bool,
    num_duplicates: usize,
    samples: Vec<DataSample>,
    grid: Vec<Vec<Real>>,
}

impl DataTable {
    /// An empty table that discards repeated points.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table; repeated points are kept when `allow_duplicates`.
    pub fn with_duplicates(allow_duplicates: bool) -> Self {
        Self {
            allow_duplicates,
            ..Self::default()
        }
    }

    /// Build a table from `(x, y)` pairs.
    ///
    /// # Errors
    /// As for [`add_sample`](Self::add_sample).
    pub fn from_samples<I>(samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<Real>, Real)>,
    {
        let mut table = Self::new();
        for (x, y) in samples {
            table.add_sample(&x, y)?;
        }
        Ok(table)
    }

    /// Add a sample.
    ///
    /// A point that is already present is dropped (with a warning) unless
    /// the table allows duplicates.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `x` is empty, contains non-finite
    /// values, or its dimension differs from earlier samples.
    pub fn add_sample(&mut self, x: &[Real], y: Real) -> Result<()> {
        if x.is_empty() {
            return Err(Error::InvalidArgument("sample point has no coordinates".into()));
        }
        if let Some(first) = self.samples.first() {
            if first.x.len() != x.len() {
                return Err(Error::InvalidArgument(format!(
                    "sample has {} coordinates, table has {}",
                    x.len(),
                    first.x.len()
                )));
            }
        }
        if !x.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidArgument(format!("sample point {x:?} is not finite")));
        }
        // `total_cmp` orders -0.0 before 0.0; store a single zero.
        let x: Vec<Real> = x.iter().map(|&v| if v == 0.0 { 0.0 } else { v }).collect();

        let pos = match self.samples.binary_search_by(|s| lexicographic(&s.x, &x)) {
            Ok(pos) if self.allow_duplicates => {
                self.num_duplicates += 1;
                pos
            }
            Ok(_) => {
                warn!("discarding duplicate sample at {x:?}");
                return Ok(());
            }
            Err(pos) => pos,
        };
        self.samples.insert(
            pos,
            DataSample { x: x.clone(), y },
        );

        if self.grid.is_empty() {
            self.grid = vec![Vec::new(); x.len()];
        }
        for (values, &v) in self.grid.iter_mut().zip(&x) {
            if let Err(at) = values.binary_search_by(|u| u.total_cmp(&v)) {
                values.insert(at, v);
            }
        }
        Ok(())
    }

    /// Number of variables (zero for an empty table).
    pub fn num_variables(&self) -> usize {
        self.grid.len()
    }

    /// Number of stored samples.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Number of repeated points stored.
    pub fn num_duplicates(&self) -> usize {
        self.num_duplicates
    }

    /// The samples in lexicographic order of their points.
    pub fn samples(&self) -> &[DataSample] {
        &self.samples
    }

    /// Sorted distinct values of each coordinate.
    pub fn grid_values(&self) -> &[Vec<Real>] {
        &self.grid
    }

    /// Return `true` if the samples cover the full grid of distinct
    /// coordinate values exactly once.
    pub fn is_grid_complete(&self) -> bool {
        !self.samples.is_empty()
            && self.num_duplicates == 0
            && self.samples.len() == self.grid.iter().map(Vec::len).product::<usize>()
    }

    /// Fail with [`Error::IncompleteGrid`] unless the table is a complete
    /// grid.
    ///
    /// # Errors
    /// See above.
    pub fn ensure_complete_grid(&self) -> Result<()> {
        if self.is_grid_complete() {
            Ok(())
        } else {
            Err(Error::IncompleteGrid(format!(
                "{} samples ({} duplicates) for a grid of {} points",
                self.samples.len(),
                self.num_duplicates,
                self.grid.iter().map(Vec::len).product::<usize>()
            )))
        }
    }
}
