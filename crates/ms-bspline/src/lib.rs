//! # ms-bspline
//!
//! Tensor-product B-splines over `ℝᵈ`: knot vectors, univariate and
//! tensor bases, grid interpolation through a sparse/dense solver chain,
//! knot insertion, refinement, domain reduction, and a plain-text model
//! format.
//!
//! ```
//! use ms_bspline::{BSpline, BSplineType, DataTable};
//!
//! let mut table = DataTable::new();
//! for i in 0..4 {
//!     for j in 0..4 {
//!         let (x, y) = (i as f64, j as f64);
//!         table.add_sample(&[x, y], x * y).unwrap();
//!     }
//! }
//! let spline = BSpline::interpolate(&table, BSplineType::Linear).unwrap();
//! assert!((spline.eval(&[2.0, 3.0]).unwrap() - 6.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Tensor-product basis.
pub mod basis;

/// Univariate basis.
pub mod basis_1d;

/// The spline model.
pub mod bspline;

/// Interpolation system assembly and solve.
pub mod control_points;

/// Sample storage.
pub mod data_table;

/// Text save/load.
pub mod io;

/// Knot vectors.
pub mod knot_vector;

/// Tensor indexing and Kronecker products.
pub mod tensor;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use basis::BSplineBasis;
pub use basis_1d::BSplineBasis1D;
pub use bspline::{BSpline, BSplineType};
pub use control_points::{ControlPointSolver, ControlPoints, SolverSettings};
pub use data_table::{DataSample, DataTable};
pub use io::NumberFormat;
pub use knot_vector::KnotVector;
pub use tensor::TensorIndex;
