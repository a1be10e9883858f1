//! # multisplines
//!
//! Multivariate tensor-product B-splines: interpolation of gridded data,
//! evaluation with gradients and Hessians, knot insertion and refinement,
//! domain reduction, and a plain-text model format.
//!
//! This crate is a **façade** that re-exports the public items of the
//! workspace crates.  Application code should depend on this crate rather
//! than the individual `ms-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! multisplines = "0.1"
//! ```
//!
//! ```rust
//! use multisplines::{BSpline, BSplineType, DataTable};
//!
//! let mut samples = DataTable::new();
//! for i in 0..5 {
//!     for j in 0..5 {
//!         let (x, y) = (0.25 * i as f64, 0.25 * j as f64);
//!         samples.add_sample(&[x, y], x * x + y).unwrap();
//!     }
//! }
//! let mut spline = BSpline::interpolate(&samples, BSplineType::Cubic).unwrap();
//! spline.refine_knot_vectors().unwrap();
//! let value = spline.eval(&[0.3, 0.6]).unwrap();
//! assert!((value - (0.09 + 0.6)).abs() < 1e-10);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, error definitions and number text utilities.
pub use ms_core as core;

/// Dense and sparse matrices and linear solvers.
pub use ms_math as math;

/// B-spline bases, models and model files.
pub use ms_bspline as bspline;

pub use ms_bspline::{BSpline, BSplineType, DataTable, SolverSettings};
pub use ms_core::{Error, Real, Result};
