//! Error types for multisplines.
//!
//! Every fallible operation in the workspace returns [`Result`], whose error
//! side is the single `thiserror`-derived [`Error`] enum defined here.  The
//! `ensure!` and `ensure_post!` macros give terse early returns for
//! precondition and postcondition failures.

use thiserror::Error;

/// Failure to read a numeric token from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumericParseError {
    /// The token is not a number of the requested type.
    #[error("invalid numeric format: {0:?}")]
    InvalidFormat(String),

    /// The token is a number, but it cannot be represented by the target type.
    #[error("numeric value out of range: {0:?}")]
    OutOfRange(String),
}

/// The top-level error type used throughout multisplines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The sample set does not cover every combination of grid values.
    #[error("incomplete grid: {0}")]
    IncompleteGrid(String),

    /// A point or a bound lies outside (or is incompatible with) the support.
    #[error("domain error: {0}")]
    Domain(String),

    /// Every solver attempt failed on the control point system.
    #[error("singular system: {0}")]
    SingularSystem(String),

    /// Knot insertion would push a knot past the maximum multiplicity.
    #[error("knot {value} would reach multiplicity {multiplicity} (maximum {max})")]
    KnotMultiplicity {
        /// The knot value being inserted.
        value: f64,
        /// The multiplicity the knot would end up with.
        multiplicity: usize,
        /// The largest admissible multiplicity (degree + 1).
        max: usize,
    },

    /// A persisted spline file does not follow the expected layout.
    #[error("malformed spline file: {0}")]
    SerializationFormat(String),

    /// A token could not be parsed as the expected numeric type.
    #[error(transparent)]
    NumericParse(#[from] NumericParseError),

    /// Underlying I/O failure (message only, so the enum stays `Clone`).
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Shorthand `Result` type used throughout multisplines.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ms_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ms_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ms_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> ms_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result > 0.0, "result must be positive, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}
