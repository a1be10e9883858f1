//! Plain-text save/load of [`BSpline`] models.
//!
//! The format is line based.  Lines starting with `#` are comments and blank
//! lines are ignored.  The remaining lines are, in order:
//!
//! ```text
//! d                       number of variables
//! p_k len_k               degree and knot count of variable k   ┐ repeated
//! t_0 t_1 … t_{len_k-1}   knots of variable k                   ┘ d times
//! rows cols               coefficient matrix shape (1 × N)
//! c_0 c_1 … c_{N-1}       one line per coefficient row
//! ```
//!
//! Reals are written with 17 significant digits, which round-trips every
//! `f64` exactly.  Reading and writing never depend on the process locale.

use crate::basis::BSplineBasis;
use crate::basis_1d::BSplineBasis1D;
use crate::bspline::BSpline;
use crate::knot_vector::KnotVector;
use log::{debug, info};
use ms_core::{
    errors::{Error, Result},
    utilities::{
        data_formatters::format_real,
        data_parsers::TokenReader,
    },
    Real,
};
use ms_math::Matrix;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Number formatting used while writing a model file.
///
/// The formatter is created for one save and dropped with it, so nothing
/// leaks into the rest of the process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat;

impl NumberFormat {
    /// Format one value with enough digits to read it back exactly.
    pub fn real(&self, value: Real) -> String {
        format_real(value)
    }

    /// Format values separated by single spaces.
    pub fn row(&self, values: &[Real]) -> String {
        values
            .iter()
            .map(|&v| self.real(v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn malformed(line_no: usize, what: impl std::fmt::Display) -> Error {
    Error::SerializationFormat(format!("line {line_no}: {what}"))
}

/// Attach the line number to structural errors; numeric parse errors pass
/// through unchanged so callers can tell bad tokens from bad layout.
fn locate(line_no: usize, e: Error) -> Error {
    match e {
        Error::NumericParse(_) => e,
        other => malformed(line_no, other),
    }
}

/// Where the reader is in the file.
#[derive(Debug)]
enum Section {
    NumVariables,
    Header { dim: usize },
    Knots { dim: usize, degree: usize, len: usize },
    Shape,
    Coefficients { cols: usize },
    Done,
}

impl BSpline {
    /// Write the model to `path`, replacing any existing file.
    ///
    /// # Errors
    /// [`Error::Io`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_to_writer(&mut writer)?;
        writer.flush()?;
        info!("saved B-spline to {}", path.display());
        Ok(())
    }

    /// Write the model in text form.
    ///
    /// # Errors
    /// [`Error::Io`] if writing fails.
    pub fn save_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let fmt = NumberFormat::default();
        let degrees = self.basis_degrees();
        let knots = self.knot_vectors();

        writeln!(writer, "# Saved BSpline")?;
        writeln!(writer, "# Number of variables:")?;
        writeln!(writer, "{}", self.num_variables())?;
        for (k, (p, t)) in degrees.iter().zip(&knots).enumerate() {
            writeln!(writer, "# Variable {k}: degree, number of knots, knots")?;
            writeln!(writer, "{p} {}", t.len())?;
            writeln!(writer, "{}", fmt.row(t))?;
        }
        let c = self.coefficients();
        writeln!(writer, "# Coefficients:")?;
        writeln!(writer, "{} {}", c.rows(), c.cols())?;
        for i in 0..c.rows() {
            writeln!(writer, "{}", fmt.row(&c.row(i)))?;
        }
        Ok(())
    }

    /// Read a model from `path`.
    ///
    /// # Errors
    /// [`Error::Io`] if the file cannot be read and
    /// [`Error::SerializationFormat`] if its contents are malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let spline = Self::load_from_reader(BufReader::new(File::open(path)?))?;
        info!("loaded B-spline from {}", path.display());
        Ok(spline)
    }

    /// Read a model in text form.
    ///
    /// # Errors
    /// - [`Error::NumericParse`] for a token that is not a number or does not
    ///   fit the target type;
    /// - [`Error::SerializationFormat`] if the layout is malformed or the
    ///   model it describes is inconsistent;
    /// - [`Error::Io`] if reading fails.
    pub fn load_from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut section = Section::NumVariables;
        let mut num_variables = 0;
        let mut degrees = Vec::new();
        let mut knot_vectors = Vec::new();
        let mut sizes = Vec::new();
        let mut coefficients: Option<Matrix> = None;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut tokens = TokenReader::new(trimmed);
            let with_line = |e: Error| locate(line_no, e);

            section = match section {
                Section::NumVariables => {
                    num_variables = tokens.next_integer::<usize>().map_err(with_line)?;
                    if num_variables == 0 {
                        return Err(malformed(line_no, "a model needs at least one variable"));
                    }
                    Section::Header { dim: 0 }
                }
                Section::Header { dim } => {
                    let degree = tokens.next_integer::<usize>().map_err(with_line)?;
                    let len = tokens.next_integer::<usize>().map_err(with_line)?;
                    Section::Knots { dim, degree, len }
                }
                Section::Knots { dim, degree, len } => {
                    let knots = KnotVector::new(tokens.take_reals(len).map_err(with_line)?)
                        .map_err(with_line)?;
                    let basis = BSplineBasis1D::new(knots.clone(), degree).map_err(with_line)?;
                    sizes.push(basis.num_basis_functions());
                    degrees.push(degree);
                    knot_vectors.push(knots);
                    if dim + 1 < num_variables {
                        Section::Header { dim: dim + 1 }
                    } else {
                        Section::Shape
                    }
                }
                Section::Shape => {
                    let rows = tokens.next_integer::<usize>().map_err(with_line)?;
                    let cols = tokens.next_integer::<usize>().map_err(with_line)?;
                    if rows != 1 {
                        return Err(malformed(
                            line_no,
                            format!("coefficients must form a single row, got {rows}×{cols}"),
                        ));
                    }
                    let expected = sizes
                        .iter()
                        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
                        .ok_or_else(|| malformed(line_no, "basis size overflows"))?;
                    if cols != expected {
                        return Err(malformed(
                            line_no,
                            format!("the basis has {expected} functions but {cols} coefficients are declared"),
                        ));
                    }
                    Section::Coefficients { cols }
                }
                Section::Coefficients { cols } => {
                    let values = tokens.take_reals(cols).map_err(with_line)?;
                    coefficients = Some(Matrix::row_vector(&values));
                    Section::Done
                }
                Section::Done => return Err(malformed(line_no, "unexpected data after coefficients")),
            };
            if !tokens.is_exhausted() {
                return Err(malformed(line_no, "unexpected trailing values"));
            }
        }

        let (Section::Done, Some(coefficients)) = (&section, coefficients) else {
            return Err(Error::SerializationFormat(format!(
                "unexpected end of input while reading {section:?}"
            )));
        };
        debug!("read {num_variables} knot vectors and {} coefficients", coefficients.cols());

        let basis = BSplineBasis::new(knot_vectors, &degrees)
            .map_err(|e| Error::SerializationFormat(format!("invalid basis: {e}")))?;
        Self::from_basis(basis, coefficients)
            .map_err(|e| Error::SerializationFormat(format!("inconsistent model: {e}")))
    }
}
