//! Checked number parsing.
//!
//! Tokens are parsed with Rust's own `FromStr` implementations, which always
//! use `.` as the decimal point whatever the host locale.  Failures are split
//! into [`NumericParseError::InvalidFormat`] (not a number at all) and
//! [`NumericParseError::OutOfRange`] (a number the target type cannot hold).

use std::num::{IntErrorKind, ParseIntError};
use std::str::{FromStr, SplitWhitespace};

use num_traits::Float;

use crate::errors::{Error, NumericParseError, Result};

/// Parse one floating-point token.
///
/// A finite literal that overflows to infinity, or a literal with a non-zero
/// mantissa that underflows to zero, is reported as out of range.  Explicit
/// `inf` / `nan` spellings are accepted as such.
pub fn parse_real<T>(token: &str) -> Result<T, NumericParseError>
where
    T: Float + FromStr,
{
    let token = token.trim();
    let value: T = token
        .parse()
        .map_err(|_| NumericParseError::InvalidFormat(token.to_string()))?;

    if value.is_infinite() && !spells_special(token) {
        return Err(NumericParseError::OutOfRange(token.to_string()));
    }
    if value.is_zero() && mantissa_is_nonzero(token) {
        return Err(NumericParseError::OutOfRange(token.to_string()));
    }
    Ok(value)
}

/// Parse one integer token into `T`.
pub fn parse_integer<T>(token: &str) -> Result<T, NumericParseError>
where
    T: FromStr<Err = ParseIntError>,
{
    let token = token.trim();
    token.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            NumericParseError::OutOfRange(token.to_string())
        }
        _ => NumericParseError::InvalidFormat(token.to_string()),
    })
}

fn spells_special(token: &str) -> bool {
    let t = token.trim_start_matches(['+', '-']).to_ascii_lowercase();
    t == "inf" || t == "infinity" || t == "nan"
}

fn mantissa_is_nonzero(token: &str) -> bool {
    token
        .split(['e', 'E'])
        .next()
        .map(|m| m.chars().any(|c| c.is_ascii_digit() && c != '0'))
        .unwrap_or(false)
}

/// Sequential reader over the whitespace-separated tokens of one line.
///
/// Running out of tokens is a [`Error::SerializationFormat`] error; a token
/// that is present but unparseable is a [`Error::NumericParse`] error.
#[derive(Debug)]
pub struct TokenReader<'a> {
    line: &'a str,
    tokens: SplitWhitespace<'a>,
}

impl<'a> TokenReader<'a> {
    /// Start reading `line`.
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            tokens: line.split_whitespace(),
        }
    }

    fn next_token(&mut self) -> Result<&'a str> {
        self.tokens.next().ok_or_else(|| {
            Error::SerializationFormat(format!("missing value in line {:?}", self.line))
        })
    }

    /// Read the next token as an `f64`.
    pub fn next_real(&mut self) -> Result<f64> {
        Ok(parse_real::<f64>(self.next_token()?)?)
    }

    /// Read the next token as an integer of type `T`.
    pub fn next_integer<T>(&mut self) -> Result<T>
    where
        T: FromStr<Err = ParseIntError>,
    {
        Ok(parse_integer::<T>(self.next_token()?)?)
    }

    /// Read exactly `n` reals.
    pub fn take_reals(&mut self, n: usize) -> Result<Vec<f64>> {
        (0..n).map(|_| self.next_real()).collect()
    }

    /// Return `true` if every token has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.tokens.clone().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_real() {
        assert_eq!(parse_real::<f64>("1.5"), Ok(1.5));
        assert_eq!(parse_real::<f64>(" -2e3 "), Ok(-2000.0));
        assert_eq!(parse_real::<f64>("0.0"), Ok(0.0));
        assert!(parse_real::<f64>("inf").unwrap().is_infinite());
    }

    #[test]
    fn test_parse_real_errors() {
        assert!(matches!(
            parse_real::<f64>("1,5"),
            Err(NumericParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_real::<f64>(""),
            Err(NumericParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_real::<f64>("1e999"),
            Err(NumericParseError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_real::<f64>("1e-999"),
            Err(NumericParseError::OutOfRange(_))
        ));
        // Fits in f64 but not in f32.
        assert!(matches!(
            parse_real::<f32>("1e300"),
            Err(NumericParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer::<i32>("42"), Ok(42));
        assert!(matches!(
            parse_integer::<i32>("4.2"),
            Err(NumericParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_integer::<i32>("99999999999"),
            Err(NumericParseError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_integer::<usize>("-1"),
            Err(NumericParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_token_reader() {
        let mut r = TokenReader::new("3 7 0.25 1e-3");
        assert_eq!(r.next_integer::<usize>(), Ok(3));
        assert_eq!(r.next_integer::<usize>(), Ok(7));
        assert_eq!(r.take_reals(2), Ok(vec![0.25, 1e-3]));
        assert!(r.is_exhausted());
        assert!(matches!(r.next_real(), Err(Error::SerializationFormat(_))));
    }
}
