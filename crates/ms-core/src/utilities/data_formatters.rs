//! Number formatting helpers.
//!
//! Rust's formatting machinery never consults the process locale, so the
//! functions here always write `.` as the decimal point.  [`format_significant`]
//! reproduces the layout of C's `%.{n}g` conversion, which keeps persisted
//! spline files readable by other tools.

use crate::Real;

/// Significant digits written for every persisted real.  Seventeen digits
/// are enough for any `f64` to survive a write/read cycle bit for bit.
pub const SAVE_PRECISION: usize = 17;

/// Format `value` with `digits` significant digits, choosing fixed or
/// scientific notation the way `%g` does and dropping trailing zeros.
pub fn format_significant(value: Real, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let p = digits.max(1);
    let sci = format!("{:.*e}", p - 1, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= p as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (p as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// Format `value` for a spline file.
pub fn format_real(value: Real) -> String {
    format_significant(value, SAVE_PRECISION)
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_notation() {
        assert_eq!(format_significant(2.5, 17), "2.5");
        assert_eq!(format_significant(-3.0, 17), "-3");
        assert_eq!(format_significant(0.000_123_4, 3), "0.000123");
        assert_eq!(format_real(0.1), "0.10000000000000001");
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(format_significant(123_456.0, 3), "1.23e+05");
        assert_eq!(format_significant(1.5e20, 17), "1.5e+20");
        assert_eq!(format_significant(9.5367431640625e-7, 17), "9.5367431640625e-07");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(format_real(0.0), "0");
        assert_eq!(format_real(f64::INFINITY), "inf");
        assert_eq!(format_real(f64::NAN), "nan");
    }

    proptest! {
        #[test]
        fn full_precision_survives_parsing(x in -1.0e12f64..1.0e12) {
            let text = format_real(x);
            let back: f64 = text.parse().unwrap();
            prop_assert_eq!(back, x);
        }
    }
}
