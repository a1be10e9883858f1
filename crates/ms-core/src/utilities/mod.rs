//! Miscellaneous utilities.

/// Locale-independent number formatting.
pub mod data_formatters;

/// Checked number parsing.
pub mod data_parsers;
