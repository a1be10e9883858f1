//! # ms-core
//!
//! Core types, error definitions, and text utilities for multisplines.
//!
//! This crate provides the foundational building blocks shared across all
//! other crates in the workspace: the scalar type aliases, the error
//! hierarchy, and the locale-independent number parsing/formatting used by
//! the spline file format.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `ensure_post!` macros.
pub mod errors;

/// Number parsing and formatting utilities.
pub mod utilities;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, NumericParseError, Result};
