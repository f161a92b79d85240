//! # Validation Errors
//!
//! Structured errors raised when caller-supplied input does not satisfy the
//! format or range constraints of a domain primitive. Built with `thiserror`;
//! each variant carries the rejected input so operators can diagnose the
//! offending request without guesswork.

use thiserror::Error;

/// Validation errors for domain primitives and certificate fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account address is empty, too long, or contains characters outside
    /// `[A-Za-z0-9_.:-]`.
    #[error("invalid address: \"{0}\" (expected 1-128 characters from [A-Za-z0-9_.:-])")]
    InvalidAddress(String),

    /// A free-text field is empty.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A free-text field exceeds its length limit.
    #[error("{field} must not exceed {max} bytes (got {actual})")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum permitted length in bytes.
        max: usize,
        /// Supplied length in bytes.
        actual: usize,
    },

    /// A free-text field contains a NUL character, which the journal store
    /// cannot hold.
    #[error("{field} must not contain NUL characters")]
    NulCharacter {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A numeric field is negative or cannot be represented exactly as an
    /// IEEE-754 double.
    #[error("{field} = {value} is outside the range {min}..={max}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: i128,
        /// The inclusive lower bound.
        min: u64,
        /// The inclusive upper bound.
        max: u64,
    },
}
