//! Error types for enerdash-types.

use thiserror::Error;

/// Errors from parsing raw input or wire values into typed fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Raw input could not be parsed as a finite number.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// A mode string did not match any known variant.
    #[error("unknown mode value: {0:?}")]
    UnknownMode(String),

    /// Load phase index outside 1..=3.
    #[error("phase index out of range: {0}")]
    PhaseOutOfRange(u8),
}

/// Result type alias for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
