//! Error types for the contour content stream interpreter.

use thiserror::Error;

/// Primary error type for content stream interpretation.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A decoder the content requires was not configured.
    #[error("no decoder configured for {0}")]
    MissingDecoder(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("unsupported soft mask structure: {0}")]
    UnsupportedMask(String),

    #[error("dimension mismatch: expected {expected} samples, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Whether this error must abort interpretation.
    ///
    /// Everything else is absorbed by the tolerant paths (unknown operators,
    /// soft mask resolution) and degrades to a neutral result.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingDecoder(_))
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
