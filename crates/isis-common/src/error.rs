//! Error types for ISIS cube parsing and processing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using IsisError.
pub type IsisResult<T> = Result<T, IsisError>;

/// Primary error type for cube operations.
#[derive(Debug, Error)]
pub enum IsisError {
    // === File Errors ===
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid cube format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported pixel encoding: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    // === Lookup Errors ===
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Layer not found: {0}")]
    UnknownLayer(String),

    #[error("{axis} `{index}` invalid. Must be between 1 and {max}")]
    OutOfRange {
        axis: &'static str,
        index: i64,
        max: usize,
    },

    // === Contour Errors ===
    #[error("Path starting at (line {line}, sample {sample}) can not be closed after {steps} steps")]
    UnclosablePath {
        line: usize,
        sample: usize,
        steps: usize,
    },

    #[error("Too many polygons in the contour ({0} edge pixels)")]
    TooManyPolygons(usize),

    // === Argument Errors ===
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),
}

impl IsisError {
    /// Create an InvalidFormat error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create a KeyNotFound error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound(key.into())
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for the lookup family (missing header key or band name).
    pub fn is_lookup(&self) -> bool {
        matches!(self, IsisError::KeyNotFound(_) | IsisError::UnknownLayer(_))
    }

    /// True for truncated or failed reads.
    pub fn is_io(&self) -> bool {
        matches!(self, IsisError::Io(_) | IsisError::ShortRead { .. })
    }
}
