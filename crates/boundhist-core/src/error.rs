//! Error types for error-bounded histograms
//!
//! Provides a unified error type for all boundhist crates.

use thiserror::Error;

/// Core error type for histogram operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument passed to a recording or query operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid parameter provided when constructing a layout
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A count or the total count would exceed the supported maximum
    #[error("Overflow: {0}")]
    Overflow(String),

    /// Operation not possible in the current state
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Serial version byte not understood by this reader
    #[error("Unsupported serial version: {0}")]
    UnsupportedVersion(u8),

    /// Byte stream decoded but is inconsistent
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied an invalid argument or parameter
    InvalidArgument,
    /// A counter would overflow
    Overflow,
    /// Operation not allowed in the current state
    IllegalState,
    /// Reading or writing a byte stream failed
    Io,
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::InvalidParameter(_) => ErrorKind::InvalidArgument,
            Self::Overflow(_) => ErrorKind::Overflow,
            Self::IllegalState(_) => ErrorKind::IllegalState,
            Self::UnsupportedVersion(_) | Self::Corrupt(_) | Self::Io(_) => ErrorKind::Io,
        }
    }

    // Helper functions for common error patterns

    /// Create an error for a NaN value
    pub fn nan_value() -> Self {
        Self::InvalidArgument("value must not be NaN".to_string())
    }

    /// Create an error for an invalid quantile
    pub fn invalid_quantile(q: f64) -> Self {
        Self::InvalidArgument(format!("quantile {q} must be in [0, 1]"))
    }

    /// Create an error for a rank outside `[0, total_count)`
    pub fn rank_out_of_range(rank: u64, total_count: u64) -> Self {
        Self::InvalidArgument(format!(
            "rank {rank} must be less than total count {total_count}"
        ))
    }

    /// Create an error for a query on an empty histogram
    pub fn empty_histogram() -> Self {
        Self::IllegalState("histogram is empty".to_string())
    }

    /// Create an error for a counter overflow
    pub fn count_overflow(context: &str) -> Self {
        Self::Overflow(format!("{context} would exceed the maximum total count"))
    }

    /// Create an error for corrupt serialized data
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt(reason.into())
    }
}
