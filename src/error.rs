//! Error types for ratecount.

use thiserror::Error;

/// Main error type for ratecount operations.
#[derive(Error, Debug)]
pub enum RateCountError {
    /// A counter was configured with a zero-length slot
    #[error("Resolution must be greater than zero")]
    ZeroResolution,

    /// A counter was configured to average zero windows
    #[error("Window count must be greater than zero")]
    ZeroWindows,

    /// A rate was requested in units of zero
    #[error("Rate divisor must not be zero")]
    ZeroDivisor,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ratecount operations.
pub type Result<T> = std::result::Result<T, RateCountError>;
