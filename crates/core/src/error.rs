//! Error types for histogram sanitization.

/// Errors that can occur while sanitizing a histogram.
#[derive(Debug, thiserror::Error)]
pub enum HistError {
    /// Invalid parameter provided.
    #[error("invalid parameter: {msg}")]
    InvalidParameters {
        /// Human-readable error description.
        msg: String,
    },

    /// Numerical computation error.
    #[error("numerical error: {msg}")]
    NumericalError {
        /// Human-readable error description.
        msg: String,
    },

    /// I/O failure in the text adapters.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sanitization operations.
pub type Result<T> = std::result::Result<T, HistError>;

impl HistError {
    /// Create an invalid parameter error.
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameters { msg: msg.into() }
    }

    /// Create a numerical error.
    pub fn numerical<S: Into<String>>(msg: S) -> Self {
        Self::NumericalError { msg: msg.into() }
    }
}
