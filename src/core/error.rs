//! Error types for the jsts library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using jsts's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during metric extraction and scoring.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The directory to analyze is missing or not a directory.
    #[error("Invalid root directory {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Parse error from tree-sitter, after the dialect fallback was exhausted.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Analysis-specific error.
    #[error("Analysis error: {message}")]
    Analysis { message: String },

    /// Reference dataset missing or malformed.
    #[error("Reference dataset error: {0}")]
    Dataset(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Threshold violation (for CI/CD integration).
    #[error("Threshold violation: {message}")]
    ThresholdViolation { message: String, score: f64 },
}

impl Error {
    /// Create a new analysis error.
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a new reference dataset error.
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset(message.into())
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid root error.
    pub fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a threshold violation error.
    pub fn threshold_violation(message: impl Into<String>, score: f64) -> Self {
        Self::ThresholdViolation {
            message: message.into(),
            score,
        }
    }
}
