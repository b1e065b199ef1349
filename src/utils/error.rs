//! Error types for TurboNav

use std::fmt;

use crate::network::FetchError;

/// Main error type for TurboNav operations
#[derive(Debug)]
pub enum NavError {
    /// Network-related errors from the fetch boundary
    Fetch(FetchError),
    /// Operation was cancelled before it settled
    Cancelled,
    /// Invalid session configuration (e.g. malformed base URL).
    /// Fatal at startup: indicates a page-template defect, not a runtime
    /// condition.
    Config(String),
    /// I/O errors
    Io(std::io::Error),
    /// Generic error with message
    Other(String),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::Cancelled => write!(f, "Operation cancelled"),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for NavError {}

impl From<std::io::Error> for NavError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<FetchError> for NavError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

impl NavError {
    /// Check whether this error is a benign cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Convenience Result type for TurboNav operations
pub type Result<T> = std::result::Result<T, NavError>;
