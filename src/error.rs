//! Unified error handling for the scrapi-probe crate
//!
//! Step-level failures (wrong status codes, missing fields) are not errors:
//! they are recorded by the [`crate::report::Reporter`]. The types here cover
//! the things that stop a step from being evaluated at all.
//!
//! # Architecture
//!
//! - [`ProbeErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

pub use crate::client::ClientError;

/// Common trait for all scrapi-probe error types
pub trait ProbeErrorTrait: std::error::Error {
    /// Check if this error is transient (another poll may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport-level failures (DNS, TLS, connect, timeout)
    Network,
    /// The backend answered, but not the way the contract says it should
    Protocol,
    /// Configuration and validation errors
    Config,
    /// Local file errors (report export)
    Io,
}

impl ErrorCategory {
    /// Short label used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Protocol => "protocol",
            Self::Config => "config",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the scrapi-probe crate
#[derive(Error, Debug)]
pub enum Error {
    /// API client errors
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl ProbeErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_recoverable(),
            Self::Json(_) | Self::Io(_) | Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Client(e) => e.category(),
            Self::Json(_) => ErrorCategory::Protocol,
            Self::Io(_) => ErrorCategory::Io,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
