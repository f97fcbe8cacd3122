//! Structured error types for telectl-core.
//!
//! Library consumers (the server's repositories) get `CoreError`;
//! the CLI wraps everything in `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

use crate::ValidationError;

/// Main error type for telectl-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Submitted pipeline or rule failed validation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization of a config column failed
    #[error("JSON error in {context}: {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// Config file could not be read or parsed
    #[error("Configuration error in {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}

/// Result type alias for telectl-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a JSON error with context
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
