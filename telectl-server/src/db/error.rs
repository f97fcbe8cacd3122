//! Repository error type

use telectl_core::{CoreError, ValidationError};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Input rejected before any statement ran
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Core(CoreError),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// More than one row for a key that must be unique
    #[error("multiple {resource} rows with id '{id}'")]
    Duplicate { resource: &'static str, id: String },

    /// Stored row could not be mapped back (bad config JSON, unknown enum)
    #[error("invalid stored {resource} '{id}': {reason}")]
    InvalidRow {
        resource: &'static str,
        id: String,
        reason: String,
    },
}

impl From<CoreError> for DbError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(v) => Self::Validation(v),
            other => Self::Core(other),
        }
    }
}
