//! Row mapping helpers shared by the repositories
//!
//! Two rules apply to every read:
//! - a lookup by id distinguishes zero, one and several rows
//! - a listing never fails because one row is malformed; the bad row is
//!   reported next to the good ones

use std::fmt;

use serde::Serialize;

use super::DbError;

/// A listed row that could not be mapped back to its domain type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub id: String,
    pub reason: String,
}

impl RowError {
    pub fn new(id: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row '{}': {}", self.id, self.reason)
    }
}

/// Result of a listing: rows that parsed plus per-row failures
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub errors: Vec<RowError>,
}

impl<T> Listing<T> {
    /// Map every row, collecting failures instead of stopping at the first.
    pub fn from_rows<R, F>(rows: Vec<R>, parse: F) -> Self
    where
        F: Fn(R) -> Result<T, RowError>,
    {
        let mut items = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for row in rows {
            match parse(row) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!(id = %e.id, reason = %e.reason, "skipping malformed row");
                    errors.push(e);
                }
            }
        }

        Self { items, errors }
    }

    /// Error messages as sent to clients.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Resolve the rows returned for a primary-key lookup.
///
/// Zero rows is `Ok(None)`; more than one row means the table lost its
/// uniqueness guarantee and is reported as [`DbError::Duplicate`].
pub fn at_most_one<T>(mut rows: Vec<T>, resource: &'static str, id: &str) -> Result<Option<T>, DbError> {
    match rows.len() {
        0 => {
            tracing::warn!(resource, id, "no row found");
            Ok(None)
        }
        1 => Ok(rows.pop()),
        n => {
            tracing::error!(resource, id, rows = n, "multiple rows share one id");
            Err(DbError::Duplicate {
                resource,
                id: id.to_owned(),
            })
        }
    }
}
