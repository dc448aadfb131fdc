//! Error types for query building and row hydration.
//!
//! The builder layer originates very little of its own failure taxonomy:
//! almost everything here wraps an error surfaced by the database driver on
//! execution, or by a model's row mapping.

use std::fmt;

/// Result type alias for model and query operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error type for model and query operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database connection or query execution error
    Database(String),
    /// No record matched a query that required one
    NotFound(String),
    /// Row-to-model mapping failed
    Hydration(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(table) => write!(f, "Record not found in table '{}'", table),
            ModelError::Hydration(msg) => write!(f, "Hydration error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnDecode { .. } => {
                ModelError::Hydration(err.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Hydration(err.to_string())
    }
}
