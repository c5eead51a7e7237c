//! Error types for jobly-db

use thiserror::Error;

/// Result type alias for jobly-db operations
pub type DbResult<T> = Result<T, DbError>;

/// Caller-supplied input that was rejected before any SQL was built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    /// Partial update called with no fields.
    #[error("no data to update")]
    EmptyUpdateSet,

    /// Filter criteria contained a key outside the recognized set.
    #[error("unsupported query: {0}")]
    UnsupportedFilterKey(String),

    /// Update body contained a field that cannot be changed.
    #[error("unsupported field: {0}")]
    UnsupportedField(String),

    /// Both range bounds present with min > max.
    #[error("min cannot exceed max ({min} > {max})")]
    InconsistentRange { min: i64, max: i64 },

    /// A recognized key carried a value of the wrong shape.
    #[error("invalid value for '{key}': expected {expected}")]
    InvalidValue { key: String, expected: &'static str },
}

/// Error types for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Request data rejected by a clause builder
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation or duplicate key detected up front
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this error came from a clause builder rejecting its input
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether an HTTP layer should answer with a 4xx status.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::NotFound(_) | Self::Duplicate(_) | Self::Validation(_)
        )
    }

    /// Parse a tokio_postgres error into a more specific DbError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error()
            && db_err.code().code() == "23505"
        {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return Self::Duplicate(format!("{}: {}", constraint, db_err.message()));
        }
        Self::Query(err)
    }
}
