//! Row mapping traits and utilities

use crate::error::{DbError, DbResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for converting a database row into a Rust struct.
pub trait FromRow: Sized {
    /// Convert a database row into Self.
    fn from_row(row: &Row) -> DbResult<Self>;
}

/// Extension trait for Row to provide typed column access.
pub trait RowExt {
    /// Get a typed value from a column by name, mapping failures to [`DbError::Decode`].
    fn try_get_column<'a, T>(&'a self, column: &str) -> DbResult<T>
    where
        T: FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<'a, T>(&'a self, column: &str) -> DbResult<T>
    where
        T: FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| DbError::decode(column, e.to_string()))
    }
}
