//! Delimited SQL identifiers.
//!
//! Column names are structural SQL: Postgres cannot bind them as parameters,
//! so they are embedded in the statement text. [`Ident`] always renders as a
//! delimited identifier (`"first_name"`), which tolerates reserved words and
//! mixed case, and doubles any embedded `"` so the name can never terminate
//! the quoting early.
//!
//! # Example
//! ```ignore
//! use jobly_db::Ident;
//!
//! let c = Ident::new("num_employees")?;
//! assert_eq!(c.to_sql(), r#""num_employees""#);
//! # Ok::<(), jobly_db::DbError>(())
//! ```

use crate::error::{DbError, DbResult};

/// A single column identifier, rendered quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    /// Validate a column name.
    ///
    /// Any characters are allowed except NUL; the name must be non-empty.
    pub fn new(name: &str) -> DbResult<Self> {
        if name.is_empty() {
            return Err(DbError::validation("Identifier cannot be empty"));
        }
        if name.contains('\0') {
            return Err(DbError::validation(
                "Identifier cannot contain NUL character",
            ));
        }
        Ok(Self(name.to_string()))
    }

    /// The raw, unquoted name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        out.push('"');
        for ch in self.0.chars() {
            if ch == '"' {
                out.push('"');
                out.push('"');
            } else {
                out.push(ch);
            }
        }
        out.push('"');
    }
}
