//! Partial-update `SET` clause builder.
//!
//! Turns an ordered set of field updates into `"col"=$1, "col2"=$2, ...` plus
//! the matching bind values. Only the fields supplied are touched.
//!
//! # Example
//!
//! ```ignore
//! use jobly_db::{ColumnMap, FieldUpdates, build_set_clause};
//!
//! let updates: FieldUpdates = [("name", "Aliya".into()), ("numEmployees", 32.into())]
//!     .into_iter()
//!     .collect();
//! let columns = ColumnMap::new().rename("numEmployees", "num_employees");
//!
//! let set = build_set_clause(&updates, &columns)?;
//! assert_eq!(set.clause_text, r#""name"=$1, "num_employees"=$2"#);
//! ```

use crate::clause::{ParameterizedClause, push_bind, write_placeholder};
use crate::error::{DbResult, InvalidInput};
use crate::ident::Ident;
use crate::value::Value;
use std::collections::HashMap;

/// Ordered field name → new value mapping.
///
/// Setting a field twice keeps its original position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    entries: Vec<(String, Value)>,
}

impl FieldUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    /// Consuming counterpart of [`FieldUpdates::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FieldUpdates {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut updates = Self::new();
        for (field, value) in iter {
            updates.set(field, value);
        }
        updates
    }
}

/// Field name → column name translation.
///
/// Fields without an entry are assumed to already be column names. In strict
/// mode they are rejected instead, which turns the map into an allow-list for
/// field names that come from request data.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<String, String>,
    strict: bool,
}

impl ColumnMap {
    /// A lenient map: unmapped fields pass through as their own column name.
    pub fn new() -> Self {
        Self::default()
    }

    /// A strict map: only fields registered via [`rename`](Self::rename) or
    /// [`allow`](Self::allow) are accepted.
    pub fn strict() -> Self {
        Self {
            columns: HashMap::new(),
            strict: true,
        }
    }

    /// Map `field` to `column`. An empty `column` registers `field` under its
    /// own name.
    pub fn rename(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(field.into(), column.into());
        self
    }

    /// Accept `field` under its own name.
    pub fn allow(self, field: impl Into<String>) -> Self {
        let field = field.into();
        let column = field.clone();
        self.rename(field, column)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Resolve the column for `field`, or `None` when a strict map does not know it.
    pub fn column_for<'a>(&'a self, field: &'a str) -> Option<&'a str> {
        match self.columns.get(field) {
            Some(column) if !column.is_empty() => Some(column.as_str()),
            Some(_) => Some(field),
            None if self.strict => None,
            None => Some(field),
        }
    }
}

/// Build the `SET` fragment for a partial update.
///
/// The i-th update (in insertion order) becomes `"<column>"=$i` and its value
/// is `values[i - 1]`. Every column is resolved and validated before any text
/// is produced.
///
/// # Errors
/// - [`InvalidInput::EmptyUpdateSet`] when `updates` is empty.
/// - [`InvalidInput::UnsupportedField`] when a strict `columns` map lacks a field.
/// - [`DbError::Validation`](crate::DbError::Validation) for an empty field name
///   with no mapped column.
pub fn build_set_clause(
    updates: &FieldUpdates,
    columns: &ColumnMap,
) -> DbResult<ParameterizedClause> {
    if updates.is_empty() {
        tracing::debug!("rejected partial update: no fields");
        return Err(InvalidInput::EmptyUpdateSet.into());
    }

    let mut resolved = Vec::with_capacity(updates.len());
    for (field, value) in updates.iter() {
        let Some(column) = columns.column_for(field) else {
            tracing::debug!(field, "rejected partial update: unsupported field");
            return Err(InvalidInput::UnsupportedField(field.to_string()).into());
        };
        resolved.push((Ident::new(column)?, value));
    }

    let mut clause_text = String::with_capacity(resolved.len() * 16);
    let mut values: Vec<Value> = Vec::with_capacity(resolved.len());
    for (column, value) in resolved {
        if !values.is_empty() {
            clause_text.push_str(", ");
        }
        let idx = push_bind(&mut values, value.clone());
        column.write_sql(&mut clause_text);
        clause_text.push('=');
        write_placeholder(&mut clause_text, idx);
    }

    tracing::trace!(clause = %clause_text, params = values.len(), "built SET clause");
    Ok(ParameterizedClause {
        clause_text,
        values,
    })
}
