//! Builder output: SQL fragment plus positional bind values.

use crate::value::Value;
use std::fmt::Write as _;
use tokio_postgres::types::ToSql;

/// A SQL fragment with `$1, $2, ...` placeholders and the values they bind.
///
/// Invariants upheld by every constructor in this crate:
/// - placeholders are contiguous from `$1` and the highest equals `values.len()`;
/// - `values[i - 1]` is the value bound to `$i`;
/// - no value is ever written into `clause_text`.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct ParameterizedClause {
    pub clause_text: String,
    pub values: Vec<Value>,
}

impl ParameterizedClause {
    /// An empty clause: no text and no values.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is no clause text to splice.
    pub fn is_empty(&self) -> bool {
        self.clause_text.is_empty()
    }

    /// Index the next bound value would receive.
    ///
    /// Callers use this to append their own trailing parameters, e.g. the
    /// `WHERE handle = $N` of an `UPDATE`.
    pub fn next_index(&self) -> usize {
        self.values.len() + 1
    }

    /// Parameter references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.clause_text, self.values)
    }
}

/// Append a value and return its 1-based placeholder index.
///
/// The index is derived from the list length at append time, so it cannot
/// drift from the values it refers to.
pub(crate) fn push_bind(values: &mut Vec<Value>, value: Value) -> usize {
    values.push(value);
    values.len()
}

/// Write `$idx` into `out`.
pub(crate) fn write_placeholder(out: &mut String, idx: usize) {
    out.push('$');
    // Writing into a String cannot fail.
    let _ = write!(out, "{idx}");
}
