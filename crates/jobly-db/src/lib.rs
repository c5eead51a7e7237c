//! # jobly-db
//!
//! Data access for the `companies` table, built around two pure clause
//! builders that never interpolate values into SQL text.
//!
//! - [`build_set_clause`] turns a partial set of field updates into
//!   `"col"=$1, "col2"=$2, ...` for an `UPDATE`.
//! - [`build_filter_clause`] turns optional list criteria into
//!   `WHERE ... AND ...` for a `SELECT`.
//!
//! Both return a [`ParameterizedClause`]: the fragment to splice into a larger
//! statement, plus the values to bind positionally.
//!
//! ```ignore
//! use jobly_db::{Company, FilterCriteria, build_filter_clause};
//!
//! let criteria = FilterCriteria::new().with("minEmployees", 10).with("name", "net");
//! let filter = build_filter_clause(Some(&criteria))?;
//! assert_eq!(filter.clause_text, "WHERE num_employees >= $1 AND name LIKE $2");
//!
//! // Or let the model splice and execute it:
//! let companies = Company::find_all(&client, Some(&criteria)).await?;
//! ```

pub mod clause;
pub mod client;
pub mod company;
pub mod config;
pub mod error;
pub mod filter;
pub mod ident;
pub mod partial_update;
pub mod row;
pub mod value;

pub use clause::ParameterizedClause;
pub use client::GenericClient;
pub use company::{Company, CompanyPatch, NewCompany};
pub use config::{DbConfig, connect};
pub use error::{DbError, DbResult, InvalidInput};
pub use filter::{CompanyFilter, FilterCriteria, FilterKey, build_filter_clause};
pub use ident::Ident;
pub use partial_update::{ColumnMap, FieldUpdates, build_set_clause};
pub use row::{FromRow, RowExt};
pub use value::Value;
