//! The `companies` table.
//!
//! Fixed-shape statements (`create`, `get`, `remove`) are plain SQL with
//! numbered parameters. `find_all` and `update` splice in the clauses produced
//! by [`build_filter_clause`] and [`build_set_clause`].

use crate::client::GenericClient;
use crate::error::{DbError, DbResult, InvalidInput};
use crate::filter::{FilterCriteria, build_filter_clause};
use crate::partial_update::{ColumnMap, FieldUpdates, build_set_clause};
use crate::row::{FromRow, RowExt};
use crate::value::Value;
use serde::Serialize;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

const RETURNING_COLUMNS: &str =
    r#"handle, name, description, num_employees AS "numEmployees", logo_url AS "logoUrl""#;

const MAX_NAME_LEN: usize = 255;

/// A company row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("numEmployees")?,
            logo_url: row.try_get_column("logoUrl")?,
        })
    }
}

/// Data for a new company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> DbResult<()> {
        if self.handle.trim().is_empty() {
            return Err(DbError::validation("handle cannot be empty"));
        }
        validate_name(&self.name)?;
        validate_num_employees(self.num_employees)?;
        validate_logo_url(self.logo_url.as_deref())
    }
}

/// Partial update of a company.
///
/// Only the fields listed here can change; `handle` is immutable. For the
/// nullable columns, `Some(None)` sets the column to `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub num_employees: Option<Option<i32>>,
    pub logo_url: Option<Option<String>>,
}

impl CompanyPatch {
    /// Parse a JSON request body such as `{"name": "Acme", "numEmployees": 12}`.
    ///
    /// Unknown fields (including `handle`) are rejected.
    pub fn from_json(body: serde_json::Value) -> DbResult<Self> {
        let serde_json::Value::Object(fields) = body else {
            return Err(DbError::validation("update body must be a JSON object"));
        };

        let mut patch = Self::default();
        for (field, value) in fields {
            let value = Value::try_from(value).map_err(|expected| InvalidInput::InvalidValue {
                key: field.clone(),
                expected,
            })?;
            match field.as_str() {
                "name" => patch.name = Some(required_text(&field, value)?),
                "description" => patch.description = Some(required_text(&field, value)?),
                "numEmployees" => patch.num_employees = Some(nullable_int(&field, value)?),
                "logoUrl" => patch.logo_url = Some(nullable_text(&field, value)?),
                _ => return Err(InvalidInput::UnsupportedField(field).into()),
            }
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.num_employees.is_none()
            && self.logo_url.is_none()
    }

    pub fn validate(&self) -> DbResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(num_employees) = self.num_employees {
            validate_num_employees(num_employees)?;
        }
        if let Some(logo_url) = &self.logo_url {
            validate_logo_url(logo_url.as_deref())?;
        }
        Ok(())
    }

    /// The supplied fields, keyed by their application names.
    pub fn to_field_updates(&self) -> FieldUpdates {
        let mut updates = FieldUpdates::new();
        if let Some(name) = &self.name {
            updates.set("name", name.as_str());
        }
        if let Some(description) = &self.description {
            updates.set("description", description.as_str());
        }
        if let Some(num_employees) = self.num_employees {
            updates.set("numEmployees", num_employees);
        }
        if let Some(logo_url) = &self.logo_url {
            updates.set("logoUrl", logo_url.clone());
        }
        updates
    }

    /// Application field name → `companies` column.
    pub fn columns() -> ColumnMap {
        ColumnMap::strict()
            .allow("name")
            .allow("description")
            .rename("numEmployees", "num_employees")
            .rename("logoUrl", "logo_url")
    }
}

fn required_text(field: &str, value: Value) -> DbResult<String> {
    match value {
        Value::Text(s) => Ok(s),
        _ => Err(invalid_value(field, "a string")),
    }
}

fn nullable_text(field: &str, value: Value) -> DbResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        _ => Err(invalid_value(field, "a string or null")),
    }
}

fn nullable_int(field: &str, value: Value) -> DbResult<Option<i32>> {
    match value {
        Value::Null => Ok(None),
        Value::Int(n) => i32::try_from(n)
            .map(Some)
            .map_err(|_| invalid_value(field, "a 32-bit integer")),
        _ => Err(invalid_value(field, "an integer or null")),
    }
}

fn invalid_value(field: &str, expected: &'static str) -> DbError {
    InvalidInput::InvalidValue {
        key: field.to_string(),
        expected,
    }
    .into()
}

fn validate_name(name: &str) -> DbResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(DbError::validation(format!(
            "name must be 1..={MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_num_employees(num_employees: Option<i32>) -> DbResult<()> {
    match num_employees {
        Some(n) if n < 0 => Err(DbError::validation("numEmployees cannot be negative")),
        _ => Ok(()),
    }
}

fn validate_logo_url(logo_url: Option<&str>) -> DbResult<()> {
    if let Some(raw) = logo_url {
        url::Url::parse(raw)
            .map_err(|e| DbError::validation(format!("logoUrl is not a valid URL: {e}")))?;
    }
    Ok(())
}

impl Company {
    /// Insert a company and return it.
    ///
    /// Fails with [`DbError::Duplicate`] if the handle is taken.
    pub async fn create(conn: &impl GenericClient, data: &NewCompany) -> DbResult<Company> {
        data.validate()?;

        let existing = conn
            .query_opt_tagged(
                "companies.create.duplicate_check",
                "SELECT handle FROM companies WHERE handle = $1",
                &[&data.handle],
            )
            .await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(format!(
                "Duplicate company: {}",
                data.handle
            )));
        }

        let sql = format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {RETURNING_COLUMNS}"
        );
        let row = conn
            .query_opt_tagged(
                "companies.create",
                &sql,
                &[
                    &data.handle,
                    &data.name,
                    &data.description,
                    &data.num_employees,
                    &data.logo_url,
                ],
            )
            .await?
            .ok_or_else(|| DbError::not_found("INSERT returned no row"))?;
        Company::from_row(&row)
    }

    /// List companies ordered by name, optionally filtered.
    ///
    /// See [`build_filter_clause`] for the accepted criteria.
    pub async fn find_all(
        conn: &impl GenericClient,
        criteria: Option<&FilterCriteria>,
    ) -> DbResult<Vec<Company>> {
        let filter = build_filter_clause(criteria)?;
        let sql = format!(
            "SELECT {RETURNING_COLUMNS} FROM companies {} ORDER BY name",
            filter.clause_text
        );
        let rows = conn
            .query_tagged("companies.find_all", &sql, &filter.params_ref())
            .await?;
        rows.iter().map(Company::from_row).collect()
    }

    /// Fetch one company by handle.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> DbResult<Company> {
        let sql = format!("SELECT {RETURNING_COLUMNS} FROM companies WHERE handle = $1");
        let row = conn
            .query_opt_tagged("companies.get", &sql, &[&handle])
            .await?
            .ok_or_else(|| DbError::not_found(format!("No company: {handle}")))?;
        Company::from_row(&row)
    }

    /// Apply a partial update and return the updated company.
    ///
    /// Only the fields present in `patch` are written.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        patch: &CompanyPatch,
    ) -> DbResult<Company> {
        patch.validate()?;
        let set = build_set_clause(&patch.to_field_updates(), &CompanyPatch::columns())?;

        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {RETURNING_COLUMNS}",
            set.clause_text,
            set.next_index()
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = set.params_ref();
        params.push(&handle);

        let row = conn
            .query_opt_tagged("companies.update", &sql, &params)
            .await?
            .ok_or_else(|| DbError::not_found(format!("No company: {handle}")))?;
        Company::from_row(&row)
    }

    /// Delete a company by handle.
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> DbResult<()> {
        let row = conn
            .query_opt_tagged(
                "companies.remove",
                "DELETE FROM companies WHERE handle = $1 RETURNING handle",
                &[&handle],
            )
            .await?;
        match row {
            Some(_) => Ok(()),
            None => Err(DbError::not_found(format!("No company: {handle}"))),
        }
    }
}
