//! Company list filters → parameterized `WHERE` clause.
//!
//! Criteria arrive as an untyped key → value mapping (already decoded from a
//! query string or body). They are validated as a whole into a
//! [`CompanyFilter`], and only then folded into SQL in a fixed key order:
//!
//! | key            | predicate                  | bound value |
//! |----------------|----------------------------|-------------|
//! | `minEmployees` | `num_employees >= $n`      | the number  |
//! | `maxEmployees` | `num_employees <= $n`      | the number  |
//! | `name`         | `name LIKE $n`             | `%name%`    |
//!
//! Placeholder indices come from the values list length at append time, so
//! they stay contiguous whichever subset of keys is present.

use crate::clause::{ParameterizedClause, push_bind, write_placeholder};
use crate::error::{DbError, DbResult, InvalidInput};
use crate::value::Value;
use std::collections::BTreeMap;

const NUM_EMPLOYEES_COLUMN: &str = "num_employees";
const NAME_COLUMN: &str = "name";

/// A recognized company filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    MinEmployees,
    MaxEmployees,
    Name,
}

impl FilterKey {
    /// Every recognized key, in the order predicates are emitted.
    pub const ALL: [FilterKey; 3] = [
        FilterKey::MinEmployees,
        FilterKey::MaxEmployees,
        FilterKey::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::MinEmployees => "minEmployees",
            FilterKey::MaxEmployees => "maxEmployees",
            FilterKey::Name => "name",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl std::fmt::Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untyped filter criteria as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    entries: BTreeMap<String, Value>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Consuming counterpart of [`FilterCriteria::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FilterCriteria {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Validated company filter.
///
/// A `CompanyFilter` obtained from [`CompanyFilter::from_criteria`] only holds
/// recognized keys and a consistent range. Bounds are `i32` to match the
/// `num_employees INTEGER` column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
    pub name: Option<String>,
}

impl CompanyFilter {
    /// Validate raw criteria.
    ///
    /// Checks run over the whole input before anything is returned: unknown
    /// keys first, then value shapes, then range consistency. A `null` value
    /// counts as the key being absent.
    pub fn from_criteria(criteria: &FilterCriteria) -> DbResult<Self> {
        if let Some(key) = criteria.keys().find(|k| FilterKey::parse(k).is_none()) {
            tracing::debug!(key, "rejected filter: unsupported key");
            return Err(InvalidInput::UnsupportedFilterKey(key.to_string()).into());
        }

        let filter = Self {
            min_employees: integer_criterion(criteria, FilterKey::MinEmployees)?,
            max_employees: integer_criterion(criteria, FilterKey::MaxEmployees)?,
            name: text_criterion(criteria, FilterKey::Name)?,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Check that `min_employees <= max_employees` when both are set.
    pub fn validate(&self) -> DbResult<()> {
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees)
            && min > max
        {
            tracing::debug!(min, max, "rejected filter: inconsistent range");
            return Err(InvalidInput::InconsistentRange {
                min: min.into(),
                max: max.into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.min_employees.is_none() && self.max_employees.is_none() && self.name.is_none()
    }

    /// Fold the filter into a `WHERE` clause, or an empty clause when no key is set.
    pub fn to_clause(&self) -> ParameterizedClause {
        let mut predicates: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        for key in FilterKey::ALL {
            let (column, op, value) = match key {
                FilterKey::MinEmployees => match self.min_employees {
                    Some(min) => (NUM_EMPLOYEES_COLUMN, ">=", Value::from(min)),
                    None => continue,
                },
                FilterKey::MaxEmployees => match self.max_employees {
                    Some(max) => (NUM_EMPLOYEES_COLUMN, "<=", Value::from(max)),
                    None => continue,
                },
                // Wildcards wrap the bound value; the SQL text stays `LIKE $n`.
                FilterKey::Name => match &self.name {
                    Some(name) => (NAME_COLUMN, "LIKE", Value::Text(format!("%{name}%"))),
                    None => continue,
                },
            };

            let idx = push_bind(&mut values, value);
            let mut predicate = format!("{column} {op} ");
            write_placeholder(&mut predicate, idx);
            predicates.push(predicate);
        }

        if predicates.is_empty() {
            return ParameterizedClause::empty();
        }

        let clause_text = format!("WHERE {}", predicates.join(" AND "));
        tracing::trace!(clause = %clause_text, params = values.len(), "built WHERE clause");
        ParameterizedClause {
            clause_text,
            values,
        }
    }
}

fn integer_criterion(criteria: &FilterCriteria, key: FilterKey) -> DbResult<Option<i32>> {
    let value = match criteria.get(key.as_str()) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let Some(n) = value.as_i64() else {
        return Err(invalid_value(key, "an integer"));
    };
    i32::try_from(n)
        .map(Some)
        .map_err(|_| invalid_value(key, "a 32-bit integer"))
}

fn invalid_value(key: FilterKey, expected: &'static str) -> DbError {
    tracing::debug!(%key, expected, "rejected filter: invalid value");
    InvalidInput::InvalidValue {
        key: key.to_string(),
        expected,
    }
    .into()
}

fn text_criterion(criteria: &FilterCriteria, key: FilterKey) -> DbResult<Option<String>> {
    match criteria.get(key.as_str()) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Text(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid_value(key, "a string")),
    }
}

/// Build the `WHERE` clause for a company listing.
///
/// `None` and empty criteria both mean "no filtering" and yield an empty
/// clause with no values.
///
/// # Errors
/// - [`InvalidInput::UnsupportedFilterKey`] for a key outside [`FilterKey::ALL`].
/// - [`InvalidInput::InvalidValue`] for a non-integer bound, a bound outside
///   the `i32` range, or a non-string name.
/// - [`InvalidInput::InconsistentRange`] when `minEmployees > maxEmployees`.
pub fn build_filter_clause(criteria: Option<&FilterCriteria>) -> DbResult<ParameterizedClause> {
    match criteria {
        None => Ok(ParameterizedClause::empty()),
        Some(criteria) => Ok(CompanyFilter::from_criteria(criteria)?.to_clause()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(result: DbResult<ParameterizedClause>, expected: InvalidInput) {
        match result {
            Err(DbError::InvalidInput(got)) => assert_eq!(got, expected),
            other => panic!("expected InvalidInput({expected:?}), got {other:?}"),
        }
    }

    #[test]
    fn name_only_wraps_the_bound_value() {
        let criteria = FilterCriteria::new().with("name", "bc");
        let clause = build_filter_clause(Some(&criteria)).unwrap();
        assert_eq!(clause.clause_text, "WHERE name LIKE $1");
        assert_eq!(clause.values, vec![Value::from("%bc%")]);
    }

    #[test]
    fn all_keys_in_canonical_order() {
        let criteria = FilterCriteria::new()
            .with("name", "net")
            .with("maxEmployees", 500)
            .with("minEmployees", 10);

        let clause = build_filter_clause(Some(&criteria)).unwrap();
        assert_eq!(
            clause.clause_text,
            "WHERE num_employees >= $1 AND num_employees <= $2 AND name LIKE $3"
        );
        assert_eq!(
            clause.values,
            vec![Value::Int(10), Value::Int(500), Value::from("%net%")]
        );
    }

    #[test]
    fn subset_keeps_indices_contiguous() {
        let criteria = FilterCriteria::new().with("maxEmployees", 200).with("name", "a");
        let clause = build_filter_clause(Some(&criteria)).unwrap();
        assert_eq!(
            clause.clause_text,
            "WHERE num_employees <= $1 AND name LIKE $2"
        );
        assert_eq!(clause.values, vec![Value::Int(200), Value::from("%a%")]);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a: FilterCriteria = [
            ("name", Value::from("x")),
            ("minEmployees", Value::from(1)),
        ]
        .into_iter()
        .collect();
        let b: FilterCriteria = [
            ("minEmployees", Value::from(1)),
            ("name", Value::from("x")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            build_filter_clause(Some(&a)).unwrap(),
            build_filter_clause(Some(&b)).unwrap()
        );
    }

    #[test]
    fn single_bound_skips_range_check() {
        let min_only = FilterCriteria::new().with("minEmployees", 50);
        let clause = build_filter_clause(Some(&min_only)).unwrap();
        assert_eq!(clause.clause_text, "WHERE num_employees >= $1");
        assert_eq!(clause.values, vec![Value::Int(50)]);

        let max_only = FilterCriteria::new().with("maxEmployees", 10);
        let clause = build_filter_clause(Some(&max_only)).unwrap();
        assert_eq!(clause.clause_text, "WHERE num_employees <= $1");
    }

    #[test]
    fn equal_bounds_are_consistent() {
        let criteria = FilterCriteria::new()
            .with("minEmployees", 10)
            .with("maxEmployees", 10);
        assert!(build_filter_clause(Some(&criteria)).is_ok());
    }

    #[test]
    fn min_above_max_is_rejected() {
        let criteria = FilterCriteria::new()
            .with("minEmployees", 50)
            .with("maxEmployees", 10);
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::InconsistentRange { min: 50, max: 10 },
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let criteria = FilterCriteria::new().with("unknownKey", 5);
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::UnsupportedFilterKey("unknownKey".into()),
        );
    }

    #[test]
    fn unknown_key_rejected_even_alongside_valid_keys() {
        let criteria = FilterCriteria::new()
            .with("name", "a")
            .with("minEmployees", 50)
            .with("maxEmployees", 10)
            .with("handle", "x");
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::UnsupportedFilterKey("handle".into()),
        );
    }

    #[test]
    fn absent_or_empty_criteria_build_nothing() {
        assert_eq!(
            build_filter_clause(None).unwrap(),
            ParameterizedClause::empty()
        );
        let clause = build_filter_clause(Some(&FilterCriteria::new())).unwrap();
        assert_eq!(clause.clause_text, "");
        assert!(clause.values.is_empty());
    }

    #[test]
    fn null_values_count_as_absent() {
        let criteria = FilterCriteria::new()
            .with("minEmployees", Value::Null)
            .with("name", "z");
        let clause = build_filter_clause(Some(&criteria)).unwrap();
        assert_eq!(clause.clause_text, "WHERE name LIKE $1");
    }

    #[test]
    fn numeric_text_bounds_are_accepted() {
        let criteria = FilterCriteria::new()
            .with("minEmployees", "5")
            .with("maxEmployees", "40");
        let clause = build_filter_clause(Some(&criteria)).unwrap();
        assert_eq!(clause.values, vec![Value::Int(5), Value::Int(40)]);
    }

    #[test]
    fn numeric_text_bounds_are_range_checked() {
        let criteria = FilterCriteria::new()
            .with("minEmployees", "100")
            .with("maxEmployees", "9");
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::InconsistentRange { min: 100, max: 9 },
        );
    }

    #[test]
    fn non_integer_bound_is_rejected() {
        let criteria = FilterCriteria::new().with("minEmployees", "lots");
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::InvalidValue {
                key: "minEmployees".into(),
                expected: "an integer",
            },
        );
    }

    #[test]
    fn bound_outside_int4_is_rejected() {
        let criteria = FilterCriteria::new().with("minEmployees", "3000000000");
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::InvalidValue {
                key: "minEmployees".into(),
                expected: "a 32-bit integer",
            },
        );

        let criteria = FilterCriteria::new().with("maxEmployees", i64::from(i32::MIN) - 1);
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::InvalidValue {
                key: "maxEmployees".into(),
                expected: "a 32-bit integer",
            },
        );
    }

    #[test]
    fn int4_limits_are_accepted() {
        let criteria = FilterCriteria::new()
            .with("minEmployees", i32::MIN)
            .with("maxEmployees", i64::from(i32::MAX));
        let clause = build_filter_clause(Some(&criteria)).unwrap();
        assert_eq!(
            clause.values,
            vec![Value::from(i32::MIN), Value::from(i32::MAX)]
        );
    }

    #[test]
    fn huge_float_bound_is_not_an_integer() {
        let criteria = FilterCriteria::new().with("maxEmployees", 1e300);
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::InvalidValue {
                key: "maxEmployees".into(),
                expected: "an integer",
            },
        );
    }

    #[test]
    fn non_text_name_is_rejected() {
        let criteria = FilterCriteria::new().with("name", true);
        assert_invalid(
            build_filter_clause(Some(&criteria)),
            InvalidInput::InvalidValue {
                key: "name".into(),
                expected: "a string",
            },
        );
    }

    #[test]
    fn like_metacharacters_stay_in_the_value() {
        let criteria = FilterCriteria::new().with("name", "' OR 1=1 --");
        let clause = build_filter_clause(Some(&criteria)).unwrap();
        assert_eq!(clause.clause_text, "WHERE name LIKE $1");
        assert_eq!(clause.values, vec![Value::from("%' OR 1=1 --%")]);
    }

    #[test]
    fn filter_key_round_trips_names() {
        for key in FilterKey::ALL {
            assert_eq!(FilterKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(FilterKey::parse("MinEmployees"), None);
    }

    #[test]
    fn company_filter_builds_directly() {
        let filter = CompanyFilter {
            max_employees: Some(3),
            ..Default::default()
        };
        assert!(!filter.is_empty());
        assert_eq!(filter.to_clause().clause_text, "WHERE num_employees <= $1");
        assert!(CompanyFilter::default().to_clause().is_empty());
    }

    #[test]
    fn concurrent_calls_do_not_share_state() {
        let criteria = FilterCriteria::new()
            .with("minEmployees", 1)
            .with("name", "co");
        let expected = build_filter_clause(Some(&criteria)).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| build_filter_clause(Some(&criteria)).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
