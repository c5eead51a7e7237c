//! Scalar bind values.
//!
//! [`Value`] is what flows through the `values` list of a
//! [`ParameterizedClause`](crate::ParameterizedClause). It covers the scalars a
//! decoded request body can carry and binds directly as a tokio-postgres
//! parameter.

use bytes::BytesMut;
use serde::Serialize;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// A scalar value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Integer view, accepting numeric strings (query-string decoding yields text).
    ///
    /// A float converts only when it is integral and inside the `i64` range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v)
                if v.fract() == 0.0 && *v > i64::MIN as f64 && *v < i64::MAX as f64 =>
            {
                Some(*v as i64)
            }
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Arrays and objects are not scalars and are rejected.
impl TryFrom<serde_json::Value> for Value {
    type Error = &'static str;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .ok_or("a representable number"),
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err("a scalar"),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            // Narrow to the column's integer width; Postgres will not coerce binary int8 to int4.
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
        }
    }

    // The inner `to_sql_checked` calls reject mismatched types per variant.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(Value::try_from(json!(null)), Ok(Value::Null));
        assert_eq!(Value::try_from(json!(true)), Ok(Value::Bool(true)));
        assert_eq!(Value::try_from(json!(42)), Ok(Value::Int(42)));
        assert_eq!(Value::try_from(json!(1.5)), Ok(Value::Float(1.5)));
        assert_eq!(Value::try_from(json!("x")), Ok(Value::Text("x".into())));
    }

    #[test]
    fn json_containers_rejected() {
        assert!(Value::try_from(json!([1, 2])).is_err());
        assert!(Value::try_from(json!({"a": 1})).is_err());
    }

    #[test]
    fn as_i64_accepts_numeric_text() {
        assert_eq!(Value::from("50").as_i64(), Some(50));
        assert_eq!(Value::from(" 7 ").as_i64(), Some(7));
        assert_eq!(Value::from(3.0).as_i64(), Some(3));
        assert_eq!(Value::from(3.5).as_i64(), None);
        assert_eq!(Value::from("many").as_i64(), None);
        assert_eq!(Value::from(true).as_i64(), None);
    }

    #[test]
    fn as_i64_rejects_floats_outside_i64() {
        assert_eq!(Value::from(1e300).as_i64(), None);
        assert_eq!(Value::from(-1e30).as_i64(), None);
        assert_eq!(Value::from(i64::MAX as f64).as_i64(), None);
        assert_eq!(Value::from(f64::INFINITY).as_i64(), None);
        assert_eq!(Value::from(f64::NAN).as_i64(), None);
        assert_eq!(Value::from(-4096.0).as_i64(), Some(-4096));
    }

    #[test]
    fn int_narrows_to_int4() {
        let mut buf = BytesMut::new();
        let is_null = Value::Int(300).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(&buf[..], &300_i32.to_be_bytes());
    }

    #[test]
    fn int_out_of_range_for_int2_errors() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(100_000).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn bool_into_text_column_is_wrong_type() {
        let mut buf = BytesMut::new();
        assert!(Value::Bool(true).to_sql_checked(&Type::TEXT, &mut buf).is_err());
    }

    #[test]
    fn null_binds_anywhere() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql_checked(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn serializes_untagged() {
        let v = vec![Value::from("Aliya"), Value::from(32), Value::Null];
        assert_eq!(serde_json::to_value(&v).unwrap(), json!(["Aliya", 32, null]));
    }
}
