//! Database Value Types
//!
//! [`DatabaseValue`] is the bindable form of an entity field. Entity fields are
//! read through their serde representation and converted here, so the variants
//! mirror the JSON data model: null, booleans, integers, floats, strings, and
//! nested arrays or objects (stored as `JSONB`).
//!
//! Each variant reports its own PostgreSQL type when bound, and statements cast
//! every placeholder to the declared column type, so a `Text` value can land
//! in a `TIMESTAMPTZ` or `UUID` column.

use std::fmt::{self, Display};

use serde_json::Value;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo};
use sqlx::{Encode, Postgres, Type, encode::IsNull, error::BoxDynError};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::database::error::{DbError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    /// Written as a literal `NULL`, never bound.
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl DatabaseValue {
    /// Converts the serialized value of `column` into a bindable value.
    pub fn from_json(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(DatabaseValue::Null),
            Value::Bool(b) => Ok(DatabaseValue::Boolean(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(DatabaseValue::Int(i))
                } else if n.is_u64() {
                    Err(DbError::UnsupportedValue {
                        column: column.to_string(),
                        reason: format!("{} does not fit in a signed 64-bit integer", n),
                    })
                } else {
                    n.as_f64()
                        .map(DatabaseValue::Float)
                        .ok_or_else(|| DbError::UnsupportedValue {
                            column: column.to_string(),
                            reason: format!("{} is not a finite number", n),
                        })
                }
            }
            Value::String(s) => Ok(DatabaseValue::Text(s)),
            value @ (Value::Array(_) | Value::Object(_)) => Ok(DatabaseValue::Json(value)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Zero values are skipped when a struct is used as a filter.
    pub fn is_zero(&self) -> bool {
        match self {
            DatabaseValue::Null => true,
            DatabaseValue::Boolean(b) => !b,
            DatabaseValue::Int(i) => *i == 0,
            DatabaseValue::Float(f) => *f == 0.0,
            DatabaseValue::Text(s) => s.is_empty(),
            DatabaseValue::Json(_) => false,
        }
    }
}

impl Display for DatabaseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseValue::Null => write!(f, "NULL"),
            DatabaseValue::Boolean(b) => write!(f, "{}", b),
            DatabaseValue::Int(i) => write!(f, "{}", i),
            DatabaseValue::Float(v) => write!(f, "{}", v),
            DatabaseValue::Text(s) => write!(f, "{:?}", s),
            DatabaseValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl<'q> Encode<'q, Postgres> for DatabaseValue {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        match self {
            DatabaseValue::Null => Ok(IsNull::Yes),
            DatabaseValue::Boolean(b) => Encode::<Postgres>::encode_by_ref(b, buf),
            DatabaseValue::Int(i) => Encode::<Postgres>::encode_by_ref(i, buf),
            DatabaseValue::Float(f) => Encode::<Postgres>::encode_by_ref(f, buf),
            DatabaseValue::Text(s) => Encode::<Postgres>::encode_by_ref(s, buf),
            DatabaseValue::Json(v) => Encode::<Postgres>::encode_by_ref(v, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        match self {
            DatabaseValue::Null => None,
            DatabaseValue::Boolean(_) => Some(<bool as Type<Postgres>>::type_info()),
            DatabaseValue::Int(_) => Some(<i64 as Type<Postgres>>::type_info()),
            DatabaseValue::Float(_) => Some(<f64 as Type<Postgres>>::type_info()),
            DatabaseValue::Text(_) => Some(<String as Type<Postgres>>::type_info()),
            DatabaseValue::Json(_) => Some(<Value as Type<Postgres>>::type_info()),
        }
    }
}

impl Type<Postgres> for DatabaseValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("text")
    }
}

impl From<&str> for DatabaseValue {
    fn from(s: &str) -> Self {
        DatabaseValue::Text(s.to_string())
    }
}

impl From<String> for DatabaseValue {
    fn from(s: String) -> Self {
        DatabaseValue::Text(s)
    }
}

impl From<&String> for DatabaseValue {
    fn from(s: &String) -> Self {
        DatabaseValue::Text(s.clone())
    }
}

impl From<bool> for DatabaseValue {
    fn from(b: bool) -> Self {
        DatabaseValue::Boolean(b)
    }
}

impl From<i32> for DatabaseValue {
    fn from(i: i32) -> Self {
        DatabaseValue::Int(i.into())
    }
}

impl From<i64> for DatabaseValue {
    fn from(i: i64) -> Self {
        DatabaseValue::Int(i)
    }
}

impl From<u32> for DatabaseValue {
    fn from(i: u32) -> Self {
        DatabaseValue::Int(i.into())
    }
}

impl From<f64> for DatabaseValue {
    fn from(f: f64) -> Self {
        DatabaseValue::Float(f)
    }
}

impl From<OffsetDateTime> for DatabaseValue {
    fn from(dt: OffsetDateTime) -> Self {
        DatabaseValue::Text(dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string()))
    }
}

impl From<Value> for DatabaseValue {
    fn from(value: Value) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => DatabaseValue::Null,
        }
    }
}
