//! Field values
//!
//! Every column in the store holds one of four value shapes. Dates are
//! persisted as ISO `YYYY-MM-DD` text.

use crate::schema::FieldType;
use crate::{Error, Result};
use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput};
use std::fmt;

/// A single column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload, if any
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Parse a raw string (e.g. from the command line) as a value of the given field type
    pub fn parse(ty: FieldType, raw: &str) -> Result<Self> {
        match ty {
            FieldType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| Error::InvalidValue(format!("expected an integer, got '{}'", raw))),
            FieldType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| Error::InvalidValue(format!("expected a date (YYYY-MM-DD), got '{}'", raw))),
            FieldType::Text | FieldType::VarChar(_) => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Short name of the value shape, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Date(_) => "date",
            Value::Text(_) => "text",
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Date(d) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}
