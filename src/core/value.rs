//! SQL value types
//!
//! This module defines the closed set of values that can be substituted into a statement
//! and read back from a result row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text layout used for date/time literals and for parsing them back
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQL value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// String value
    String(String),
    /// Single character
    Char(char),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date and time without sub-second precision in its literal form
    DateTime(NaiveDateTime),
    /// GUID / UUID
    Guid(Uuid),
    /// Sequence of values, rendered as a comma separated list
    List(Vec<SqlValue>),
}

/// Integer form of a float, if it has no fractional part and fits in an i64
fn whole_number(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

impl SqlValue {
    /// Build a list value from any sequence of convertible items
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        SqlValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(v) => Some(*v),
            SqlValue::Int(v) => Some(*v != 0),
            SqlValue::Long(v) => Some(*v != 0),
            SqlValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the value as an i32
    pub fn as_int(&self) -> Option<i32> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Long(v) => i32::try_from(*v).ok(),
            SqlValue::Float(v) => whole_number(f64::from(*v)).and_then(|v| i32::try_from(v).ok()),
            SqlValue::Double(v) => whole_number(*v).and_then(|v| i32::try_from(v).ok()),
            SqlValue::String(s) => s.trim().parse().ok(),
            SqlValue::Bool(v) => Some(*v as i32),
            _ => None,
        }
    }

    /// Get the value as an i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            SqlValue::Long(v) => Some(*v),
            SqlValue::Int(v) => Some(*v as i64),
            SqlValue::Float(v) => whole_number(f64::from(*v)),
            SqlValue::Double(v) => whole_number(*v),
            SqlValue::String(s) => s.trim().parse().ok(),
            SqlValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the value as an f32
    pub fn as_float(&self) -> Option<f32> {
        match self {
            SqlValue::Float(v) => Some(*v),
            SqlValue::Double(v) => {
                let narrowed = *v as f32;
                (narrowed.is_finite() || !v.is_finite()).then_some(narrowed)
            }
            SqlValue::Int(v) => Some(*v as f32),
            SqlValue::Long(v) => Some(*v as f32),
            SqlValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as an f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            SqlValue::Double(v) => Some(*v),
            SqlValue::Float(v) => Some(*v as f64),
            SqlValue::Int(v) => Some(*v as f64),
            SqlValue::Long(v) => Some(*v as f64),
            SqlValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a string (zero-copy for String values)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the value as a string (with conversion)
    pub fn as_string(&self) -> String {
        match self {
            SqlValue::Null => "null".to_string(),
            SqlValue::Bool(v) => v.to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Long(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Double(v) => v.to_string(),
            SqlValue::String(s) => s.clone(),
            SqlValue::Char(c) => c.to_string(),
            SqlValue::Bytes(b) => format!("<{} bytes>", b.len()),
            SqlValue::DateTime(v) => v.format(DATETIME_FORMAT).to_string(),
            SqlValue::Guid(v) => v.to_string(),
            SqlValue::List(items) => items
                .iter()
                .map(SqlValue::as_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Get the value as bytes (zero-copy)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Bytes(b) => Some(b),
            SqlValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Get the value as a date/time, parsing text in `YYYY-MM-DD HH:MM:SS` layout
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::DateTime(v) => Some(*v),
            SqlValue::String(s) => NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                }),
            _ => None,
        }
    }

    /// Get the value as a UUID
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            SqlValue::Guid(v) => Some(*v),
            SqlValue::String(s) => Uuid::parse_str(s.trim()).ok(),
            SqlValue::Bytes(b) => Uuid::from_slice(b).ok(),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Long(_) => "long",
            SqlValue::Float(_) => "float",
            SqlValue::Double(_) => "double",
            SqlValue::String(_) => "string",
            SqlValue::Char(_) => "char",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::DateTime(_) => "datetime",
            SqlValue::Guid(_) => "guid",
            SqlValue::List(_) => "list",
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::Int(v as i32)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Long(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Long(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::String(v.clone())
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<char> for SqlValue {
    fn from(v: char) -> Self {
        SqlValue::Char(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(v: &[u8]) -> Self {
        SqlValue::Bytes(v.to_vec())
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::DateTime(v.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::DateTime(v.naive_utc())
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Guid(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => SqlValue::Null,
        }
    }
}

// Byte vectors are binary data, every other element type becomes a list.
macro_rules! impl_list_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<Vec<$t>> for SqlValue {
                fn from(v: Vec<$t>) -> Self {
                    SqlValue::list(v)
                }
            }

            impl From<&[$t]> for SqlValue {
                fn from(v: &[$t]) -> Self {
                    SqlValue::list(v.iter().cloned())
                }
            }
        )*
    };
}

impl_list_from!(
    bool,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    String,
    &str,
    char,
    NaiveDateTime,
    NaiveDate,
    Uuid,
    SqlValue,
);

impl<const N: usize> From<[i32; N]> for SqlValue {
    fn from(v: [i32; N]) -> Self {
        SqlValue::list(v)
    }
}

impl<const N: usize> From<[&str; N]> for SqlValue {
    fn from(v: [&str; N]) -> Self {
        SqlValue::list(v)
    }
}

/// Conversion from a [`SqlValue`] into a Rust type
///
/// An exact variant match converts directly; otherwise the standard numeric/text
/// conversion of the accessors applies. `None` means the value is incompatible.
pub trait FromSqlValue: Sized {
    /// Convert the value, or `None` when the types are incompatible
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromSqlValue for i16 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_long().and_then(|v| i16::try_from(v).ok())
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_int()
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_long()
    }
}

impl FromSqlValue for u32 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_long().and_then(|v| u32::try_from(v).ok())
    }
}

impl FromSqlValue for u64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_long().and_then(|v| u64::try_from(v).ok())
    }
}

impl FromSqlValue for f32 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_double()
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Null | SqlValue::Bytes(_) | SqlValue::List(_) => None,
            other => Some(other.as_string()),
        }
    }
}

impl FromSqlValue for char {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Char(c) => Some(*c),
            SqlValue::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_datetime()
    }
}

impl FromSqlValue for NaiveDate {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_datetime().map(|v| v.date())
    }
}

impl FromSqlValue for Uuid {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_guid()
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Null => Some(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

/// One result row: ordered `(column name, value)` pairs
///
/// Column lookup by name is case-insensitive and returns the first match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRow {
    columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Builder-style variant of [`SqlRow::push`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Get a column value by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Get a column value by position
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.columns.get(index).map(|(_, value)| value)
    }

    /// Column names in result order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// All columns in result order
    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<N: Into<String>, V: Into<SqlValue>> FromIterator<(N, V)> for SqlRow {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Multiple rows returned from a query
pub type SqlRows = Vec<SqlRow>;
