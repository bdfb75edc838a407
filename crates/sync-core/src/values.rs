//! Value representations for rows read from the relational source.
//!
//! A [`SourceRow`] is positional: it carries the column values in the order
//! the source returned them and nothing else. Column names and types are not
//! part of the contract.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A single scalar value read from a source column.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    /// SQL NULL
    Null,

    /// Boolean value
    Bool(bool),

    /// 32-bit signed integer (also used for 16-bit columns)
    Int32(i32),

    /// 64-bit signed integer
    Int64(i64),

    /// 64-bit floating point (also used for 32-bit columns)
    Float64(f64),

    /// Arbitrary precision decimal, kept in its string form
    Decimal(String),

    /// Text value
    Text(String),

    /// Date/time normalized to UTC
    Timestamp(DateTime<Utc>),

    /// Calendar date without time
    Date(NaiveDate),

    /// UUID value
    Uuid(Uuid),

    /// JSON or JSONB value
    Json(serde_json::Value),

    /// Binary data
    Bytes(Vec<u8>),
}

impl SourceValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Decimal(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a 64-bit integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(i) => Some(i64::from(*i)),
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Canonical text form of the value, used to derive stable keys.
    ///
    /// Returns `None` for values that cannot identify a row (NULL, JSON, bytes).
    pub fn key_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::Json(_) | Self::Bytes(_) => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int32(i) => Some(i.to_string()),
            Self::Int64(i) => Some(i.to_string()),
            Self::Float64(f) => Some(f.to_string()),
            Self::Decimal(s) | Self::Text(s) => Some(s.clone()),
            Self::Timestamp(ts) => Some(ts.to_rfc3339()),
            Self::Date(d) => Some(d.to_string()),
            Self::Uuid(u) => Some(u.to_string()),
        }
    }
}

impl From<&str> for SourceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for SourceValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for SourceValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for SourceValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for SourceValue {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<Uuid> for SourceValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One record fetched from the source, represented positionally.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceRow {
    values: Vec<SourceValue>,
}

impl SourceRow {
    /// Create a row from its column values in source order.
    pub fn new(values: Vec<SourceValue>) -> Self {
        Self { values }
    }

    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the value at a column position.
    pub fn get(&self, index: usize) -> Option<&SourceValue> {
        self.values.get(index)
    }

    /// Iterate over the values in source order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceValue> {
        self.values.iter()
    }

    /// Consume the row, returning its values.
    pub fn into_values(self) -> Vec<SourceValue> {
        self.values
    }
}

impl From<Vec<SourceValue>> for SourceRow {
    fn from(values: Vec<SourceValue>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<SourceValue> for SourceRow {
    fn from_iter<I: IntoIterator<Item = SourceValue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
