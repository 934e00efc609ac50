//! Filter values
//!
//! Raw request values arrive as JSON. They are converted into [`FilterValue`]
//! so later stages can carry parsed leaf types (datetimes, geometries) that
//! JSON cannot express.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};

/// Geometry operand parsed from well-known text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub srid: i32,
    /// Normalized WKT body without the `SRID=` prefix
    pub wkt: String,
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SRID={};{}", self.srid, self.wkt)
    }
}

/// Value flowing through cleaning, normalization and predicate building
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    Geometry(Geometry),
    List(Vec<FilterValue>),
    Map(Map<String, JsonValue>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Membership in the fixed set of empty representations.
    ///
    /// Only null, the empty sequence and the empty mapping count. The empty
    /// string, `0` and `false` are real filter operands.
    pub fn is_empty_value(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::List(items) => items.is_empty(),
            FilterValue::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Truthiness used by the flag lookups (`is_null`, `is_empty`)
    pub fn is_truthy(&self) -> bool {
        match self {
            FilterValue::Null => false,
            FilterValue::Bool(b) => *b,
            FilterValue::Int(n) => *n != 0,
            FilterValue::Float(n) => *n != 0.0,
            FilterValue::Text(s) => !s.is_empty(),
            FilterValue::DateTime(_) | FilterValue::Geometry(_) => true,
            FilterValue::List(items) => !items.is_empty(),
            FilterValue::Map(map) => !map.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    /// Text form used for pattern building and SQL parameters
    pub fn to_text(&self) -> String {
        match self {
            FilterValue::Null => String::new(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Float(n) => n.to_string(),
            FilterValue::Text(s) => s.clone(),
            FilterValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            FilterValue::Geometry(g) => g.wkt.clone(),
            FilterValue::List(_) | FilterValue::Map(_) => self.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FilterValue::Null => JsonValue::Null,
            FilterValue::Bool(b) => JsonValue::Bool(*b),
            FilterValue::Int(n) => JsonValue::from(*n),
            FilterValue::Float(n) => JsonValue::from(*n),
            FilterValue::Text(s) => JsonValue::String(s.clone()),
            FilterValue::DateTime(_) | FilterValue::Geometry(_) => JsonValue::String(self.to_text()),
            FilterValue::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            FilterValue::Map(map) => JsonValue::Object(map.clone()),
        }
    }
}

impl From<JsonValue> for FilterValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => FilterValue::Null,
            JsonValue::Bool(b) => FilterValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => FilterValue::Int(i),
                None => FilterValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => FilterValue::Text(s),
            JsonValue::Array(items) => {
                FilterValue::List(items.into_iter().map(FilterValue::from).collect())
            }
            JsonValue::Object(map) => FilterValue::Map(map),
        }
    }
}

impl From<&JsonValue> for FilterValue {
    fn from(value: &JsonValue) -> Self {
        FilterValue::from(value.clone())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}
