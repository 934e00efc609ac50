//! Leaf type coercion
//!
//! A field converts one value into the leaf type a lookup or a filter variant
//! needs. Fields are the only place where request values are parsed into
//! booleans, numbers, datetimes and geometries.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use super::error::FieldError;
use super::value::{FilterValue, Geometry};

/// SRID applied to geometries given without an `SRID=` prefix (WGS 84)
pub const DEFAULT_SRID: i32 = 4326;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Leaf type a value is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Char,
    Boolean,
    Integer,
    Float,
    DateTime,
    Wkt,
}

/// Leaf coercion declared by a lookup: a field plus its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafCoercion {
    pub field: FieldKind,
    /// Coerce every element of a sequence instead of a single value
    pub many: bool,
}

impl LeafCoercion {
    pub const fn one(field: FieldKind) -> Self {
        Self { field, many: false }
    }

    pub const fn many(field: FieldKind) -> Self {
        Self { field, many: true }
    }

    pub fn coerce(&self, value: FilterValue) -> Result<FilterValue, FieldError> {
        if !self.many {
            return self.field.coerce(value);
        }
        match value {
            FilterValue::List(items) => items
                .into_iter()
                .map(|item| self.field.coerce(item))
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List),
            other => Err(FieldError::new(format!(
                "Expected a list of items but got {}",
                other.to_text()
            ))),
        }
    }
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Char => "char",
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::DateTime => "datetime",
            FieldKind::Wkt => "wkt",
        }
    }

    /// Coerce a single value. Null passes through every field.
    pub fn coerce(&self, value: FilterValue) -> Result<FilterValue, FieldError> {
        if value.is_null() {
            return Ok(value);
        }
        match self {
            FieldKind::Char => to_char(value),
            FieldKind::Boolean => to_boolean(value),
            FieldKind::Integer => to_integer(value),
            FieldKind::Float => to_float(value),
            FieldKind::DateTime => to_datetime(value),
            FieldKind::Wkt => to_geometry(value),
        }
    }
}

fn to_char(value: FilterValue) -> Result<FilterValue, FieldError> {
    match value {
        FilterValue::Text(_) => Ok(value),
        FilterValue::List(_) | FilterValue::Map(_) => Err(FieldError::new(format!(
            "Not a valid string: {}",
            value.to_text()
        ))),
        other => Ok(FilterValue::Text(other.to_text())),
    }
}

fn to_boolean(value: FilterValue) -> Result<FilterValue, FieldError> {
    let parsed = match &value {
        FilterValue::Bool(b) => Some(*b),
        FilterValue::Int(0) => Some(false),
        FilterValue::Int(1) => Some(true),
        FilterValue::Float(n) if *n == 0.0 => Some(false),
        FilterValue::Float(n) if *n == 1.0 => Some(true),
        FilterValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "t" | "true" | "1" => Some(true),
            "f" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(FilterValue::Bool)
        .ok_or_else(|| FieldError::new(format!("Not a valid boolean: {}", value.to_text())))
}

fn to_integer(value: FilterValue) -> Result<FilterValue, FieldError> {
    let parsed = match &value {
        FilterValue::Int(n) => Some(*n),
        FilterValue::Float(n) => integral(*n),
        FilterValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    parsed
        .map(FilterValue::Int)
        .ok_or_else(|| FieldError::new(format!("Not a valid integer: {}", value.to_text())))
}

fn integral(n: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn to_float(value: FilterValue) -> Result<FilterValue, FieldError> {
    let parsed = match &value {
        FilterValue::Int(n) => Some(*n as f64),
        FilterValue::Float(n) => Some(*n),
        FilterValue::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .map(FilterValue::Float)
        .ok_or_else(|| FieldError::new(format!("Not a valid number: {}", value.to_text())))
}

fn to_datetime(value: FilterValue) -> Result<FilterValue, FieldError> {
    match &value {
        FilterValue::DateTime(_) => Ok(value),
        FilterValue::Text(s) => parse_datetime(s)
            .map(FilterValue::DateTime)
            .ok_or_else(|| FieldError::new(format!("Not a valid datetime: {}", s))),
        _ => Err(FieldError::new(format!(
            "Not a valid datetime: {}",
            value.to_text()
        ))),
    }
}

/// Parse RFC 3339, naive date-times and plain dates. Naive values are UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn to_geometry(value: FilterValue) -> Result<FilterValue, FieldError> {
    match &value {
        FilterValue::Geometry(_) => Ok(value),
        FilterValue::Text(s) => parse_wkt(s).map(FilterValue::Geometry),
        _ => Err(FieldError::new(format!(
            "Not a valid WKT geometry: {}",
            value.to_text()
        ))),
    }
}

/// Parse (E)WKT text into a geometry operand.
///
/// Only the envelope is checked: keyword, optional dimension suffix, and a
/// balanced coordinate body. The database parses the coordinates.
pub fn parse_wkt(s: &str) -> Result<Geometry, FieldError> {
    static RE_WKT: OnceLock<Regex> = OnceLock::new();
    let re = RE_WKT.get_or_init(|| {
        Regex::new(
            r"(?is)^\s*(?:SRID=(-?\d+)\s*;)?\s*(POINT|LINESTRING|POLYGON|MULTIPOINT|MULTILINESTRING|MULTIPOLYGON|GEOMETRYCOLLECTION)(?:\s*\b(ZM|Z|M)\b)?\s*(EMPTY|\(.*\))\s*$",
        )
        .expect("Invalid regex")
    });

    let invalid = || FieldError::new(format!("Not a valid WKT geometry: {}", s));
    let caps = re.captures(s).ok_or_else(invalid)?;

    let srid = match caps.get(1) {
        Some(m) => m.as_str().parse::<i32>().map_err(|_| invalid())?,
        None => DEFAULT_SRID,
    };
    let keyword = caps[2].to_uppercase();
    let dims = caps.get(3).map(|m| m.as_str().to_uppercase());
    let body = caps[4].split_whitespace().collect::<Vec<_>>().join(" ");

    if !body.eq_ignore_ascii_case("EMPTY") && !valid_body(&body, keyword == "GEOMETRYCOLLECTION") {
        return Err(invalid());
    }

    let wkt = match (dims, body.eq_ignore_ascii_case("EMPTY")) {
        (Some(dims), _) => format!("{} {} {}", keyword, dims, body),
        (None, true) => format!("{} EMPTY", keyword),
        (None, false) => format!("{}{}", keyword, body),
    };
    Ok(Geometry { srid, wkt })
}

fn valid_body(body: &str, collection: bool) -> bool {
    let mut depth: i32 = 0;
    for c in body.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            c if c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | ' ' | 'e' | 'E') => {}
            c if collection && c.is_ascii_alphabetic() => {}
            _ => return false,
        }
    }
    depth == 0 && body.chars().any(|c| c.is_ascii_digit())
}
