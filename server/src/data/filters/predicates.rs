//! Predicate builders
//!
//! Type-aware builders referenced by the lookup registry. Each receives the
//! column reference and the normalized value.

use super::error::FilterError;
use super::fields::parse_wkt;
use super::lookups::LookupKind;
use super::value::FilterValue;
use crate::data::schema::Column;
use crate::data::sql::{Expr, Predicate};

/// Enumerations and untyped expressions are matched through a text cast
fn pattern_target(column: &Column) -> Result<Expr, FilterError> {
    let leaf = column.leaf_type()?;
    Ok(if leaf.is_enum_or_untyped() {
        column.cast_text()
    } else {
        column.expr()
    })
}

pub fn startswith(column: &Column, value: &FilterValue) -> Result<Predicate, FilterError> {
    Ok(pattern_target(column)?.ilike(format!("{}%", value.to_text())))
}

pub fn endswith(column: &Column, value: &FilterValue) -> Result<Predicate, FilterError> {
    Ok(pattern_target(column)?.ilike(format!("%{}", value.to_text())))
}

pub fn icontains(column: &Column, value: &FilterValue) -> Result<Predicate, FilterError> {
    Ok(pattern_target(column)?.ilike(format!("%{}%", value.to_text())))
}

/// Substring match over the text form of a JSON value
pub fn json_icontains(column: &Column, value: &FilterValue) -> Result<Predicate, FilterError> {
    let leaf = column.leaf_type()?;
    let target = match column.text_accessor() {
        Some(accessor) if !leaf.is_json_native() => accessor,
        _ => column.cast_text(),
    };
    Ok(target.ilike(format!("%{}%", value.to_text())))
}

pub fn is_null(column: &Column, value: &FilterValue) -> Result<Predicate, FilterError> {
    let expr = column.expr();
    Ok(if value.is_truthy() {
        expr.is_null()
    } else {
        expr.is_not_null()
    })
}

/// Null-or-empty-string for string leaves; plain null test for everything else
pub fn is_empty(column: &Column, value: &FilterValue) -> Result<Predicate, FilterError> {
    let leaf = column.leaf_type()?;
    if !leaf.is_string() {
        return is_null(column, value);
    }

    let expr = column.expr();
    let empty = FilterValue::text("");
    Ok(if value.is_truthy() {
        expr.clone().is_null().or(expr.eq(empty))
    } else {
        expr.clone().is_not_null().and(expr.ne(empty))
    })
}

pub fn coveredby(column: &Column, value: &FilterValue) -> Result<Predicate, FilterError> {
    let geometry = match value {
        FilterValue::Geometry(geometry) => geometry.clone(),
        FilterValue::Text(wkt) => parse_wkt(wkt)
            .map_err(|e| FilterError::validation(&column.name, LookupKind::CoveredBy, e))?,
        other => {
            return Err(FilterError::Validation {
                field: column.name.clone(),
                lookup: LookupKind::CoveredBy,
                message: format!("Not a valid WKT geometry: {}", other.to_text()),
            });
        }
    };
    Ok(column.expr().covered_by(geometry))
}
