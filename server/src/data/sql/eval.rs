//! In-memory evaluation of predicates
//!
//! Rows are JSON objects keyed by column name. Evaluation follows SQL
//! three-valued logic: `None` is UNKNOWN.

use std::cmp::Ordering;

use serde_json::{Map, Value as JsonValue};

use super::expr::{CompareOp, Expr, Predicate};
use crate::data::filters::FilterValue;
use crate::data::filters::fields::parse_datetime;
use crate::utils::sql::like_matches;

/// A row as seen by the evaluator
pub type Row = Map<String, JsonValue>;

impl Expr {
    /// Value of this expression for a row (JSON null when absent)
    pub fn evaluate(&self, row: &Row) -> JsonValue {
        match self {
            Expr::Column { name, .. } => row.get(name).cloned().unwrap_or(JsonValue::Null),
            Expr::JsonElement { base, path } => navigate(base.evaluate(row), path),
            Expr::JsonText { base, path } => as_text(navigate(base.evaluate(row), path)),
            Expr::CastText(inner) => as_text(inner.evaluate(row)),
        }
    }
}

impl Predicate {
    /// Three-valued result for a row
    pub fn evaluate(&self, row: &Row) -> Option<bool> {
        match self {
            Predicate::Compare { expr, op, value } => {
                let left = expr.evaluate(row);
                if left.is_null() || value.is_null() {
                    return None;
                }
                let ordering = compare(&left, value)?;
                Some(match op {
                    CompareOp::Eq => ordering == Ordering::Equal,
                    CompareOp::Ne => ordering != Ordering::Equal,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Gte => ordering != Ordering::Less,
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Lte => ordering != Ordering::Greater,
                })
            }
            Predicate::In { expr, values } => {
                if values.is_empty() {
                    return Some(false);
                }
                let left = expr.evaluate(row);
                if left.is_null() {
                    return None;
                }
                let mut unknown = false;
                for value in values {
                    match (value.is_null(), compare(&left, value)) {
                        (false, Some(Ordering::Equal)) => return Some(true),
                        (true, _) => unknown = true,
                        _ => {}
                    }
                }
                if unknown { None } else { Some(false) }
            }
            Predicate::ILike { expr, pattern } => match as_text(expr.evaluate(row)) {
                JsonValue::String(text) => like_matches(pattern, &text),
                _ => None,
            },
            Predicate::IsNull(expr) => Some(expr.evaluate(row).is_null()),
            Predicate::IsNotNull(expr) => Some(!expr.evaluate(row).is_null()),
            // Needs a spatial engine
            Predicate::CoveredBy { .. } => None,
            Predicate::And(items) => {
                let mut result = Some(true);
                for item in items {
                    match item.evaluate(row) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Predicate::Or(items) => {
                let mut result = Some(false);
                for item in items {
                    match item.evaluate(row) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Predicate::Not(inner) => inner.evaluate(row).map(|b| !b),
        }
    }

    /// Whether the row is selected (UNKNOWN is not selected)
    pub fn matches(&self, row: &Row) -> bool {
        self.evaluate(row) == Some(true)
    }
}

fn navigate(mut value: JsonValue, path: &[String]) -> JsonValue {
    for key in path {
        value = match value {
            JsonValue::Object(mut map) => map.remove(key).unwrap_or(JsonValue::Null),
            JsonValue::Array(mut items) => match key.parse::<usize>() {
                Ok(idx) if idx < items.len() => items.swap_remove(idx),
                _ => JsonValue::Null,
            },
            _ => JsonValue::Null,
        };
    }
    value
}

fn as_text(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Null | JsonValue::String(_) => value,
        other => JsonValue::String(other.to_string()),
    }
}

fn number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Order a row value against an operand; `None` when they are not comparable
fn compare(left: &JsonValue, right: &FilterValue) -> Option<Ordering> {
    match right {
        FilterValue::Int(n) => number(left)?.partial_cmp(&(*n as f64)),
        FilterValue::Float(n) => number(left)?.partial_cmp(n),
        FilterValue::Bool(b) => match left {
            JsonValue::Bool(l) => Some(l.cmp(b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(0) => Some(false.cmp(b)),
                Some(1) => Some(true.cmp(b)),
                _ => None,
            },
            _ => None,
        },
        FilterValue::Text(s) => match left {
            JsonValue::String(l) => Some(l.as_str().cmp(s.as_str())),
            JsonValue::Number(n) => match s.trim().parse::<f64>() {
                Ok(r) => n.as_f64()?.partial_cmp(&r),
                Err(_) => Some(n.to_string().as_str().cmp(s.as_str())),
            },
            JsonValue::Bool(l) => Some(l.to_string().as_str().cmp(s.as_str())),
            _ => None,
        },
        FilterValue::DateTime(dt) => match left {
            JsonValue::String(l) => Some(parse_datetime(l)?.cmp(dt)),
            _ => None,
        },
        FilterValue::Null
        | FilterValue::Geometry(_)
        | FilterValue::List(_)
        | FilterValue::Map(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: JsonValue) -> Row {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn comparison_with_null_is_unknown() {
        let r = row(json!({"age": null}));
        let p = Expr::column("age").compare(CompareOp::Gt, FilterValue::Int(1));
        assert_eq!(p.evaluate(&r), None);
        assert_eq!(p.clone().negate().evaluate(&r), None);
        assert!(!p.matches(&r));
    }

    #[test]
    fn numbers_compare_numerically() {
        let r = row(json!({"age": 30, "score": "7.5"}));
        assert!(Expr::column("age").compare(CompareOp::Gte, FilterValue::Int(30)).matches(&r));
        assert!(Expr::column("score").compare(CompareOp::Lt, FilterValue::Float(10.0)).matches(&r));
        assert!(Expr::column("age").eq(FilterValue::text("30")).matches(&r));
    }

    #[test]
    fn datetimes_compare_as_instants() {
        let r = row(json!({"created": "2024-01-01T12:00:00+02:00"}));
        let cutoff = parse_datetime("2024-01-01T11:00:00Z").unwrap();
        let p = Expr::column("created").compare(CompareOp::Lt, FilterValue::DateTime(cutoff));
        assert_eq!(p.evaluate(&r), Some(true));
    }

    #[test]
    fn in_list_three_valued() {
        let r = row(json!({"id": 2}));
        let hit = Expr::column("id").in_list(vec![FilterValue::Int(1), FilterValue::Int(2)]);
        assert_eq!(hit.evaluate(&r), Some(true));

        let miss_with_null = Expr::column("id").in_list(vec![FilterValue::Int(1), FilterValue::Null]);
        assert_eq!(miss_with_null.evaluate(&r), None);

        assert_eq!(Expr::column("id").in_list(vec![]).evaluate(&r), Some(false));
    }

    #[test]
    fn ilike_on_cast_and_json_text() {
        let r = row(json!({"status": "ACTIVE", "data": {"city": "Berlin", "n": 5}}));
        assert!(Expr::CastText(Box::new(Expr::column("status"))).ilike("act%").matches(&r));

        let city = Expr::JsonText {
            base: Box::new(Expr::column("data")),
            path: vec!["city".to_string()],
        };
        assert!(city.ilike("%erl%").matches(&r));

        let whole = Expr::CastText(Box::new(Expr::column("data")));
        assert!(whole.ilike("%\"n\":5%").matches(&r));
    }

    #[test]
    fn missing_json_path_is_null() {
        let r = row(json!({"data": {"a": [1, 2]}}));
        let element = Expr::JsonElement {
            base: Box::new(Expr::column("data")),
            path: vec!["a".to_string(), "1".to_string()],
        };
        assert_eq!(element.evaluate(&r), json!(2));

        let missing = Expr::JsonText {
            base: Box::new(Expr::column("data")),
            path: vec!["b".to_string()],
        };
        assert!(missing.is_null().matches(&r));
    }

    #[test]
    fn kleene_connectives() {
        let r = row(json!({"a": null, "b": 1}));
        let unknown = Expr::column("a").eq(FilterValue::Int(1));
        let yes = Expr::column("b").eq(FilterValue::Int(1));
        let no = Expr::column("b").eq(FilterValue::Int(2));

        assert_eq!(unknown.clone().and(no.clone()).evaluate(&r), Some(false));
        assert_eq!(unknown.clone().and(yes.clone()).evaluate(&r), None);
        assert_eq!(unknown.clone().or(yes).evaluate(&r), Some(true));
        assert_eq!(unknown.or(no).evaluate(&r), None);
    }

    #[test]
    fn covered_by_is_unknown() {
        let r = row(json!({"geom": "POINT(1 1)"}));
        let p = Expr::column("geom").covered_by(crate::data::filters::Geometry {
            srid: 4326,
            wkt: "POLYGON((0 0, 2 0, 2 2, 0 2, 0 0))".to_string(),
        });
        assert_eq!(p.evaluate(&r), None);
    }
}
