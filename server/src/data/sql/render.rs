//! SQL rendering of predicates
//!
//! Every operand is bound as a parameter; the rendered fragment only contains
//! quoted identifiers, operators and placeholders.

use super::SqlDialect;
use super::expr::{Expr, Predicate};
use crate::data::filters::FilterValue;

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SqlParams {
    pub values: Vec<FilterValue>,
}

impl SqlParams {
    /// Append a value and return its 1-based index
    pub fn push(&mut self, value: FilterValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Expr {
    /// Generate the SQL for this expression, pushing path operands into params
    pub fn to_sql(&self, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
        match self {
            Expr::Column { table, name } => match table {
                Some(table) => format!(
                    "{}.{}",
                    dialect.quote_ident(table),
                    dialect.quote_ident(name)
                ),
                None => dialect.quote_ident(name),
            },
            Expr::JsonElement { base, path } => {
                let base = base.to_sql(dialect, params);
                let idx = params.push(FilterValue::Text(dialect.json_path(path)));
                dialect.json_element(&base, idx)
            }
            Expr::JsonText { base, path } => {
                let base = base.to_sql(dialect, params);
                let idx = params.push(FilterValue::Text(dialect.json_path(path)));
                dialect.json_text(&base, idx)
            }
            Expr::CastText(inner) => {
                let inner = inner.to_sql(dialect, params);
                dialect.cast_to_string(&inner)
            }
        }
    }
}

impl Predicate {
    /// Generate SQL WHERE clause fragment
    /// Returns the SQL clause with dialect placeholders and updates params
    pub fn to_sql(&self, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
        match self {
            Predicate::Compare { expr, op, value } => {
                let col = expr.to_sql(dialect, params);
                let idx = params.push(value.clone());
                format!("{} {} {}", col, op.as_sql(), dialect.placeholder(idx))
            }
            Predicate::In { expr, values } => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let col = expr.to_sql(dialect, params);
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| dialect.placeholder(params.push(v.clone())))
                    .collect();
                format!("{} IN ({})", col, placeholders.join(", "))
            }
            Predicate::ILike { expr, pattern } => {
                let col = expr.to_sql(dialect, params);
                let idx = params.push(FilterValue::Text(pattern.clone()));
                dialect.ilike(&col, idx)
            }
            Predicate::IsNull(expr) => format!("{} IS NULL", expr.to_sql(dialect, params)),
            Predicate::IsNotNull(expr) => {
                format!("{} IS NOT NULL", expr.to_sql(dialect, params))
            }
            Predicate::CoveredBy { expr, geometry } => {
                let col = expr.to_sql(dialect, params);
                let idx = params.push(FilterValue::Text(geometry.wkt.clone()));
                dialect.covered_by(&col, idx, geometry.srid)
            }
            Predicate::And(items) => join(items, " AND ", "1=1", dialect, params),
            Predicate::Or(items) => join(items, " OR ", "1=0", dialect, params),
            Predicate::Not(inner) => format!("NOT ({})", inner.to_sql(dialect, params)),
        }
    }
}

fn join(
    items: &[Predicate],
    separator: &str,
    identity: &str,
    dialect: &dyn SqlDialect,
    params: &mut SqlParams,
) -> String {
    if items.is_empty() {
        return identity.to_string();
    }
    let parts: Vec<String> = items
        .iter()
        .map(|p| match p {
            Predicate::And(_) | Predicate::Or(_) => format!("({})", p.to_sql(dialect, params)),
            _ => p.to_sql(dialect, params),
        })
        .collect();
    parts.join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::Geometry;
    use crate::data::sql::{CompareOp, PostgresDialect, SqliteDialect};

    fn col(name: &str) -> Expr {
        Expr::Column {
            table: Some("users".to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn compare_binds_value() {
        let mut params = SqlParams::default();
        let sql = col("age")
            .compare(CompareOp::Gte, FilterValue::Int(18))
            .to_sql(&PostgresDialect, &mut params);
        assert_eq!(sql, "\"users\".\"age\" >= $1");
        assert_eq!(params.values, vec![FilterValue::Int(18)]);
    }

    #[test]
    fn in_list_placeholders() {
        let mut params = SqlParams::default();
        let p = col("id").in_list(vec![FilterValue::Int(1), FilterValue::Int(2)]);
        assert_eq!(p.to_sql(&PostgresDialect, &mut params), "\"users\".\"id\" IN ($1, $2)");

        let mut params = SqlParams::default();
        assert_eq!(p.to_sql(&SqliteDialect, &mut params), "\"users\".\"id\" IN (?, ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_in_is_false() {
        let mut params = SqlParams::default();
        let sql = col("id").in_list(vec![]).to_sql(&PostgresDialect, &mut params);
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn negated_disjunction() {
        let mut params = SqlParams::default();
        let p = col("name")
            .is_null()
            .or(col("name").eq(FilterValue::text("")))
            .negate();
        assert_eq!(
            p.to_sql(&PostgresDialect, &mut params),
            "NOT (\"users\".\"name\" IS NULL OR \"users\".\"name\" = $1)"
        );
    }

    #[test]
    fn nested_groups_are_parenthesized() {
        let mut params = SqlParams::default();
        let p = Predicate::And(vec![
            col("a").is_null(),
            Predicate::Or(vec![col("b").is_null(), col("c").is_null()]),
        ]);
        assert_eq!(
            p.to_sql(&SqliteDialect, &mut params),
            "\"users\".\"a\" IS NULL AND (\"users\".\"b\" IS NULL OR \"users\".\"c\" IS NULL)"
        );
    }

    #[test]
    fn json_text_binds_path_before_pattern() {
        let mut params = SqlParams::default();
        let expr = Expr::JsonText {
            base: Box::new(col("data")),
            path: vec!["city".to_string()],
        };
        let sql = expr.ilike("%ber%").to_sql(&PostgresDialect, &mut params);
        assert_eq!(sql, "(\"users\".\"data\" #>> $1::TEXT[]) ILIKE $2");
        assert_eq!(
            params.values,
            vec![FilterValue::text(r#"{"city"}"#), FilterValue::text("%ber%")]
        );
    }

    #[test]
    fn cast_text_sqlite() {
        let mut params = SqlParams::default();
        let sql = Expr::CastText(Box::new(col("status")))
            .ilike("a%")
            .to_sql(&SqliteDialect, &mut params);
        assert_eq!(sql, "CAST(\"users\".\"status\" AS TEXT) LIKE ?");
    }

    #[test]
    fn covered_by_binds_wkt_with_srid() {
        let mut params = SqlParams::default();
        let geometry = Geometry {
            srid: 3857,
            wkt: "POINT(1 2)".to_string(),
        };
        let sql = col("geom").covered_by(geometry).to_sql(&PostgresDialect, &mut params);
        assert_eq!(
            sql,
            "ST_CoveredBy(\"users\".\"geom\", ST_GeomFromText($1, 3857))"
        );
        assert_eq!(params.values, vec![FilterValue::text("POINT(1 2)")]);
    }

    #[test]
    fn quote_ident_escapes_quotes() {
        let mut params = SqlParams::default();
        let sql = Expr::column("we\"ird").is_null().to_sql(&PostgresDialect, &mut params);
        assert_eq!(sql, "\"we\"\"ird\" IS NULL");
    }
}
