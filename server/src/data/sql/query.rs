//! Query seam filters attach predicates to

use super::SqlDialect;
use super::eval::Row;
use super::expr::Predicate;
use super::render::SqlParams;

/// A query that accepts additional predicates
///
/// Filters only ever conjoin; implementors decide how the predicate is
/// carried (SQL builder, ORM query, in-memory selection).
pub trait Filterable: Sized {
    fn add_predicate(self, predicate: Predicate) -> Self;
}

/// Minimal `SELECT *` over one table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    predicates: Vec<Predicate>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Conjunction of every attached predicate
    pub fn predicate(&self) -> Option<Predicate> {
        Predicate::all(self.predicates.iter().cloned())
    }

    /// Generate the WHERE clause body, if any predicate is attached
    pub fn where_clause(&self, dialect: &dyn SqlDialect, params: &mut SqlParams) -> Option<String> {
        self.predicate().map(|p| p.to_sql(dialect, params))
    }

    /// Generate the full statement and its parameters
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> (String, SqlParams) {
        let mut params = SqlParams::default();
        let mut sql = format!("SELECT * FROM {}", dialect.quote_ident(&self.table));
        if let Some(clause) = self.where_clause(dialect, &mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        (sql, params)
    }

    /// Whether a row passes every attached predicate
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Rows selected by this query, in input order
    pub fn select<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}

impl Filterable for SelectQuery {
    fn add_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}
