//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - JSON path extraction
/// - Case-insensitive matching
/// - Spatial predicates
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Quote an identifier
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Cast an expression to string type
    ///
    /// - PostgreSQL: `expr::TEXT`
    /// - SQLite: `CAST(expr AS TEXT)`
    fn cast_to_string(&self, expr: &str) -> String;

    /// Encode a JSON path as the parameter value the extraction functions take
    ///
    /// - PostgreSQL: text array literal `{"a","b"}`
    /// - SQLite: JSON path `$."a"."b"`
    fn json_path(&self, path: &[String]) -> String;

    /// Extract a JSON element, keeping it typed as JSON
    ///
    /// - PostgreSQL: `(expr #> $1::TEXT[])`
    /// - SQLite: `json_extract(expr, ?)`
    fn json_element(&self, expr: &str, path_param: usize) -> String;

    /// Extract a JSON element as text
    ///
    /// - PostgreSQL: `(expr #>> $1::TEXT[])`
    /// - SQLite: `json_extract(expr, ?)`
    fn json_text(&self, expr: &str, path_param: usize) -> String;

    /// Case-insensitive LIKE
    ///
    /// - PostgreSQL: `expr ILIKE $1`
    /// - SQLite: `expr LIKE ?` (case-insensitive for ASCII)
    fn ilike(&self, expr: &str, param_idx: usize) -> String;

    /// Geometric containment of `expr` by a WKT operand
    ///
    /// - PostgreSQL (PostGIS): `ST_CoveredBy(expr, ST_GeomFromText($1, 4326))`
    /// - SQLite (SpatiaLite): `CoveredBy(expr, GeomFromText(?, 4326))`
    fn covered_by(&self, expr: &str, param_idx: usize, srid: i32) -> String;
}
