//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn cast_to_string(&self, expr: &str) -> String {
        format!("{}::TEXT", expr)
    }

    fn json_path(&self, path: &[String]) -> String {
        let elements: Vec<String> = path
            .iter()
            .map(|p| format!("\"{}\"", p.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();
        format!("{{{}}}", elements.join(","))
    }

    fn json_element(&self, expr: &str, path_param: usize) -> String {
        format!("({} #> ${}::TEXT[])", expr, path_param)
    }

    fn json_text(&self, expr: &str, path_param: usize) -> String {
        format!("({} #>> ${}::TEXT[])", expr, path_param)
    }

    fn ilike(&self, expr: &str, param_idx: usize) -> String {
        format!("{} ILIKE ${}", expr, param_idx)
    }

    fn covered_by(&self, expr: &str, param_idx: usize, srid: i32) -> String {
        format!(
            "ST_CoveredBy({}, ST_GeomFromText(${}, {}))",
            expr, param_idx, srid
        )
    }
}
