//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn cast_to_string(&self, expr: &str) -> String {
        format!("CAST({} AS TEXT)", expr)
    }

    fn json_path(&self, path: &[String]) -> String {
        let mut encoded = String::from("$");
        for element in path {
            // Numeric elements address array items
            if element.parse::<usize>().is_ok() {
                encoded.push_str(&format!("[{}]", element));
            } else {
                encoded.push_str(&format!(".\"{}\"", element.replace('"', "\\\"")));
            }
        }
        encoded
    }

    fn json_element(&self, expr: &str, _path_param: usize) -> String {
        // SQLite stores JSON as TEXT
        format!("json_extract({}, ?)", expr)
    }

    fn json_text(&self, expr: &str, _path_param: usize) -> String {
        format!("json_extract({}, ?)", expr)
    }

    fn ilike(&self, expr: &str, _param_idx: usize) -> String {
        // LIKE is case-insensitive for ASCII in SQLite
        format!("{} LIKE ?", expr)
    }

    fn covered_by(&self, expr: &str, _param_idx: usize, srid: i32) -> String {
        // Requires the SpatiaLite extension
        format!("CoveredBy({}, GeomFromText(?, {}))", expr, srid)
    }
}
