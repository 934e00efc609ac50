//! SQL abstraction layer for multi-database support
//!
//! This module provides the predicate model filters produce, and renders it
//! for different database backends (PostgreSQL, SQLite) or evaluates it in
//! memory.

mod dialect;
mod eval;
mod expr;
mod postgres_dialect;
mod query;
mod render;
mod sqlite_dialect;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use dialect::SqlDialect;
pub use eval::Row;
pub use expr::{CompareOp, Expr, Predicate};
pub use postgres_dialect::PostgresDialect;
pub use query::{Filterable, SelectQuery};
pub use render::SqlParams;
pub use sqlite_dialect::SqliteDialect;

/// Database backend identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Sqlite,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Sqlite => &SqliteDialect,
            Backend::Postgres => &PostgresDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
            other => Err(format!(
                "Unknown dialect '{}'. Expected one of: postgres, sqlite",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("PostgreSQL".parse::<Backend>().unwrap(), Backend::Postgres);
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert!("mysql".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_dialect() {
        assert_eq!(Backend::Postgres.dialect().name(), "postgres");
        assert_eq!(Backend::Sqlite.dialect().name(), "sqlite");
    }
}
