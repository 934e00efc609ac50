//! Core application

use std::fmt::Write;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{CRATE_TARGET, ENV_LOG};
use crate::data::filters::{
    DispatchTable, LookupRegistry, apply_filters, build_filters, dispatch,
};
use crate::data::schema::{ColumnFamily, SchemaSnapshot, SqlType};
use crate::data::sql::SelectQuery;
use crate::utils::file::expand_path;

pub struct CoreApp {
    pub config: AppConfig,
    pub dispatch: &'static DispatchTable,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;
        let app = Self {
            dispatch: dispatch::init(config.filters.capabilities()),
            config,
        };

        let output = match command {
            Some(Commands::Lookups { sql_type }) => app.lookups(sql_type.as_deref()),
            None => app.lookups(None),
            Some(Commands::Explain {
                schema,
                table,
                params,
            }) => {
                let path = expand_path(&schema.to_string_lossy());
                let snapshot = SchemaSnapshot::load(&path)?;
                app.explain(&snapshot, &table, params)?
            }
        };
        print!("{}", output);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", CRATE_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }

    /// Dispatch table listing, or the lookups of one declared type
    fn lookups(&self, sql_type: Option<&str>) -> String {
        let mut out = String::new();
        match sql_type {
            None => {
                let _ = writeln!(out, "{:<10} {:<10} LOOKUPS", "FAMILY", "VARIANT");
                // Families without an entry resolve to the string spec
                let fallback = ColumnFamily::ALL
                    .into_iter()
                    .filter(|family| self.dispatch.entries().iter().all(|(f, _)| f != family))
                    .map(|family| (family, self.dispatch.resolve_spec(family)));
                let rows = self.dispatch.entries().iter().copied().chain(fallback);
                for (family, spec) in rows {
                    let lookups: Vec<&str> = spec.lookups.iter().map(|l| l.as_str()).collect();
                    let _ = writeln!(
                        out,
                        "{:<10} {:<10} {}",
                        family.as_str(),
                        spec.variant.name(),
                        lookups.join(", ")
                    );
                }
            }
            Some(declared) => {
                let sql_type = SqlType::parse(declared);
                let family = sql_type.family();
                let spec = self.dispatch.resolve_spec(family);
                let _ = writeln!(
                    out,
                    "{} -> {} (variant {})",
                    sql_type,
                    family,
                    spec.variant
                );
                let registry = LookupRegistry::global();
                for lookup in spec.lookups {
                    let operator = registry
                        .resolve(*lookup)
                        .map(|d| d.operator.label())
                        .unwrap_or_default();
                    let _ = writeln!(out, "  {:<16} {}", lookup.as_str(), operator);
                }
            }
        }
        out
    }

    /// Build filters for a table and render the resulting statement
    fn explain(
        &self,
        snapshot: &SchemaSnapshot,
        table: &str,
        params: Vec<(String, JsonValue)>,
    ) -> Result<String> {
        let schema = snapshot
            .table(table)
            .with_context(|| format!("Table '{}' not found in schema", table))?;

        let filters = build_filters(params, schema, self.dispatch, self.config.filters.max_filters)
            .with_context(|| format!("Invalid filters for table '{}'", table))?;
        let query = apply_filters(SelectQuery::new(&schema.name), filters)
            .with_context(|| format!("Invalid filters for table '{}'", table))?;

        let dialect = self.config.filters.dialect.dialect();
        let (sql, params) = query.to_sql(dialect);
        tracing::debug!(dialect = dialect.name(), params = params.len(), "Query rendered");

        let values: Vec<JsonValue> = params.values.iter().map(|v| v.to_json()).collect();
        let mut out = String::new();
        let _ = writeln!(out, "{}", sql);
        let _ = writeln!(out, "params: {}", JsonValue::Array(values));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FilterConfig;
    use crate::data::filters::Capabilities;
    use crate::data::schema::{Column, TableSchema};
    use crate::data::sql::Backend;
    use serde_json::json;

    fn app(dialect: Backend, geospatial: bool) -> CoreApp {
        CoreApp {
            config: AppConfig {
                filters: FilterConfig {
                    dialect,
                    geospatial,
                    ..FilterConfig::default()
                },
            },
            dispatch: Box::leak(Box::new(DispatchTable::new(Capabilities { geospatial }))),
        }
    }

    fn snapshot() -> SchemaSnapshot {
        SchemaSnapshot {
            tables: vec![TableSchema {
                name: "users".to_string(),
                columns: vec![
                    Column::new("name", "varchar").with_table("users"),
                    Column::new("age", "int4").with_table("users"),
                    Column::new("status", "USER-DEFINED").with_table("users"),
                ],
            }],
        }
    }

    #[test]
    fn test_lookups_table() {
        let out = app(Backend::Postgres, false).lookups(None);
        assert!(out.starts_with("FAMILY"));
        assert!(out.contains("boolean    boolean    exact, in, is_null, is_empty"));
        assert!(!out.contains("coveredby"));
        assert!(out.contains(
            "geometry   char       exact, icontains, in, starts_with, ends_with, is_null, is_empty"
        ));
        assert!(out.ends_with(
            "unknown    char       exact, icontains, in, starts_with, ends_with, is_null, is_empty\n"
        ));

        let out = app(Backend::Postgres, true).lookups(None);
        assert!(out.contains("geometry   wkt        coveredby"));
        assert_eq!(out.matches("unknown").count(), 1);
    }

    #[test]
    fn test_lookups_for_type() {
        let out = app(Backend::Postgres, true).lookups(Some("timestamptz"));
        assert!(out.starts_with("timestamp -> datetime (variant datetime)"));
        assert!(out.contains("  gte              >="));
        assert!(out.contains("  in               IN"));
    }

    #[test]
    fn test_explain_postgres() {
        let params = vec![
            ("status__starts_with".to_string(), json!("act")),
            ("exclude__age__in".to_string(), json!("18,21")),
            ("page".to_string(), json!(2)),
        ];
        let out = app(Backend::Postgres, true)
            .explain(&snapshot(), "users", params)
            .unwrap();
        assert_eq!(
            out,
            "SELECT * FROM \"users\" WHERE \"users\".\"status\"::TEXT ILIKE $1 \
             AND NOT (\"users\".\"age\" IN ($2, $3))\n\
             params: [\"act%\",\"18\",\"21\"]\n"
        );
    }

    #[test]
    fn test_explain_sqlite_is_null() {
        let params = vec![("name__is_null".to_string(), json!("false"))];
        let out = app(Backend::Sqlite, true)
            .explain(&snapshot(), "users", params)
            .unwrap();
        assert!(out.starts_with("SELECT * FROM \"users\" WHERE \"users\".\"name\" IS NOT NULL\n"));
    }

    #[test]
    fn test_explain_errors() {
        let err = app(Backend::Postgres, true)
            .explain(&snapshot(), "orders", vec![])
            .unwrap_err();
        assert!(err.to_string().contains("Table 'orders' not found"));

        let err = app(Backend::Postgres, true)
            .explain(&snapshot(), "users", vec![("age__starts_with".to_string(), json!("1"))])
            .unwrap_err();
        assert!(format!("{:#}", err).contains("not allowed"));
    }
}
