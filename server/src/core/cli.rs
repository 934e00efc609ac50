use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_DIALECT, ENV_GEOSPATIAL, ENV_MAX_FILTERS};
use crate::data::sql::Backend;

#[derive(Parser)]
#[command(name = "bridge")]
#[command(version, about = "Filter translation for database-backed API endpoints", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Enable or disable geospatial lookups (coveredby)
    #[arg(long, global = true, env = ENV_GEOSPATIAL)]
    pub geospatial: Option<bool>,

    /// Maximum number of filters per request
    #[arg(long, global = true, env = ENV_MAX_FILTERS)]
    pub max_filters: Option<usize>,

    /// SQL dialect used for rendering (postgres or sqlite)
    #[arg(long, short = 'd', global = true, env = ENV_DIALECT, value_parser = parse_dialect)]
    pub dialect: Option<Backend>,
}

/// Parse SQL dialect from CLI/env string
fn parse_dialect(s: &str) -> Result<Backend, String> {
    s.parse()
}

/// Parse a `KEY=VALUE` filter parameter.
///
/// The value is read as JSON when it parses (`[1,2]`, `true`, `null`),
/// otherwise it is taken verbatim as a string.
fn parse_param(s: &str) -> Result<(String, JsonValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter '{}'. Expected KEY=VALUE", s))?;
    if key.is_empty() {
        return Err(format!("Invalid parameter '{}'. Key is empty", s));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| JsonValue::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List lookups allowed per column type (default command)
    Lookups {
        /// Declared column type to show (e.g. "varchar", "timestamptz", "jsonb")
        sql_type: Option<String>,
    },
    /// Build filters from request parameters and print the rendered SQL
    Explain {
        /// Schema snapshot (JSON) produced by introspection
        #[arg(long, short = 's')]
        schema: PathBuf,

        /// Table to filter
        #[arg(long, short = 't')]
        table: String,

        /// Filter parameters, e.g. `name__icontains=bob` `exclude__age__gt=30`
        #[arg(value_parser = parse_param)]
        params: Vec<(String, JsonValue)>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub geospatial: Option<bool>,
    pub max_filters: Option<usize>,
    pub dialect: Option<Backend>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        geospatial: cli.geospatial,
        max_filters: cli.max_filters,
        dialect: cli.dialect,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_param_json_value() {
        assert_eq!(parse_param("age__in=[1,2]").unwrap(), ("age__in".to_string(), json!([1, 2])));
        assert_eq!(parse_param("x__is_null=true").unwrap().1, json!(true));
    }

    #[test]
    fn test_parse_param_plain_string() {
        assert_eq!(
            parse_param("name__icontains=bob smith").unwrap(),
            ("name__icontains".to_string(), json!("bob smith"))
        );
        assert_eq!(parse_param("code__in=a,b").unwrap().1, json!("a,b"));
        assert_eq!(parse_param("name=").unwrap().1, json!(""));
    }

    #[test]
    fn test_parse_param_invalid() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_cli_explain() {
        let cli = Cli::try_parse_from([
            "bridge",
            "--dialect",
            "sqlite",
            "explain",
            "--schema",
            "schema.json",
            "--table",
            "users",
            "name__starts_with=al",
            "exclude__age__lt=18",
        ])
        .unwrap();
        assert_eq!(cli.dialect, Some(Backend::Sqlite));
        match cli.command {
            Some(Commands::Explain { table, params, .. }) => {
                assert_eq!(table, "users");
                assert_eq!(params.len(), 2);
                assert_eq!(params[1], ("exclude__age__lt".to_string(), json!(18)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_dialect() {
        assert!(Cli::try_parse_from(["bridge", "--dialect", "oracle"]).is_err());
    }
}
