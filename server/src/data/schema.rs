//! Schema model
//!
//! Declared column types and column references for tables exposed by the
//! gateway. The schema itself is produced by the introspection step and
//! handed over as a JSON snapshot; this module only classifies it.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::filters::FilterError;
use crate::data::sql::Expr;
use crate::utils::file::read_json;

// =============================================================================
// Declared Types
// =============================================================================

/// Declared storage type of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SqlType {
    Varchar,
    Text,
    Enum,
    Boolean,
    Integer,
    SmallInteger,
    BigInteger,
    Numeric,
    Float,
    Date,
    DateTime,
    Timestamp,
    Json,
    Jsonb,
    Array,
    /// Element extracted from a JSON document by path
    JsonElement,
    Geometry,
    Geography,
    /// Untyped expression (no declared type)
    Null,
    Other(String),
}

impl SqlType {
    /// Classify a declared type name as reported by the database
    pub fn parse(declared: &str) -> Self {
        let lowered = declared.trim().to_lowercase();
        if lowered.is_empty() || lowered == "null" {
            return SqlType::Null;
        }
        if lowered.ends_with("[]") {
            return SqlType::Array;
        }

        let base = lowered.split('(').next().unwrap_or_default().trim();
        match base {
            "varchar" | "character varying" | "char" | "character" | "nvarchar" | "nchar"
            | "string" | "citext" => SqlType::Varchar,
            "text" | "tinytext" | "mediumtext" | "longtext" | "clob" => SqlType::Text,
            "enum" | "user-defined" => SqlType::Enum,
            "boolean" | "bool" => SqlType::Boolean,
            "integer" | "int" | "int4" | "serial" | "mediumint" => SqlType::Integer,
            "smallint" | "int2" | "tinyint" | "smallserial" => SqlType::SmallInteger,
            "bigint" | "int8" | "bigserial" => SqlType::BigInteger,
            "numeric" | "decimal" => SqlType::Numeric,
            "float" | "real" | "double" | "double precision" | "float4" | "float8" => {
                SqlType::Float
            }
            "date" => SqlType::Date,
            "datetime" => SqlType::DateTime,
            "timestamp" | "timestamptz" => SqlType::Timestamp,
            "json" => SqlType::Json,
            "jsonb" => SqlType::Jsonb,
            "array" => SqlType::Array,
            "json_element" => SqlType::JsonElement,
            "geometry" => SqlType::Geometry,
            "geography" => SqlType::Geography,
            _ if base.starts_with("timestamp") => SqlType::Timestamp,
            _ => SqlType::Other(declared.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SqlType::Varchar => "varchar",
            SqlType::Text => "text",
            SqlType::Enum => "enum",
            SqlType::Boolean => "boolean",
            SqlType::Integer => "integer",
            SqlType::SmallInteger => "smallint",
            SqlType::BigInteger => "bigint",
            SqlType::Numeric => "numeric",
            SqlType::Float => "float",
            SqlType::Date => "date",
            SqlType::DateTime => "datetime",
            SqlType::Timestamp => "timestamp",
            SqlType::Json => "json",
            SqlType::Jsonb => "jsonb",
            SqlType::Array => "array",
            SqlType::JsonElement => "json_element",
            SqlType::Geometry => "geometry",
            SqlType::Geography => "geography",
            SqlType::Null => "null",
            SqlType::Other(name) => name,
        }
    }

    pub fn family(&self) -> ColumnFamily {
        match self {
            SqlType::Varchar | SqlType::Text | SqlType::Enum => ColumnFamily::String,
            SqlType::Boolean => ColumnFamily::Boolean,
            SqlType::Integer | SqlType::SmallInteger | SqlType::BigInteger | SqlType::Numeric => {
                ColumnFamily::Integer
            }
            SqlType::Float => ColumnFamily::Float,
            SqlType::Date | SqlType::DateTime | SqlType::Timestamp => ColumnFamily::DateTime,
            SqlType::Json | SqlType::Jsonb | SqlType::Array | SqlType::JsonElement => {
                ColumnFamily::Json
            }
            SqlType::Geometry | SqlType::Geography => ColumnFamily::Geometry,
            SqlType::Null | SqlType::Other(_) => ColumnFamily::Unknown,
        }
    }

    /// Enumerations and untyped expressions need a text cast before pattern matching
    pub fn is_enum_or_untyped(&self) -> bool {
        matches!(self, SqlType::Enum | SqlType::Null)
    }

    /// JSON documents (and untyped expressions) have no text accessor of their own
    pub fn is_json_native(&self) -> bool {
        matches!(self, SqlType::Json | SqlType::Jsonb | SqlType::Null)
    }

    /// String storage, where "empty" also covers `''`
    pub fn is_string(&self) -> bool {
        matches!(self, SqlType::Varchar | SqlType::Text | SqlType::Enum)
    }
}

impl From<String> for SqlType {
    fn from(declared: String) -> Self {
        SqlType::parse(&declared)
    }
}

impl From<&str> for SqlType {
    fn from(declared: &str) -> Self {
        SqlType::parse(declared)
    }
}

impl From<SqlType> for String {
    fn from(sql_type: SqlType) -> Self {
        sql_type.as_str().to_string()
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf type family used to pick filter behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnFamily {
    String,
    Boolean,
    Integer,
    Float,
    DateTime,
    Json,
    Geometry,
    Unknown,
}

impl ColumnFamily {
    pub const ALL: [ColumnFamily; 8] = [
        ColumnFamily::String,
        ColumnFamily::Boolean,
        ColumnFamily::Integer,
        ColumnFamily::Float,
        ColumnFamily::DateTime,
        ColumnFamily::Json,
        ColumnFamily::Geometry,
        ColumnFamily::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnFamily::String => "string",
            ColumnFamily::Boolean => "boolean",
            ColumnFamily::Integer => "integer",
            ColumnFamily::Float => "float",
            ColumnFamily::DateTime => "datetime",
            ColumnFamily::Json => "json",
            ColumnFamily::Geometry => "geometry",
            ColumnFamily::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Column References
// =============================================================================

/// Reference to a filterable column (or a JSON element inside one)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type; `None` when the type could not be resolved
    #[serde(rename = "type", default)]
    pub sql_type: Option<SqlType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// JSON path inside the column; non-empty for JSON element references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: impl Into<SqlType>) -> Self {
        Self {
            name: name.into(),
            sql_type: Some(sql_type.into()),
            table: None,
            path: Vec::new(),
        }
    }

    /// Column whose declared type is unknown to the gateway
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
            table: None,
            path: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Reference an element of this JSON column
    pub fn json_element<I, S>(&self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut element = self.clone();
        element.path.extend(path.into_iter().map(Into::into));
        element
    }

    /// Leaf type of the referenced value
    pub fn leaf_type(&self) -> Result<SqlType, FilterError> {
        if !self.path.is_empty() {
            return Ok(SqlType::JsonElement);
        }
        self.sql_type.clone().ok_or_else(|| {
            FilterError::configuration(format!("Cannot resolve type of column '{}'", self.name))
        })
    }

    pub fn family(&self) -> ColumnFamily {
        self.leaf_type()
            .map(|t| t.family())
            .unwrap_or(ColumnFamily::Unknown)
    }

    /// Expression for the referenced value
    pub fn expr(&self) -> Expr {
        let column = Expr::Column {
            table: self.table.clone(),
            name: self.name.clone(),
        };
        if self.path.is_empty() {
            column
        } else {
            Expr::JsonElement {
                base: Box::new(column),
                path: self.path.clone(),
            }
        }
    }

    /// Whole value cast to text
    pub fn cast_text(&self) -> Expr {
        Expr::CastText(Box::new(self.expr()))
    }

    /// Text representation of a JSON element; only element references have one
    pub fn text_accessor(&self) -> Option<Expr> {
        if self.path.is_empty() {
            return None;
        }
        Some(Expr::JsonText {
            base: Box::new(Expr::Column {
                table: self.table.clone(),
                name: self.name.clone(),
            }),
            path: self.path.clone(),
        })
    }
}

// =============================================================================
// Table Schemas
// =============================================================================

/// Filterable columns of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Schema snapshot produced by introspection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

impl SchemaSnapshot {
    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading schema snapshot");
        let snapshot: Self = read_json(path, "schema")?;

        // Columns inherit the table name so rendered SQL stays qualified
        let snapshot = Self {
            tables: snapshot
                .tables
                .into_iter()
                .map(|mut table| {
                    for column in &mut table.columns {
                        column.table.get_or_insert_with(|| table.name.clone());
                    }
                    table
                })
                .collect(),
        };
        tracing::debug!(tables = snapshot.tables.len(), "Schema snapshot loaded");
        Ok(snapshot)
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}
