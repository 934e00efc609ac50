//! Type dispatch table
//!
//! Maps a column's leaf type family to the filter variant that cleans values
//! for it and the lookups it accepts. The table depends on runtime
//! capabilities (geospatial support) and is published once per process.

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use super::error::FieldError;
use super::fields::FieldKind;
use super::lookups::LookupKind;
use super::value::FilterValue;
use crate::data::schema::ColumnFamily;

static TABLE: OnceLock<DispatchTable> = OnceLock::new();

const STRING_LOOKUPS: &[LookupKind] = &[
    LookupKind::Exact,
    LookupKind::Icontains,
    LookupKind::In,
    LookupKind::StartsWith,
    LookupKind::EndsWith,
    LookupKind::IsNull,
    LookupKind::IsEmpty,
];

const BOOLEAN_LOOKUPS: &[LookupKind] = &[
    LookupKind::Exact,
    LookupKind::In,
    LookupKind::IsNull,
    LookupKind::IsEmpty,
];

const ORDERED_LOOKUPS: &[LookupKind] = &[
    LookupKind::Exact,
    LookupKind::Gt,
    LookupKind::Gte,
    LookupKind::Lt,
    LookupKind::Lte,
    LookupKind::Icontains,
    LookupKind::In,
    LookupKind::IsNull,
    LookupKind::IsEmpty,
];

const JSON_LOOKUPS: &[LookupKind] = &[
    LookupKind::JsonIcontains,
    LookupKind::IsNull,
    LookupKind::IsEmpty,
];

const GEOMETRY_LOOKUPS: &[LookupKind] = &[LookupKind::CoveredBy];

/// Per-type value cleaning applied before lookup dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterVariant {
    Char,
    /// Char over JSON documents
    JsonChar,
    Boolean,
    Integer,
    Float,
    DateTime,
    Wkt,
}

impl FilterVariant {
    pub fn name(&self) -> &'static str {
        match self {
            FilterVariant::Char => "char",
            FilterVariant::JsonChar => "json_char",
            FilterVariant::Boolean => "boolean",
            FilterVariant::Integer => "integer",
            FilterVariant::Float => "float",
            FilterVariant::DateTime => "datetime",
            FilterVariant::Wkt => "wkt",
        }
    }

    pub fn field(&self) -> FieldKind {
        match self {
            FilterVariant::Char | FilterVariant::JsonChar => FieldKind::Char,
            FilterVariant::Boolean => FieldKind::Boolean,
            FilterVariant::Integer => FieldKind::Integer,
            FilterVariant::Float => FieldKind::Float,
            FilterVariant::DateTime => FieldKind::DateTime,
            FilterVariant::Wkt => FieldKind::Wkt,
        }
    }

    /// Parse a raw value into this variant's leaf type.
    ///
    /// Only lookups whose operand is a column value are cleaned. Sequences are
    /// cleaned element-wise, and comma-separated text for `in` is split first
    /// so both spellings clean to the same operands.
    pub fn clean_value(
        &self,
        lookup: LookupKind,
        value: FilterValue,
    ) -> Result<FilterValue, FieldError> {
        if matches!(self, FilterVariant::Char | FilterVariant::JsonChar)
            || !lookup.takes_column_value()
            || value.is_empty_value()
        {
            return Ok(value);
        }

        let field = self.field();
        match value {
            FilterValue::List(items) => items
                .into_iter()
                .map(|item| field.coerce(item))
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List),
            FilterValue::Text(text) if lookup == LookupKind::In => {
                if text.is_empty() {
                    return Ok(FilterValue::Text(text));
                }
                text.split(',')
                    .map(|item| field.coerce(FilterValue::text(item)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FilterValue::List)
            }
            scalar => field.coerce(scalar),
        }
    }
}

impl fmt::Display for FilterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filter variant and allowed lookups for one type family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub variant: FilterVariant,
    pub lookups: &'static [LookupKind],
}

impl FilterSpec {
    const fn new(variant: FilterVariant, lookups: &'static [LookupKind]) -> Self {
        Self { variant, lookups }
    }

    pub fn allows(&self, lookup: LookupKind) -> bool {
        self.lookups.contains(&lookup)
    }
}

/// Optional backend features that change the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Spatial predicates available (PostGIS / SpatiaLite)
    pub geospatial: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { geospatial: true }
    }
}

/// Leaf type family -> filter spec
#[derive(Debug, Clone)]
pub struct DispatchTable {
    capabilities: Capabilities,
    entries: Vec<(ColumnFamily, FilterSpec)>,
}

impl DispatchTable {
    pub fn new(capabilities: Capabilities) -> Self {
        let mut entries = vec![
            (
                ColumnFamily::String,
                FilterSpec::new(FilterVariant::Char, STRING_LOOKUPS),
            ),
            (
                ColumnFamily::Boolean,
                FilterSpec::new(FilterVariant::Boolean, BOOLEAN_LOOKUPS),
            ),
            (
                ColumnFamily::Integer,
                FilterSpec::new(FilterVariant::Integer, ORDERED_LOOKUPS),
            ),
            (
                ColumnFamily::Float,
                FilterSpec::new(FilterVariant::Float, ORDERED_LOOKUPS),
            ),
            (
                ColumnFamily::DateTime,
                FilterSpec::new(FilterVariant::DateTime, ORDERED_LOOKUPS),
            ),
            (
                ColumnFamily::Json,
                FilterSpec::new(FilterVariant::JsonChar, JSON_LOOKUPS),
            ),
        ];
        if capabilities.geospatial {
            entries.push((
                ColumnFamily::Geometry,
                FilterSpec::new(FilterVariant::Wkt, GEOMETRY_LOOKUPS),
            ));
        }
        Self {
            capabilities,
            entries,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Spec for a family; unmatched families get the string spec
    pub fn resolve_spec(&self, family: ColumnFamily) -> FilterSpec {
        self.entries
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, spec)| *spec)
            .unwrap_or(FilterSpec::new(FilterVariant::Char, STRING_LOOKUPS))
    }

    /// Explicit entries in table order
    pub fn entries(&self) -> &[(ColumnFamily, FilterSpec)] {
        &self.entries
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}

/// Publish the process-wide table. The first call wins.
pub fn init(capabilities: Capabilities) -> &'static DispatchTable {
    let table = TABLE.get_or_init(|| DispatchTable::new(capabilities));
    if table.capabilities != capabilities {
        tracing::warn!(
            requested = ?capabilities,
            active = ?table.capabilities,
            "Dispatch table already initialized, ignoring new capabilities"
        );
    }
    table
}

/// Process-wide table (default capabilities if never initialized)
pub fn table() -> &'static DispatchTable {
    TABLE.get_or_init(DispatchTable::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_family_spec() {
        let spec = DispatchTable::default().resolve_spec(ColumnFamily::String);
        assert_eq!(spec.variant, FilterVariant::Char);
        assert!(spec.allows(LookupKind::StartsWith));
        assert!(!spec.allows(LookupKind::Gt));
    }

    #[test]
    fn boolean_rejects_ordering() {
        let spec = DispatchTable::default().resolve_spec(ColumnFamily::Boolean);
        assert!(spec.allows(LookupKind::In));
        assert!(!spec.allows(LookupKind::Gt));
        assert!(!spec.allows(LookupKind::Icontains));
    }

    #[test]
    fn numeric_and_temporal_share_lookups() {
        let table = DispatchTable::default();
        for family in [ColumnFamily::Integer, ColumnFamily::Float, ColumnFamily::DateTime] {
            assert_eq!(table.resolve_spec(family).lookups, ORDERED_LOOKUPS);
        }
        assert_eq!(
            table.resolve_spec(ColumnFamily::DateTime).variant,
            FilterVariant::DateTime
        );
    }

    #[test]
    fn unknown_family_defaults_to_string() {
        let spec = DispatchTable::default().resolve_spec(ColumnFamily::Unknown);
        assert_eq!(spec.variant, FilterVariant::Char);
        assert_eq!(spec.lookups, STRING_LOOKUPS);
    }

    #[test]
    fn geometry_requires_capability() {
        let with = DispatchTable::new(Capabilities { geospatial: true });
        let spec = with.resolve_spec(ColumnFamily::Geometry);
        assert_eq!(spec.variant, FilterVariant::Wkt);
        assert_eq!(spec.lookups, &[LookupKind::CoveredBy]);

        let without = DispatchTable::new(Capabilities { geospatial: false });
        let spec = without.resolve_spec(ColumnFamily::Geometry);
        assert_eq!(spec.variant, FilterVariant::Char);
        assert!(!spec.allows(LookupKind::CoveredBy));
    }

    #[test]
    fn clean_value_parses_column_values() {
        let cleaned = FilterVariant::Integer
            .clean_value(LookupKind::Gt, FilterValue::text("10"))
            .unwrap();
        assert_eq!(cleaned, FilterValue::Int(10));

        let err = FilterVariant::Integer.clean_value(LookupKind::Exact, FilterValue::text("ten"));
        assert!(err.is_err());
    }

    #[test]
    fn clean_value_skips_patterns_and_flags() {
        let value = FilterVariant::Integer
            .clean_value(LookupKind::Icontains, FilterValue::text("1x"))
            .unwrap();
        assert_eq!(value, FilterValue::text("1x"));

        let value = FilterVariant::DateTime
            .clean_value(LookupKind::IsNull, FilterValue::text("true"))
            .unwrap();
        assert_eq!(value, FilterValue::text("true"));
    }

    #[test]
    fn clean_value_maps_sequences() {
        let value = FilterVariant::Boolean
            .clean_value(
                LookupKind::In,
                FilterValue::List(vec![FilterValue::text("t"), FilterValue::text("0")]),
            )
            .unwrap();
        assert_eq!(
            value,
            FilterValue::List(vec![FilterValue::Bool(true), FilterValue::Bool(false)])
        );

        let text = FilterVariant::Integer
            .clean_value(LookupKind::In, FilterValue::text("1, 2"))
            .unwrap();
        assert_eq!(text, FilterValue::List(vec![FilterValue::Int(1), FilterValue::Int(2)]));

        let flags = FilterVariant::Boolean
            .clean_value(LookupKind::In, FilterValue::text("t,0"))
            .unwrap();
        assert_eq!(
            flags,
            FilterValue::List(vec![FilterValue::Bool(true), FilterValue::Bool(false)])
        );

        assert!(FilterVariant::Integer
            .clean_value(LookupKind::In, FilterValue::text("1,x"))
            .is_err());
        assert_eq!(
            FilterVariant::Integer
                .clean_value(LookupKind::In, FilterValue::text(""))
                .unwrap(),
            FilterValue::text("")
        );
    }

    #[test]
    fn char_is_identity() {
        let value = FilterValue::List(vec![FilterValue::Int(1)]);
        assert_eq!(
            FilterVariant::Char
                .clean_value(LookupKind::Exact, value.clone())
                .unwrap(),
            value
        );
    }

    #[test]
    fn global_table_is_published_once() {
        let first = table() as *const DispatchTable;
        let second = init(Capabilities::default()) as *const DispatchTable;
        assert_eq!(first, second);
    }
}
