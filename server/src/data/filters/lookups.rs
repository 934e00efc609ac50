//! Lookup vocabulary
//!
//! The closed set of lookups a client can request for a filtered column.
//! Tokens are the wire representation used in filter parameters
//! (`price__gte=10`, `name__icontains=bob`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Lookup requested for a filtered column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Exact,
    Gt,
    Gte,
    Lt,
    Lte,
    Icontains,
    In,
    StartsWith,
    EndsWith,
    IsNull,
    IsEmpty,
    JsonIcontains,
    #[serde(rename = "coveredby")]
    CoveredBy,
}

impl LookupKind {
    /// Lookup used when a parameter carries no `__lookup` suffix
    pub const DEFAULT: LookupKind = LookupKind::Exact;

    pub const ALL: [LookupKind; 13] = [
        LookupKind::Exact,
        LookupKind::Gt,
        LookupKind::Gte,
        LookupKind::Lt,
        LookupKind::Lte,
        LookupKind::Icontains,
        LookupKind::In,
        LookupKind::StartsWith,
        LookupKind::EndsWith,
        LookupKind::IsNull,
        LookupKind::IsEmpty,
        LookupKind::JsonIcontains,
        LookupKind::CoveredBy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Exact => "exact",
            LookupKind::Gt => "gt",
            LookupKind::Gte => "gte",
            LookupKind::Lt => "lt",
            LookupKind::Lte => "lte",
            LookupKind::Icontains => "icontains",
            LookupKind::In => "in",
            LookupKind::StartsWith => "starts_with",
            LookupKind::EndsWith => "ends_with",
            LookupKind::IsNull => "is_null",
            LookupKind::IsEmpty => "is_empty",
            LookupKind::JsonIcontains => "json_icontains",
            LookupKind::CoveredBy => "coveredby",
        }
    }

    /// Whether the operand of this lookup is a value of the column's own type.
    ///
    /// Pattern lookups take text and the null/empty checks take a flag, so
    /// those skip the per-type cleaning of the filter variant.
    pub fn takes_column_value(&self) -> bool {
        matches!(
            self,
            LookupKind::Exact
                | LookupKind::Gt
                | LookupKind::Gte
                | LookupKind::Lt
                | LookupKind::Lte
                | LookupKind::In
                | LookupKind::CoveredBy
        )
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookupKind::ALL
            .into_iter()
            .find(|lookup| lookup.as_str() == s)
            .ok_or_else(|| FilterError::UnknownLookup(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_from_str() {
        for lookup in LookupKind::ALL {
            assert_eq!(lookup.as_str().parse::<LookupKind>().unwrap(), lookup);
        }
    }

    #[test]
    fn serde_uses_wire_tokens() {
        assert_eq!(
            serde_json::to_string(&LookupKind::IsNull).unwrap(),
            r#""is_null""#
        );
        assert_eq!(
            serde_json::to_string(&LookupKind::CoveredBy).unwrap(),
            r#""coveredby""#
        );
        let parsed: LookupKind = serde_json::from_str(r#""starts_with""#).unwrap();
        assert_eq!(parsed, LookupKind::StartsWith);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "contains".parse::<LookupKind>().unwrap_err();
        assert!(matches!(err, FilterError::UnknownLookup(ref t) if t == "contains"));
    }

    #[test]
    fn default_lookup_is_exact() {
        assert_eq!(LookupKind::DEFAULT, LookupKind::Exact);
    }
}
