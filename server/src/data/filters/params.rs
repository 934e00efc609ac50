//! Filter parameter parsing
//!
//! Turns request parameters of the form `column__lookup=value` (optionally
//! prefixed with `exclude__`) into validated filters for one table.

use super::dispatch::DispatchTable;
use super::error::FilterError;
use super::filter::Filter;
use super::lookups::LookupKind;
use super::value::FilterValue;
use crate::data::schema::TableSchema;
use crate::data::sql::Filterable;

/// Default maximum number of filters per request
pub const DEFAULT_MAX_FILTERS: usize = 50;

const EXCLUDE_PREFIX: &str = "exclude__";
const LOOKUP_SEPARATOR: &str = "__";

/// Parsed parameter key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    pub column: String,
    pub lookup: LookupKind,
    pub exclude: bool,
}

/// Split a parameter key into column, lookup and exclude flag.
///
/// A trailing `__token` is a lookup when the token is a known lookup, or when
/// the part before it names a column of the table (then an unknown token is an
/// error). Otherwise the whole key is taken as the column name.
pub fn parse_param_key(key: &str, table: &TableSchema) -> Result<ParamKey, FilterError> {
    if table.column(key).is_some() {
        return Ok(ParamKey {
            column: key.to_string(),
            lookup: LookupKind::DEFAULT,
            exclude: false,
        });
    }

    let (exclude, rest) = match key.strip_prefix(EXCLUDE_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, key),
    };

    if let Some((column, token)) = rest.rsplit_once(LOOKUP_SEPARATOR) {
        match token.parse::<LookupKind>() {
            Ok(lookup) => {
                return Ok(ParamKey {
                    column: column.to_string(),
                    lookup,
                    exclude,
                });
            }
            Err(err) if table.column(column).is_some() => return Err(err),
            Err(_) => {}
        }
    }

    Ok(ParamKey {
        column: rest.to_string(),
        lookup: LookupKind::DEFAULT,
        exclude,
    })
}

/// Build filters for every parameter that names a column of the table.
///
/// Parameters that name no column are left for other consumers (paging,
/// ordering) and skipped.
pub fn build_filters<I, K, V>(
    params: I,
    table: &TableSchema,
    dispatch: &DispatchTable,
    max_filters: usize,
) -> Result<Vec<(Filter, FilterValue)>, FilterError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<FilterValue>,
{
    let mut filters = Vec::new();
    for (key, value) in params {
        let key = key.as_ref();
        let parsed = parse_param_key(key, table)?;
        let Some(column) = table.column(&parsed.column) else {
            tracing::trace!(param = %key, table = %table.name, "Not a column, skipping");
            continue;
        };
        let filter = Filter::for_column(
            parsed.column.clone(),
            column.clone(),
            parsed.lookup,
            parsed.exclude,
            dispatch,
        )?;
        filters.push((filter, value.into()));
    }

    if filters.len() > max_filters {
        return Err(FilterError::TooManyFilters {
            max: max_filters,
            count: filters.len(),
        });
    }

    tracing::debug!(table = %table.name, count = filters.len(), "Filters built");
    Ok(filters)
}

/// Apply every filter to the query in order
pub fn apply_filters<Q: Filterable>(
    query: Q,
    filters: Vec<(Filter, FilterValue)>,
) -> Result<Q, FilterError> {
    filters
        .into_iter()
        .try_fold(query, |query, (filter, value)| filter.filter(query, value))
}
