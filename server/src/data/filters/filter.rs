//! Filter core
//!
//! A [`Filter`] binds one column, one lookup and an exclude flag. It is the
//! only place where a raw request value becomes a query mutation.

use tracing::{debug, trace};

use super::dispatch::{DispatchTable, FilterVariant};
use super::error::FilterError;
use super::lookups::LookupKind;
use super::normalize::normalize;
use super::registry::{LookupRegistry, Operator};
use super::value::FilterValue;
use crate::data::schema::Column;
use crate::data::sql::{Filterable, Predicate};

/// One filtered column of one request
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    column: Column,
    lookup: LookupKind,
    exclude: bool,
    variant: FilterVariant,
}

impl Filter {
    /// Create a filter without checking the lookup against the column type
    pub fn new(
        name: impl Into<String>,
        column: Column,
        lookup: LookupKind,
        exclude: bool,
        variant: FilterVariant,
    ) -> Self {
        Self {
            name: name.into(),
            column,
            lookup,
            exclude,
            variant,
        }
    }

    /// Create a filter for a column, rejecting lookups its type does not allow
    pub fn for_column(
        name: impl Into<String>,
        column: Column,
        lookup: LookupKind,
        exclude: bool,
        table: &DispatchTable,
    ) -> Result<Self, FilterError> {
        let family = column.family();
        let spec = table.resolve_spec(family);
        if !spec.allows(lookup) {
            return Err(FilterError::LookupNotAllowed {
                column: column.name.clone(),
                lookup,
                family: family.to_string(),
            });
        }
        Ok(Self::new(name, column, lookup, exclude, spec.variant))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn lookup(&self) -> LookupKind {
        self.lookup
    }

    pub fn exclude(&self) -> bool {
        self.exclude
    }

    pub fn variant(&self) -> FilterVariant {
        self.variant
    }

    /// Apply this filter to a query using the standard registry
    pub fn filter<Q: Filterable>(&self, query: Q, value: FilterValue) -> Result<Q, FilterError> {
        self.filter_with(LookupRegistry::global(), query, value)
    }

    pub fn filter_with<Q: Filterable>(
        &self,
        registry: &LookupRegistry,
        query: Q,
        value: FilterValue,
    ) -> Result<Q, FilterError> {
        Ok(match self.predicate(registry, value)? {
            Some(predicate) => query.add_predicate(predicate),
            None => query,
        })
    }

    /// Predicate this filter contributes, or `None` when the value is empty
    pub fn predicate(
        &self,
        registry: &LookupRegistry,
        value: FilterValue,
    ) -> Result<Option<Predicate>, FilterError> {
        let cleaned = self
            .variant
            .clean_value(self.lookup, value)
            .map_err(|e| FilterError::validation(&self.name, self.lookup, e))?;
        if cleaned.is_empty_value() {
            trace!(filter = %self.name, lookup = %self.lookup, "Empty value, filter skipped");
            return Ok(None);
        }

        let descriptor = registry.resolve(self.lookup)?;
        let value = normalize(descriptor, cleaned)
            .map_err(|e| FilterError::validation(&self.name, self.lookup, e))?;
        if matches!(&value, FilterValue::List(items) if items.is_empty()) {
            trace!(filter = %self.name, lookup = %self.lookup, "Empty sequence, filter skipped");
            return Ok(None);
        }

        let predicate = match descriptor.operator {
            Operator::Predicate(builder) => (builder.build)(&self.column, &value)?,
            Operator::Comparison(comparison) => comparison.apply(self.column.expr(), value),
        };
        let predicate = if self.exclude {
            predicate.negate()
        } else {
            predicate
        };

        debug!(
            filter = %self.name,
            lookup = %self.lookup,
            exclude = self.exclude,
            operator = %descriptor.operator.label(),
            "Filter predicate built"
        );
        Ok(Some(predicate))
    }
}
