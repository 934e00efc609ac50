//! Query filter system
//!
//! Turns `column__lookup=value` request parameters into type-correct
//! predicates for tables of an introspected schema.
//!
//! The pipeline for one parameter:
//! 1. the column's type family selects a [`FilterSpec`] (variant + allowed lookups)
//! 2. the variant cleans the raw value into the column's leaf type
//! 3. empty values short-circuit; otherwise the lookup's [`OperatorDescriptor`]
//!    normalizes the value and builds the predicate
//! 4. the predicate (negated for `exclude__`) is conjoined onto the query
//!
//! ## Usage
//!
//! ```
//! use bridge_server::data::filters::{self, FilterValue, build_filters, apply_filters};
//! use bridge_server::data::schema::{Column, SqlType, TableSchema};
//! use bridge_server::data::sql::{Backend, SelectQuery};
//!
//! let table = TableSchema {
//!     name: "users".to_string(),
//!     columns: vec![Column::new("name", SqlType::Varchar)],
//! };
//! let params = vec![("name__starts_with", FilterValue::text("al"))];
//! let built = build_filters(params, &table, filters::dispatch::table(), 50).unwrap();
//! let query = apply_filters(SelectQuery::new("users"), built).unwrap();
//! let (sql, _params) = query.to_sql(Backend::Postgres.dialect());
//! assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"name\" ILIKE $1");
//! ```

pub mod dispatch;
mod error;
pub mod fields;
mod filter;
mod lookups;
mod normalize;
mod params;
mod predicates;
mod registry;
mod value;


pub use dispatch::{Capabilities, DispatchTable, FilterSpec, FilterVariant};
pub use error::{FieldError, FilterError};
pub use fields::{DEFAULT_SRID, FieldKind, LeafCoercion};
pub use filter::Filter;
pub use lookups::LookupKind;
pub use normalize::{PostProcess, PreProcess, normalize};
pub use params::{DEFAULT_MAX_FILTERS, ParamKey, apply_filters, build_filters, parse_param_key};
pub use registry::{
    BuildPredicate, Comparison, LookupRegistry, Operator, OperatorDescriptor, PredicateFn,
    RegistryBuilder,
};
pub use value::{FilterValue, Geometry};
