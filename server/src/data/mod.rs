//! Data layer
//!
//! - `schema` - Declared column types and table schemas from introspection
//! - `filters` - Request parameters to typed predicates
//! - `sql` - Predicate model, SQL rendering and in-memory evaluation

pub mod filters;
pub mod schema;
pub mod sql;
