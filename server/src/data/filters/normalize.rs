//! Value normalization pipeline
//!
//! pre-process -> leaf coercion -> post-process, in that order, driven by the
//! lookup's operator descriptor.

use super::error::FieldError;
use super::registry::OperatorDescriptor;
use super::value::FilterValue;

/// Shape adjustment applied before coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreProcess {
    /// Sequence -> first element (or empty string), anything else unchanged
    ScalarLowering,
    /// Sequence unchanged, text split on commas, anything else wrapped
    ArrayLifting,
}

impl PreProcess {
    pub fn apply(&self, value: FilterValue) -> FilterValue {
        match self {
            PreProcess::ScalarLowering => lower_to_scalar(value),
            PreProcess::ArrayLifting => lift_to_array(value),
        }
    }
}

/// Hook run after leaf coercion
pub type PostProcess = fn(FilterValue) -> Result<FilterValue, FieldError>;

pub fn lower_to_scalar(value: FilterValue) -> FilterValue {
    match value {
        FilterValue::List(items) => items
            .into_iter()
            .next()
            .unwrap_or_else(|| FilterValue::text("")),
        other => other,
    }
}

pub fn lift_to_array(value: FilterValue) -> FilterValue {
    match value {
        FilterValue::List(_) => value,
        FilterValue::Text(s) if s.is_empty() => FilterValue::List(Vec::new()),
        FilterValue::Text(s) => FilterValue::List(s.split(',').map(FilterValue::text).collect()),
        other => FilterValue::List(vec![other]),
    }
}

/// Run the descriptor's pipeline over a cleaned value
pub fn normalize(
    descriptor: &OperatorDescriptor,
    value: FilterValue,
) -> Result<FilterValue, FieldError> {
    let value = descriptor.pre_process.apply(value);
    let value = match descriptor.leaf {
        Some(leaf) => leaf.coerce(value)?,
        None => value,
    };
    match descriptor.post_process {
        Some(post) => post(value),
        None => Ok(value),
    }
}
