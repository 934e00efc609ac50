//! Filter error types

use thiserror::Error;

use super::lookups::LookupKind;

/// Error raised while turning a filter parameter into a predicate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Lookup token is not part of the vocabulary
    #[error("Unknown lookup: {0}")]
    UnknownLookup(String),

    /// Lookup exists but the column's type family does not accept it
    #[error("Lookup '{lookup}' is not allowed for column '{column}' ({family})")]
    LookupNotAllowed {
        column: String,
        lookup: LookupKind,
        family: String,
    },

    /// Value could not be coerced to the type the lookup needs
    #[error("Invalid value for '{field}__{lookup}': {message}")]
    Validation {
        field: String,
        lookup: LookupKind,
        message: String,
    },

    /// Column type unresolved or a required capability is disabled
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// More filter parameters than the configured limit
    #[error("Maximum {max} filters allowed, got {count}")]
    TooManyFilters { max: usize, count: usize },
}

impl FilterError {
    pub fn validation(field: &str, lookup: LookupKind, error: FieldError) -> Self {
        Self::Validation {
            field: field.to_string(),
            lookup,
            message: error.0,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownLookup(_) => "UNKNOWN_LOOKUP",
            Self::LookupNotAllowed { .. } => "LOOKUP_NOT_ALLOWED",
            Self::Validation { .. } => "INVALID_FILTER_VALUE",
            Self::Configuration(_) => "FILTER_CONFIGURATION",
            Self::TooManyFilters { .. } => "TOO_MANY_FILTERS",
        }
    }

    /// Whether the caller caused the error (bad request) rather than the deployment
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}

/// Coercion failure of a single value, before field/lookup context is known
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FieldError(pub String);

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
