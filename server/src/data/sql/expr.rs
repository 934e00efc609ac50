//! Predicate expression tree
//!
//! Filters produce [`Predicate`] values. A predicate is backend-neutral: it is
//! rendered to SQL by a [`SqlDialect`](super::SqlDialect) or evaluated in
//! memory against JSON rows.

use std::fmt;
use std::ops::Not;

use crate::data::filters::{FilterValue, Geometry};

/// Value expression a predicate tests
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column {
        table: Option<String>,
        name: String,
    },
    /// JSON element at `path` inside `base`, still typed as JSON
    JsonElement { base: Box<Expr>, path: Vec<String> },
    /// JSON element at `path` inside `base`, as text
    JsonText { base: Box<Expr>, path: Vec<String> },
    CastText(Box<Expr>),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    /// Compare against a value. `=`/`!=` against null become null tests.
    pub fn compare(self, op: CompareOp, value: FilterValue) -> Predicate {
        match (op, value) {
            (CompareOp::Eq, FilterValue::Null) => Predicate::IsNull(self),
            (CompareOp::Ne, FilterValue::Null) => Predicate::IsNotNull(self),
            (op, value) => Predicate::Compare {
                expr: self,
                op,
                value,
            },
        }
    }

    pub fn eq(self, value: FilterValue) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: FilterValue) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    pub fn in_list(self, values: Vec<FilterValue>) -> Predicate {
        Predicate::In { expr: self, values }
    }

    pub fn ilike(self, pattern: impl Into<String>) -> Predicate {
        Predicate::ILike {
            expr: self,
            pattern: pattern.into(),
        }
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull(self)
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::IsNotNull(self)
    }

    pub fn covered_by(self, geometry: Geometry) -> Predicate {
        Predicate::CoveredBy {
            expr: self,
            geometry,
        }
    }
}

/// Named binary comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Boolean condition attachable to a query
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        expr: Expr,
        op: CompareOp,
        value: FilterValue,
    },
    In {
        expr: Expr,
        values: Vec<FilterValue>,
    },
    /// Case-insensitive LIKE with `%`/`_` wildcards
    ILike {
        expr: Expr,
        pattern: String,
    },
    IsNull(Expr),
    IsNotNull(Expr),
    CoveredBy {
        expr: Expr,
        geometry: Geometry,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut items) => {
                items.push(other);
                Predicate::And(items)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut items) => {
                items.push(other);
                Predicate::Or(items)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    /// Negate the whole predicate
    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Conjunction of all predicates; `None` when there are none
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        let mut items: Vec<Predicate> = predicates.into_iter().collect();
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Predicate::And(items)),
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        self.negate()
    }
}
