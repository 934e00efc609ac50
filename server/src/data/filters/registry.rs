//! Lookup registry
//!
//! Maps each lookup to the descriptor that says how a normalized value turns
//! into a predicate. The standard registry is built once and shared; custom
//! registries (extra post-processing) go through [`RegistryBuilder`].

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::error::FilterError;
use super::fields::{FieldKind, LeafCoercion};
use super::lookups::LookupKind;
use super::normalize::{PostProcess, PreProcess};
use super::predicates;
use super::value::FilterValue;
use crate::data::schema::Column;
use crate::data::sql::{CompareOp, Expr, Predicate};

static STANDARD: LazyLock<LookupRegistry> = LazyLock::new(LookupRegistry::standard);

/// Builds a predicate for a column from a normalized value
pub type BuildPredicate = fn(&Column, &FilterValue) -> Result<Predicate, FilterError>;

/// Named predicate builder
#[derive(Clone, Copy)]
pub struct PredicateFn {
    pub name: &'static str,
    pub build: BuildPredicate,
}

impl fmt::Debug for PredicateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PredicateFn({})", self.name)
    }
}

/// Column comparison applied directly to the operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Named(CompareOp),
    /// `=` for a single element, `IN` for anything else
    Membership,
}

impl Comparison {
    pub fn apply(&self, expr: Expr, value: FilterValue) -> Predicate {
        match self {
            Comparison::Named(op) => expr.compare(*op, value),
            Comparison::Membership => match value {
                FilterValue::List(mut items) if items.len() == 1 => {
                    expr.eq(items.pop().unwrap_or(FilterValue::Null))
                }
                FilterValue::List(items) => expr.in_list(items),
                scalar => expr.eq(scalar),
            },
        }
    }
}

/// Exactly one of a comparison or a predicate builder
#[derive(Debug, Clone, Copy)]
pub enum Operator {
    Comparison(Comparison),
    Predicate(PredicateFn),
}

impl Operator {
    /// Short label used in listings
    pub fn label(&self) -> String {
        match self {
            Operator::Comparison(Comparison::Named(op)) => op.as_sql().to_string(),
            Operator::Comparison(Comparison::Membership) => "IN".to_string(),
            Operator::Predicate(p) => p.name.to_string(),
        }
    }
}

/// How one lookup normalizes its value and builds its predicate
#[derive(Debug, Clone, Copy)]
pub struct OperatorDescriptor {
    pub operator: Operator,
    pub pre_process: PreProcess,
    pub leaf: Option<LeafCoercion>,
    pub post_process: Option<PostProcess>,
}

impl OperatorDescriptor {
    const fn comparison(op: CompareOp) -> Self {
        Self {
            operator: Operator::Comparison(Comparison::Named(op)),
            pre_process: PreProcess::ScalarLowering,
            leaf: None,
            post_process: None,
        }
    }

    const fn predicate(name: &'static str, build: BuildPredicate) -> Self {
        Self {
            operator: Operator::Predicate(PredicateFn { name, build }),
            pre_process: PreProcess::ScalarLowering,
            leaf: None,
            post_process: None,
        }
    }

    const fn with_leaf(mut self, leaf: LeafCoercion) -> Self {
        self.leaf = Some(leaf);
        self
    }
}

fn standard_descriptor(lookup: LookupKind) -> OperatorDescriptor {
    match lookup {
        LookupKind::Exact => OperatorDescriptor::comparison(CompareOp::Eq),
        LookupKind::Gt => OperatorDescriptor::comparison(CompareOp::Gt),
        LookupKind::Gte => OperatorDescriptor::comparison(CompareOp::Gte),
        LookupKind::Lt => OperatorDescriptor::comparison(CompareOp::Lt),
        LookupKind::Lte => OperatorDescriptor::comparison(CompareOp::Lte),
        LookupKind::Icontains => OperatorDescriptor::predicate("icontains", predicates::icontains),
        LookupKind::In => OperatorDescriptor {
            operator: Operator::Comparison(Comparison::Membership),
            pre_process: PreProcess::ArrayLifting,
            leaf: Some(LeafCoercion::many(FieldKind::Char)),
            post_process: None,
        },
        LookupKind::StartsWith => {
            OperatorDescriptor::predicate("startswith", predicates::startswith)
        }
        LookupKind::EndsWith => OperatorDescriptor::predicate("endswith", predicates::endswith),
        LookupKind::IsNull => OperatorDescriptor::predicate("is_null", predicates::is_null)
            .with_leaf(LeafCoercion::one(FieldKind::Boolean)),
        LookupKind::IsEmpty => OperatorDescriptor::predicate("is_empty", predicates::is_empty)
            .with_leaf(LeafCoercion::one(FieldKind::Boolean)),
        LookupKind::JsonIcontains => {
            OperatorDescriptor::predicate("json_icontains", predicates::json_icontains)
        }
        LookupKind::CoveredBy => OperatorDescriptor::predicate("coveredby", predicates::coveredby),
    }
}

/// Immutable map from lookup to descriptor
#[derive(Debug, Clone)]
pub struct LookupRegistry {
    entries: HashMap<LookupKind, OperatorDescriptor>,
}

impl LookupRegistry {
    /// Registry with every lookup and no post-processing
    pub fn standard() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            entries: LookupKind::ALL
                .iter()
                .map(|&lookup| (lookup, standard_descriptor(lookup)))
                .collect(),
        }
    }

    /// Process-wide standard registry
    pub fn global() -> &'static LookupRegistry {
        &STANDARD
    }

    pub fn resolve(&self, lookup: LookupKind) -> Result<&OperatorDescriptor, FilterError> {
        self.entries
            .get(&lookup)
            .ok_or_else(|| FilterError::UnknownLookup(lookup.to_string()))
    }

    /// Parse a wire token and resolve it in one step
    pub fn resolve_token(
        &self,
        token: &str,
    ) -> Result<(LookupKind, &OperatorDescriptor), FilterError> {
        let lookup: LookupKind = token.parse()?;
        Ok((lookup, self.resolve(lookup)?))
    }

    /// Registered lookups in declaration order
    pub fn lookups(&self) -> Vec<LookupKind> {
        let mut lookups: Vec<LookupKind> = self.entries.keys().copied().collect();
        lookups.sort();
        lookups
    }
}

/// Mutable stage of a registry; consumed by [`RegistryBuilder::build`]
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    entries: HashMap<LookupKind, OperatorDescriptor>,
}

impl RegistryBuilder {
    pub fn with_post_process(mut self, lookup: LookupKind, post: PostProcess) -> Self {
        if let Some(descriptor) = self.entries.get_mut(&lookup) {
            descriptor.post_process = Some(post);
        }
        self
    }

    /// Drop a lookup from the registry
    pub fn without(mut self, lookup: LookupKind) -> Self {
        self.entries.remove(&lookup);
        self
    }

    pub fn build(self) -> LookupRegistry {
        LookupRegistry {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_lookup_is_registered() {
        let registry = LookupRegistry::standard();
        for lookup in LookupKind::ALL {
            assert!(registry.resolve(lookup).is_ok(), "{} missing", lookup);
        }
        assert_eq!(registry.lookups(), LookupKind::ALL.to_vec());
    }

    #[test]
    fn only_in_lifts_to_array() {
        let registry = LookupRegistry::global();
        for lookup in LookupKind::ALL {
            let expected = if lookup == LookupKind::In {
                PreProcess::ArrayLifting
            } else {
                PreProcess::ScalarLowering
            };
            assert_eq!(registry.resolve(lookup).unwrap().pre_process, expected);
        }
    }

    #[test]
    fn flag_lookups_coerce_boolean() {
        let registry = LookupRegistry::global();
        for lookup in [LookupKind::IsNull, LookupKind::IsEmpty] {
            let leaf = registry.resolve(lookup).unwrap().leaf.unwrap();
            assert_eq!(leaf, LeafCoercion::one(FieldKind::Boolean));
        }
        let leaf = registry.resolve(LookupKind::In).unwrap().leaf.unwrap();
        assert_eq!(leaf, LeafCoercion::many(FieldKind::Char));
    }

    #[test]
    fn removed_lookup_is_unknown() {
        let registry = LookupRegistry::builder().without(LookupKind::CoveredBy).build();
        let err = registry.resolve(LookupKind::CoveredBy).unwrap_err();
        assert_eq!(err, FilterError::UnknownLookup("coveredby".to_string()));
    }

    #[test]
    fn resolve_unknown_token() {
        let err = LookupRegistry::global().resolve_token("regex").unwrap_err();
        assert!(matches!(err, FilterError::UnknownLookup(token) if token == "regex"));
        let (lookup, _) = LookupRegistry::global().resolve_token("starts_with").unwrap();
        assert_eq!(lookup, LookupKind::StartsWith);
    }

    #[test]
    fn membership_picks_operator_from_value() {
        let single = Comparison::Membership.apply(
            Expr::column("a"),
            FilterValue::List(vec![FilterValue::text("x")]),
        );
        assert_eq!(single, Expr::column("a").eq(FilterValue::text("x")));

        let many = Comparison::Membership.apply(
            Expr::column("a"),
            FilterValue::List(vec![FilterValue::text("x"), FilterValue::text("y")]),
        );
        assert!(matches!(many, Predicate::In { ref values, .. } if values.len() == 2));
    }

    #[test]
    fn operator_labels() {
        let registry = LookupRegistry::global();
        assert_eq!(registry.resolve(LookupKind::Gte).unwrap().operator.label(), ">=");
        assert_eq!(registry.resolve(LookupKind::In).unwrap().operator.label(), "IN");
        assert_eq!(
            registry.resolve(LookupKind::EndsWith).unwrap().operator.label(),
            "endswith"
        );
    }
}
