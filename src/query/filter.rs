//! Relation filter input: quantifier plus sub-predicates.

use sea_query::{Condition, IntoCondition};

/// The existential/universal condition applied when filtering by a to-many
/// relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// At least one related row matches.
    Some,
    /// No related row fails the predicate. Vacuously true when zero related
    /// rows exist.
    Every,
    /// Zero related rows match.
    None,
}

/// A filter predicate attached to a relation field.
///
/// `related` is a condition over the related entity's table (column
/// references qualified by its table name). `join_attrs` is a condition over
/// the join entity's own attributes and is only meaningful for explicit
/// relations; both conditions must hold on the same join row.
#[derive(Debug, Clone)]
pub struct RelationFilter {
    pub quantifier: Quantifier,
    pub related: Condition,
    pub join_attrs: Option<Condition>,
}

impl RelationFilter {
    pub fn new(quantifier: Quantifier, related: impl IntoCondition) -> Self {
        Self {
            quantifier,
            related: related.into_condition(),
            join_attrs: None,
        }
    }

    /// `some`: at least one related row matches.
    pub fn some(related: impl IntoCondition) -> Self {
        Self::new(Quantifier::Some, related)
    }

    /// `every`: no related row fails the predicate.
    pub fn every(related: impl IntoCondition) -> Self {
        Self::new(Quantifier::Every, related)
    }

    /// `none`: zero related rows match.
    pub fn none(related: impl IntoCondition) -> Self {
        Self::new(Quantifier::None, related)
    }

    /// Attach a join-attribute sub-predicate (explicit relations only).
    pub fn with_join_attrs(mut self, join_attrs: impl IntoCondition) -> Self {
        self.join_attrs = Some(join_attrs.into_condition());
        self
    }
}
