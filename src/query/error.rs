//! Request-scoped errors of the filter-translation path.

/// Errors from translating a relation filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The filtering entity participates in neither side of the relation.
    UnknownSide { entity: String, relation: String },
    /// The relation is to-one from the filtering entity; quantifiers apply to
    /// to-many relation fields.
    NotToMany { entity: String, relation: String },
    /// A join-attribute sub-predicate was supplied for a relation without a
    /// join entity.
    JoinConditionUnsupported { relation: String },
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::UnknownSide { entity, relation } => {
                write!(
                    f,
                    "Entity '{}' is not a side of relation '{}'",
                    entity, relation
                )
            }
            FilterError::NotToMany { entity, relation } => {
                write!(
                    f,
                    "Relation '{}' is to-one from entity '{}'; quantified filters apply to \
                     to-many relation fields",
                    relation, entity
                )
            }
            FilterError::JoinConditionUnsupported { relation } => {
                write!(
                    f,
                    "Relation '{}' has no join entity; join-attribute predicates cannot be \
                     translated",
                    relation
                )
            }
        }
    }
}

impl std::error::Error for FilterError {}
