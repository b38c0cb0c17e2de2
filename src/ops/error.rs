//! Request-scoped errors of the nested-write path.
//!
//! Unlike schema-time errors these are surfaced to the caller of an individual
//! write request, with enough detail (entities, identifier values) to retry or
//! compensate. The engine never drops or retries them itself.

use sea_query::Value;

/// Errors from translating a nested write or attributing its outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteError {
    /// The join pairing already exists; surfaced from the storage layer's
    /// unique-index violation, never from a pre-check.
    DuplicateRelation {
        relation: String,
        table: String,
        a: Value,
        b: Value,
    },
    /// A multi-row nested write partially completed. `succeeded` holds the
    /// indices of the nested operations whose writes were all applied;
    /// `failed` the index of the operation that broke. Callers decide whether
    /// to roll back.
    PartialNestedWrite {
        relation: String,
        succeeded: Vec<usize>,
        failed: usize,
        total: usize,
        cause: String,
    },
    /// A nested create payload lacks the related entity's identifier value.
    /// The engine emits fully bound statements and cannot observe
    /// store-generated keys, so nested creates require client-supplied
    /// identifiers.
    MissingIdentifier { entity: String, column: String },
    /// Join-entity attributes were supplied for a relation that has no join
    /// entity to hold them.
    JoinAttributesUnsupported { relation: String },
    /// The write's root entity or relation field does not belong to the
    /// descriptor it was paired with.
    UnknownRelationField { entity: String, field: String },
    /// The relation is not to-many when viewed from the write's root entity.
    UnsupportedDirection { entity: String, relation: String },
    /// A one-to-many relation with composite foreign keys cannot be addressed
    /// through a single root identifier value.
    CompositeForeignKeyUnsupported { entity: String, relation: String },
    /// The reported step results do not line up with the emitted operations.
    ResultLengthMismatch { expected: usize, got: usize },
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::DuplicateRelation {
                relation,
                table,
                a,
                b,
            } => {
                write!(
                    f,
                    "Relation '{}' already links {:?} and {:?}: the unique index on '{}' \
                     rejected the pairing",
                    relation, a, b, table
                )
            }
            WriteError::PartialNestedWrite {
                relation,
                succeeded,
                failed,
                total,
                cause,
            } => {
                write!(
                    f,
                    "Nested write on relation '{}' partially completed: {} of {} operations \
                     succeeded (indices {:?}), operation {} failed: {}",
                    relation,
                    succeeded.len(),
                    total,
                    succeeded,
                    failed,
                    cause
                )
            }
            WriteError::MissingIdentifier { entity, column } => {
                write!(
                    f,
                    "Nested create for entity '{}' must supply a value for its identifier \
                     column '{}'",
                    entity, column
                )
            }
            WriteError::JoinAttributesUnsupported { relation } => {
                write!(
                    f,
                    "Relation '{}' has no join entity; join attributes cannot be written",
                    relation
                )
            }
            WriteError::UnknownRelationField { entity, field } => {
                write!(
                    f,
                    "Entity '{}' does not reach this relation through field '{}'",
                    entity, field
                )
            }
            WriteError::UnsupportedDirection { entity, relation } => {
                write!(
                    f,
                    "Relation '{}' is not to-many from entity '{}'; nested list operations do \
                     not apply",
                    relation, entity
                )
            }
            WriteError::CompositeForeignKeyUnsupported { entity, relation } => {
                write!(
                    f,
                    "Relation '{}' uses composite foreign keys on '{}'; nested writes address \
                     parents by a single identifier value",
                    relation, entity
                )
            }
            WriteError::ResultLengthMismatch { expected, got } => {
                write!(
                    f,
                    "Step result count {} does not match the {} emitted operations",
                    got, expected
                )
            }
        }
    }
}

impl std::error::Error for WriteError {}
