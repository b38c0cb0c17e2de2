//! Schema-time error types.
//!
//! Every error in this module is detected statically while a schema document
//! is loaded and must abort loading; none of them are recoverable at request
//! time. Messages name the offending relation, entity, or field so the schema
//! author can fix the declaration.

/// Errors raised while validating a schema document and building relation
/// descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two entities have more than one relation field pair between them and
    /// at least one pair carries no disambiguating name.
    AmbiguousRelation {
        left: String,
        right: String,
        candidates: usize,
    },
    /// An implicit many-to-many relation requires a single-scalar identifier
    /// on both participating entities.
    InvalidIdentifier {
        entity: String,
        relation: String,
        identifier_fields: usize,
    },
    /// A join-table name override must start with `_`.
    InvalidJoinTableName { name: String, relation: String },
    /// Two entities in the schema document share a name.
    DuplicateEntity { name: String },
    /// A relation field targets an entity that is not in the schema.
    UnknownEntity { entity: String, referenced_by: String },
    /// An identifier or foreign-key declaration names a field the entity does
    /// not have.
    UnknownField { entity: String, field: String },
    /// An entity or field name does not match the required syntax.
    InvalidName { name: String, kind: &'static str },
    /// A relation field has no counterpart declaration on the target entity.
    UnpairedRelationField { entity: String, field: String },
    /// An identifier field is declared nullable or of a non-identifier type.
    InvalidIdentifierField { entity: String, field: String },
    /// The foreign-key and referenced field lists of a relation field have
    /// different lengths.
    ForeignKeyArityMismatch {
        entity: String,
        field: String,
        foreign_keys: usize,
        references: usize,
    },
    /// Both sides of a relation name the same entity.
    SelfRelationUnsupported { entity: String, field: String },
    /// A relation field pair matches none of the supported shapes.
    UnsupportedRelationShape {
        left: String,
        right: String,
        detail: &'static str,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::AmbiguousRelation {
                left,
                right,
                candidates,
            } => {
                write!(
                    f,
                    "Ambiguous relation between '{}' and '{}': {} candidate field pairs exist \
                     and at least one carries no relation name.\n\
                     Give each relation field pair a distinct relation name to disambiguate.",
                    left, right, candidates
                )
            }
            SchemaError::InvalidIdentifier {
                entity,
                relation,
                identifier_fields,
            } => {
                write!(
                    f,
                    "Entity '{}' cannot participate in the implicit many-to-many relation '{}': \
                     its identifier spans {} fields, but a single scalar identifier is required. \
                     Declare the relation through an explicit join entity instead.",
                    entity, relation, identifier_fields
                )
            }
            SchemaError::InvalidJoinTableName { name, relation } => {
                write!(
                    f,
                    "Join-table name override '{}' on relation '{}' is invalid: \
                     override names must start with '_'.",
                    name, relation
                )
            }
            SchemaError::DuplicateEntity { name } => {
                write!(f, "Duplicate entity name '{}' in schema document", name)
            }
            SchemaError::UnknownEntity {
                entity,
                referenced_by,
            } => {
                write!(
                    f,
                    "Relation field '{}' targets unknown entity '{}'",
                    referenced_by, entity
                )
            }
            SchemaError::UnknownField { entity, field } => {
                write!(f, "Entity '{}' has no scalar field '{}'", entity, field)
            }
            SchemaError::InvalidName { name, kind } => {
                write!(
                    f,
                    "Invalid {} name '{}': names must start with a letter and contain only \
                     letters, digits and underscores",
                    kind, name
                )
            }
            SchemaError::UnpairedRelationField { entity, field } => {
                write!(
                    f,
                    "Relation field '{}.{}' has no counterpart declaration on the target entity",
                    entity, field
                )
            }
            SchemaError::InvalidIdentifierField { entity, field } => {
                write!(
                    f,
                    "Identifier field '{}.{}' must be non-nullable and of an identifier-capable type",
                    entity, field
                )
            }
            SchemaError::ForeignKeyArityMismatch {
                entity,
                field,
                foreign_keys,
                references,
            } => {
                write!(
                    f,
                    "Relation field '{}.{}' declares {} foreign-key field(s) but {} referenced \
                     field(s); the lists must match",
                    entity, field, foreign_keys, references
                )
            }
            SchemaError::SelfRelationUnsupported { entity, field } => {
                write!(
                    f,
                    "Relation field '{}.{}' relates the entity to itself; self-relations are \
                     not supported",
                    entity, field
                )
            }
            SchemaError::UnsupportedRelationShape { left, right, detail } => {
                write!(
                    f,
                    "Relation between '{}' and '{}' matches no supported shape: {}",
                    left, right, detail
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}
