//! # Jointure
//!
//! Relation resolution and join-model translation engine for SQL ORMs.
//!
//! Given logical entity definitions, jointure decides what physical join
//! representation each relation has (foreign key, user-declared join entity,
//! or a synthesized hidden join table) and translates nested writes and
//! quantified relation filters into sea-query statements and predicates. It
//! performs no I/O: execution, transactions and cancellation belong to the
//! calling system.
//!
//! Typical flow: load a [`SchemaDef`] into a [`SchemaRegistry`] once at
//! startup, then hand the immutable descriptors to
//! [`translate_nested_write`] and [`translate_filter`] from any number of
//! request-handling threads.

pub mod ops;
pub mod query;
pub mod relation;
pub mod schema;

#[cfg(test)]
mod tests_cfg;

pub use ops::{
    attribute_outcome, translate_nested_write, NestedOperation, NestedWrite, StepResult, WriteError,
    WriteOp, WriteOpKind,
};
pub use query::{translate_filter, FilterError, Quantifier, RelationFilter};
pub use relation::{
    IntrospectedTable, JoinTableSpec, RelationBuilder, RelationDescriptor, RelationKind,
    SchemaRegistry,
};
pub use schema::{
    EntityDef, FieldDef, FieldType, IdentifierDef, RelationArity, RelationFieldDef, SchemaDef,
    SchemaError,
};
