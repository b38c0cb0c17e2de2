//! Logical schema definitions and schema-time validation.
//!
//! This module is the boundary with the (external) schema-loading subsystem:
//! - **Entity**: entity, field, identifier and relation-field declarations
//! - **Document**: the `SchemaDef` interchange document and its validation pass
//! - **Error**: schema-time errors, all of which abort loading

pub mod document;
pub mod entity;
pub mod error;

#[doc(inline)]
pub use document::SchemaDef;
#[doc(inline)]
pub use entity::{EntityDef, FieldDef, FieldType, IdentifierDef, RelationArity, RelationFieldDef};
#[doc(inline)]
pub use error::SchemaError;
