//! Relation resolution: descriptors, classification, join-table synthesis.
//!
//! This module decides what a relation *is*:
//! - **Def**: descriptor types (`RelationDescriptor`, `RelationKind`,
//!   `RelationSide`)
//! - **Builder**: classification of relation field pairs into descriptors
//! - **Join table**: synthesis of the hidden join table of implicit relations
//! - **Registry**: the explicitly constructed, immutable set of descriptors
//!   for one loaded schema
//!
//! The translators in `ops` and `query` consume descriptors read-only and
//! never re-derive any of this.

pub mod builder;
pub mod def;
pub mod join_table;
pub mod registry;

#[doc(inline)]
pub use builder::RelationBuilder;
#[doc(inline)]
pub use def::{ForeignKeyPair, RelationDescriptor, RelationKind, RelationSide};
#[doc(inline)]
pub use join_table::{
    canonical_order, default_relation_name, default_table_name, IndexSpec, IntrospectedTable,
    JoinColumn, JoinTableSpec, COLUMN_A, COLUMN_B,
};
#[doc(inline)]
pub use registry::SchemaRegistry;
