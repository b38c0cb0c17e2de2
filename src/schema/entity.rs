//! Entity and field definitions consumed from the schema-loading subsystem.
//!
//! These types describe the *logical* schema: named record types with typed
//! scalar fields, an identifier declaration, and relation field declarations.
//! They are plain data (serde in/out) and carry no behavior beyond lookups;
//! classification and synthesis live in the `relation` module.

use sea_query::ColumnDef;
use serde::{Deserialize, Serialize};

/// Scalar column types supported for entity fields.
///
/// Each variant maps onto a PostgreSQL column type via [`FieldType::apply_to_column`].
/// All variants except `Json` are usable as identifier types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 32-bit integer
    Int,
    /// 64-bit integer
    BigInt,
    /// Variable-length text
    Text,
    /// Boolean
    Bool,
    /// UUID
    Uuid,
    /// Timestamp with time zone
    Timestamp,
    /// JSONB document
    Json,
}

impl FieldType {
    /// Apply this field type to a sea-query column definition.
    ///
    /// Used when emitting DDL for synthesized join tables, where the `A`/`B`
    /// columns must match the referenced identifier column types exactly.
    pub fn apply_to_column(self, col: &mut ColumnDef) {
        match self {
            Self::Int => {
                col.integer();
            }
            Self::BigInt => {
                col.big_integer();
            }
            Self::Text => {
                col.text();
            }
            Self::Bool => {
                col.boolean();
            }
            Self::Uuid => {
                col.uuid();
            }
            Self::Timestamp => {
                col.timestamp_with_time_zone();
            }
            Self::Json => {
                col.json_binary();
            }
        }
    }

    /// Whether a field of this type may serve as (part of) an identifier.
    pub fn identifier_capable(self) -> bool {
        !matches!(self, Self::Json)
    }
}

/// A scalar field on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name (also the physical column name)
    pub name: String,
    /// Scalar type
    pub field_type: FieldType,
    /// Whether NULL is permitted
    #[serde(default)]
    pub nullable: bool,
}

impl FieldDef {
    /// Convenience constructor for a non-nullable field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
        }
    }
}

/// The unique identifier declaration of an entity.
///
/// One field name for a plain scalar identifier, several for a composite
/// identifier. Implicit many-to-many participation requires the single-scalar
/// form; a unique constraint elsewhere on the entity is not a substitute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierDef {
    /// Identifier field name(s), in declaration order
    pub fields: Vec<String>,
}

impl IdentifierDef {
    /// Single-field identifier.
    pub fn single(field: impl Into<String>) -> Self {
        Self {
            fields: vec![field.into()],
        }
    }

    /// Composite identifier over the given fields.
    pub fn composite<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this is a single-scalar identifier.
    pub fn is_single(&self) -> bool {
        self.fields.len() == 1
    }

    /// The lone identifier field name, if this is the single-scalar form.
    pub fn single_field(&self) -> Option<&str> {
        match self.fields.as_slice() {
            [one] => Some(one.as_str()),
            _ => None,
        }
    }
}

/// Cardinality marker on a relation field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationArity {
    /// At most one related record
    One,
    /// A list of related records
    Many,
}

/// A relation field declaration on an entity.
///
/// A relation field expresses a logical association rather than a scalar
/// value: it names the target entity, a cardinality marker, an optional
/// foreign-key scalar list (fields on the *declaring* entity that hold the
/// reference), an optional referenced-field list on the target (defaults to
/// the target's identifier), and an optional disambiguating relation name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationFieldDef {
    /// Relation field name on the declaring entity
    pub name: String,
    /// Target entity name
    pub target: String,
    /// Cardinality marker
    pub arity: RelationArity,
    /// Foreign-key scalar fields on the declaring entity, if this side owns
    /// the reference
    #[serde(default)]
    pub foreign_keys: Vec<String>,
    /// Referenced fields on the target; empty means the target's identifier
    #[serde(default)]
    pub references: Vec<String>,
    /// Disambiguating relation name. Required whenever two entities have more
    /// than one relation between them; doubles as the join-table name override
    /// for implicit relations when it starts with `_`.
    #[serde(default)]
    pub relation_name: Option<String>,
}

impl RelationFieldDef {
    /// A list-typed relation field with no foreign keys (the shape both sides
    /// of an implicit many-to-many declare).
    pub fn many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            arity: RelationArity::Many,
            foreign_keys: Vec::new(),
            references: Vec::new(),
            relation_name: None,
        }
    }

    /// A to-one relation field backed by foreign-key scalar fields on the
    /// declaring entity.
    pub fn belongs_to<I, S>(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_keys: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            target: target.into(),
            arity: RelationArity::One,
            foreign_keys: foreign_keys.into_iter().map(Into::into).collect(),
            references: Vec::new(),
            relation_name: None,
        }
    }

    /// Attach a disambiguating relation name.
    pub fn named(mut self, relation_name: impl Into<String>) -> Self {
        self.relation_name = Some(relation_name.into());
        self
    }

    /// Whether this side owns foreign-key scalar fields.
    pub fn is_fk_backed(&self) -> bool {
        !self.foreign_keys.is_empty()
    }
}

/// A named record type with typed fields, an identifier, and relation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name as written in the logical schema (casing preserved)
    pub name: String,
    /// Physical table name
    pub table_name: String,
    /// Scalar fields
    pub fields: Vec<FieldDef>,
    /// Identifier declaration
    pub identifier: IdentifierDef,
    /// Relation field declarations
    #[serde(default)]
    pub relations: Vec<RelationFieldDef>,
}

impl EntityDef {
    /// Look up a scalar field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a relation field by name.
    pub fn relation(&self, name: &str) -> Option<&RelationFieldDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// The identifier column name and type, if the identifier is single-scalar.
    pub fn single_identifier(&self) -> Option<(&str, FieldType)> {
        let field = self.identifier.single_field()?;
        self.field(field).map(|f| (f.name.as_str(), f.field_type))
    }

    /// Relation fields targeting the given entity.
    pub fn relations_to<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = &'a RelationFieldDef> + 'a {
        self.relations.iter().filter(move |r| r.target == target)
    }
}
