//! Relation descriptor types.
//!
//! A `RelationDescriptor` is the canonical description of one relation between
//! two entities, produced once at schema load and shared read-only by the
//! translators. The physical join representation is a tagged variant
//! (`RelationKind`) so each translator has a single dispatch point per call
//! instead of branching pervasively on the relation's shape.

use crate::relation::join_table::JoinTableSpec;
use crate::schema::FieldType;
use serde::{Deserialize, Serialize};

/// One participating side of a relation.
///
/// Carries everything the translators need to address the side physically:
/// the entity and its table, the relation field name declared on it, and its
/// identifier column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSide {
    /// Entity name (logical)
    pub entity: String,
    /// Physical table name
    pub table: String,
    /// Relation field name declared on this entity
    pub field: String,
    /// Identifier column name
    pub id_column: String,
    /// Identifier column type
    pub id_type: FieldType,
}

/// A foreign-key column paired with the column it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyPair {
    /// Column on the owning (many) side
    pub foreign_key: String,
    /// Referenced column on the one side
    pub references: String,
}

/// The physical join representation of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// One-to-many: side A is the "one" (referenced) side, side B the "many"
    /// side owning the foreign-key columns.
    OneToMany {
        /// Foreign-key columns on side B's table paired with the side A
        /// columns they reference
        foreign_keys: Vec<ForeignKeyPair>,
    },
    /// Many-to-many through a user-declared join entity. The join entity is an
    /// ordinary entity with its own attributes; `fk_a`/`fk_b` are its scalar
    /// columns referencing side A / side B identifiers.
    ManyToManyExplicit {
        /// Join entity name
        join_entity: String,
        /// Join entity's physical table
        join_table: String,
        /// Foreign-key column referencing side A's identifier
        fk_a: String,
        /// Foreign-key column referencing side B's identifier
        fk_b: String,
    },
    /// Many-to-many through a system-managed join table invisible to the
    /// logical schema.
    ManyToManyImplicit {
        /// Synthesized physical representation
        join_table: JoinTableSpec,
    },
}

impl RelationKind {
    /// Short tag for log lines and error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::OneToMany { .. } => "one-to-many",
            Self::ManyToManyExplicit { .. } => "many-to-many (explicit)",
            Self::ManyToManyImplicit { .. } => "many-to-many (implicit)",
        }
    }
}

/// Canonical description of one relation between two entities.
///
/// Built once when entity definitions are loaded, immutable thereafter, and
/// rebuilt wholesale if the definitions change. For the many-to-many kinds,
/// `side_a`/`side_b` are stored in canonical (ordinal lexical) order of entity
/// name regardless of which side's field was declared first in source order;
/// for one-to-many, `side_a` is the referenced side and `side_b` owns the
/// foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation name: the disambiguating name when the schema supplies one,
    /// else `<NameA>To<NameB>` in canonical order
    pub name: String,
    pub side_a: RelationSide,
    pub side_b: RelationSide,
    pub kind: RelationKind,
}

impl RelationDescriptor {
    /// Resolve the given entity name to `(source side, other side)`.
    ///
    /// Returns `None` when the entity participates in neither side. Both
    /// sides naming the same entity (a self-relation) is rejected at build
    /// time, so resolution here is unambiguous.
    pub fn sides_from(&self, entity: &str) -> Option<(&RelationSide, &RelationSide)> {
        if self.side_a.entity == entity {
            Some((&self.side_a, &self.side_b))
        } else if self.side_b.entity == entity {
            Some((&self.side_b, &self.side_a))
        } else {
            None
        }
    }

    /// Whether the relation is to-many when viewed from the given entity.
    ///
    /// Many-to-many relations are to-many from both sides; a one-to-many is
    /// to-many only from the referenced ("one") side.
    pub fn is_to_many_from(&self, entity: &str) -> bool {
        match &self.kind {
            RelationKind::OneToMany { .. } => self.side_a.entity == entity,
            RelationKind::ManyToManyExplicit { .. } | RelationKind::ManyToManyImplicit { .. } => {
                self.side_a.entity == entity || self.side_b.entity == entity
            }
        }
    }

    /// The synthesized join table, for implicit relations.
    pub fn join_table_spec(&self) -> Option<&JoinTableSpec> {
        match &self.kind {
            RelationKind::ManyToManyImplicit { join_table } => Some(join_table),
            _ => None,
        }
    }
}
