//! Relation descriptor builder.
//!
//! Classifies a pair of relation field declarations into a canonical
//! [`RelationDescriptor`]: a foreign-key-backed pair is a one-to-many, mutual
//! list fields routed through a user-declared join entity are an explicit
//! many-to-many, and mutual list fields with no foreign keys and no join
//! entity are an implicit many-to-many whose physical join table gets
//! synthesized here. Pure functions over the schema document; all failures
//! are schema-time errors.

use crate::relation::def::{ForeignKeyPair, RelationDescriptor, RelationKind, RelationSide};
use crate::relation::join_table::{default_relation_name, JoinTableSpec};
use crate::schema::{EntityDef, RelationArity, RelationFieldDef, SchemaDef, SchemaError};

/// Builds relation descriptors against a schema document.
///
/// Borrow-only: the builder holds a reference to the schema and produces
/// owned, immutable descriptors.
pub struct RelationBuilder<'a> {
    schema: &'a SchemaDef,
}

impl<'a> RelationBuilder<'a> {
    pub fn new(schema: &'a SchemaDef) -> Self {
        Self { schema }
    }

    /// Build the descriptor for the relation expressed by `field_a` on
    /// `entity_a` and `field_b` on `entity_b`.
    ///
    /// Classification rules:
    /// - one side carries a foreign-key scalar list targeting the other:
    ///   one-to-many, the foreign-key owner being the "many" side;
    /// - both fields are lists targeting a common third entity that itself
    ///   declares foreign-key-backed fields to each of the two: explicit
    ///   many-to-many through that join entity;
    /// - both fields are lists targeting each other with no foreign keys:
    ///   implicit many-to-many (single-scalar identifiers required).
    pub fn build(
        &self,
        entity_a: &str,
        field_a: &str,
        entity_b: &str,
        field_b: &str,
    ) -> Result<RelationDescriptor, SchemaError> {
        let left = self.resolve(entity_a, field_a)?;
        let right = self.resolve(entity_b, field_b)?;

        if entity_a == entity_b {
            return Err(SchemaError::SelfRelationUnsupported {
                entity: entity_a.to_string(),
                field: field_a.to_string(),
            });
        }

        // A pair carrying two different relation names is two different
        // relations; pairing them is an authoring defect.
        if let (Some(a), Some(b)) = (&left.1.relation_name, &right.1.relation_name) {
            if a != b {
                return Err(SchemaError::UnpairedRelationField {
                    entity: entity_a.to_string(),
                    field: field_a.to_string(),
                });
            }
        }

        if left.1.target == entity_b && right.1.target == entity_a {
            return self.build_direct(left, right);
        }
        if left.1.target == right.1.target {
            return self.build_explicit(left, right);
        }
        Err(SchemaError::UnpairedRelationField {
            entity: entity_a.to_string(),
            field: field_a.to_string(),
        })
    }

    fn resolve(
        &self,
        entity: &str,
        field: &str,
    ) -> Result<(&'a EntityDef, &'a RelationFieldDef), SchemaError> {
        let entity_def = self
            .schema
            .entity(entity)
            .ok_or_else(|| SchemaError::UnknownEntity {
                entity: entity.to_string(),
                referenced_by: format!("{}.{}", entity, field),
            })?;
        let relation = entity_def
            .relation(field)
            .ok_or_else(|| SchemaError::UnknownField {
                entity: entity.to_string(),
                field: field.to_string(),
            })?;
        Ok((entity_def, relation))
    }

    /// The two fields target each other directly: one-to-many or implicit.
    fn build_direct(
        &self,
        left: (&EntityDef, &RelationFieldDef),
        right: (&EntityDef, &RelationFieldDef),
    ) -> Result<RelationDescriptor, SchemaError> {
        match (left.1.is_fk_backed(), right.1.is_fk_backed()) {
            (true, true) => Err(SchemaError::UnsupportedRelationShape {
                left: left.0.name.clone(),
                right: right.0.name.clone(),
                detail: "both sides declare foreign keys; exactly one side may own the reference",
            }),
            (true, false) => self.build_one_to_many(right, left),
            (false, true) => self.build_one_to_many(left, right),
            (false, false) => self.build_implicit(left, right),
        }
    }

    /// `one` is the referenced side, `many` owns the foreign-key columns.
    fn build_one_to_many(
        &self,
        one: (&EntityDef, &RelationFieldDef),
        many: (&EntityDef, &RelationFieldDef),
    ) -> Result<RelationDescriptor, SchemaError> {
        if one.1.arity != RelationArity::Many || many.1.arity != RelationArity::One {
            return Err(SchemaError::UnsupportedRelationShape {
                left: one.0.name.clone(),
                right: many.0.name.clone(),
                detail: "a foreign-key-backed relation requires a to-one field on the owning \
                         side and a list field on the referenced side",
            });
        }

        let references: Vec<String> = if many.1.references.is_empty() {
            one.0.identifier.fields.clone()
        } else {
            many.1.references.clone()
        };
        let foreign_keys = many
            .1
            .foreign_keys
            .iter()
            .zip(references)
            .map(|(fk, reference)| ForeignKeyPair {
                foreign_key: fk.clone(),
                references: reference,
            })
            .collect();

        let name = relation_name(one.1, many.1, &one.0.name, &many.0.name);
        Ok(RelationDescriptor {
            name,
            side_a: side_of(one.0, one.1)?,
            side_b: side_of(many.0, many.1)?,
            kind: RelationKind::OneToMany { foreign_keys },
        })
    }

    /// Both fields are lists targeting each other with no foreign keys.
    fn build_implicit(
        &self,
        left: (&EntityDef, &RelationFieldDef),
        right: (&EntityDef, &RelationFieldDef),
    ) -> Result<RelationDescriptor, SchemaError> {
        if left.1.arity != RelationArity::Many || right.1.arity != RelationArity::Many {
            return Err(SchemaError::UnsupportedRelationShape {
                left: left.0.name.clone(),
                right: right.0.name.clone(),
                detail: "an implicit many-to-many requires list fields on both sides",
            });
        }

        let relation = relation_name(left.1, right.1, &left.0.name, &right.0.name);
        for (entity, _) in [left, right] {
            if !entity.identifier.is_single() {
                return Err(SchemaError::InvalidIdentifier {
                    entity: entity.name.clone(),
                    relation: relation.clone(),
                    identifier_fields: entity.identifier.fields.len(),
                });
            }
        }

        // Canonical ordering of the sides, independent of declaration order.
        let (first, second) = if left.0.name <= right.0.name {
            (left, right)
        } else {
            (right, left)
        };
        let side_a = side_of(first.0, first.1)?;
        let side_b = side_of(second.0, second.1)?;

        // A supplied relation name doubles as the join-table override and must
        // carry the `_` prefix; the synthesizer validates it.
        let override_name = left
            .1
            .relation_name
            .as_deref()
            .or(right.1.relation_name.as_deref());
        let join_table = JoinTableSpec::synthesize(&side_a, &side_b, override_name)?;

        Ok(RelationDescriptor {
            name: relation,
            side_a,
            side_b,
            kind: RelationKind::ManyToManyImplicit { join_table },
        })
    }

    /// Both fields are lists targeting a common third entity: explicit
    /// many-to-many, provided that entity is a genuine join entity.
    ///
    /// A join entity qualifies when it declares exactly one foreign-key-backed
    /// to-one field per endpoint and its identifier is composite over those
    /// foreign-key columns (the layout that enforces the no-duplicate-pairing
    /// invariant). An entity with a surrogate identifier is an ordinary
    /// related entity, not a join table.
    fn build_explicit(
        &self,
        left: (&EntityDef, &RelationFieldDef),
        right: (&EntityDef, &RelationFieldDef),
    ) -> Result<RelationDescriptor, SchemaError> {
        let join_entity =
            self.schema
                .entity(&left.1.target)
                .ok_or_else(|| SchemaError::UnknownEntity {
                    entity: left.1.target.clone(),
                    referenced_by: format!("{}.{}", left.0.name, left.1.name),
                })?;

        if left.1.arity != RelationArity::Many || right.1.arity != RelationArity::Many {
            return Err(SchemaError::UnsupportedRelationShape {
                left: left.0.name.clone(),
                right: right.0.name.clone(),
                detail: "an explicit many-to-many requires list fields to the join entity on \
                         both sides",
            });
        }

        let fk_left = self.join_leg(join_entity, &left.0.name)?;
        let fk_right = self.join_leg(join_entity, &right.0.name)?;

        let id_fields: Vec<&str> = join_entity
            .identifier
            .fields
            .iter()
            .map(String::as_str)
            .collect();
        let mut fk_columns = [fk_left.1.as_str(), fk_right.1.as_str()];
        fk_columns.sort_unstable();
        let mut id_sorted = id_fields.clone();
        id_sorted.sort_unstable();
        if id_sorted != fk_columns {
            return Err(SchemaError::UnsupportedRelationShape {
                left: left.0.name.clone(),
                right: right.0.name.clone(),
                detail: "the join entity's identifier must be composite over exactly its two \
                         foreign-key columns",
            });
        }

        // Canonical ordering, as for the implicit case.
        let ((first, first_fk), (second, second_fk)) = if left.0.name <= right.0.name {
            ((left, fk_left.1), (right, fk_right.1))
        } else {
            ((right, fk_right.1), (left, fk_left.1))
        };

        let name = left
            .1
            .relation_name
            .clone()
            .or_else(|| right.1.relation_name.clone())
            .unwrap_or_else(|| default_relation_name(&first.0.name, &second.0.name));

        Ok(RelationDescriptor {
            name,
            side_a: side_of(first.0, first.1)?,
            side_b: side_of(second.0, second.1)?,
            kind: RelationKind::ManyToManyExplicit {
                join_entity: join_entity.name.clone(),
                join_table: join_entity.table_name.clone(),
                fk_a: first_fk,
                fk_b: second_fk,
            },
        })
    }

    /// Resolve the join entity's foreign-key leg toward `endpoint`: its
    /// to-one field targeting the endpoint, and the single foreign-key column.
    fn join_leg(
        &self,
        join_entity: &EntityDef,
        endpoint: &str,
    ) -> Result<(String, String), SchemaError> {
        let mut legs = join_entity
            .relations_to(endpoint)
            .filter(|r| r.is_fk_backed() && r.arity == RelationArity::One);
        let leg = legs.next().ok_or_else(|| SchemaError::UnpairedRelationField {
            entity: join_entity.name.clone(),
            field: endpoint.to_string(),
        })?;
        if legs.next().is_some() {
            return Err(SchemaError::AmbiguousRelation {
                left: join_entity.name.clone(),
                right: endpoint.to_string(),
                candidates: 2,
            });
        }
        match leg.foreign_keys.as_slice() {
            [fk] => Ok((leg.name.clone(), fk.clone())),
            _ => Err(SchemaError::UnsupportedRelationShape {
                left: join_entity.name.clone(),
                right: endpoint.to_string(),
                detail: "a join entity leg must consist of exactly one foreign-key column",
            }),
        }
    }
}

fn side_of(entity: &EntityDef, field: &RelationFieldDef) -> Result<RelationSide, SchemaError> {
    // Translators address sides through their identifier column; a relation
    // side without a single-scalar identifier is only reachable through its
    // own foreign-key pairs, which the one-to-many kind carries explicitly.
    let (id_column, id_type) =
        entity
            .single_identifier()
            .ok_or_else(|| SchemaError::InvalidIdentifierField {
                entity: entity.name.clone(),
                field: entity.identifier.fields.join(", "),
            })?;
    Ok(RelationSide {
        entity: entity.name.clone(),
        table: entity.table_name.clone(),
        field: field.name.clone(),
        id_column: id_column.to_string(),
        id_type,
    })
}

fn relation_name(
    left: &RelationFieldDef,
    right: &RelationFieldDef,
    left_entity: &str,
    right_entity: &str,
) -> String {
    left.relation_name
        .clone()
        .or_else(|| right.relation_name.clone())
        .unwrap_or_else(|| default_relation_name(left_entity, right_entity))
}
