//! Schema registry: the process-wide set of relation descriptors for one
//! loaded schema.
//!
//! The registry is explicitly constructed and explicitly passed, never an
//! implicit global, so multiple schemas can coexist in one process (tests do
//! exactly that). Loading validates the schema document, pairs every relation
//! field deterministically, builds all descriptors, and synthesizes the join
//! tables of implicit relations. Every failure aborts loading: schema-time
//! errors are authoring defects, not runtime conditions.

use crate::relation::builder::RelationBuilder;
use crate::relation::def::{RelationDescriptor, RelationKind};
use crate::relation::join_table::IntrospectedTable;
use crate::schema::{EntityDef, RelationArity, SchemaDef, SchemaError};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable registry of all relation descriptors for a loaded schema.
///
/// Safe to share read-only across request-handling threads; nothing in it
/// mutates after [`SchemaRegistry::load`] returns.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schema: SchemaDef,
    descriptors: Vec<RelationDescriptor>,
    by_field: BTreeMap<(String, String), usize>,
}

/// A qualified join entity: the endpoints and list fields of the explicit
/// many-to-many relation it materializes.
struct JoinEntityShape {
    endpoint_a: String,
    field_a: String,
    endpoint_b: String,
    field_b: String,
}

impl SchemaRegistry {
    /// Load a schema document: validate, pair relation fields, build every
    /// descriptor, synthesize implicit join tables.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use jointure::{SchemaDef, SchemaRegistry};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let schema = SchemaDef::from_json(r#"{ "entities": [] }"#)?;
    /// let registry = SchemaRegistry::load(schema)?;
    /// for descriptor in registry.descriptors() {
    ///     println!("{} ({})", descriptor.name, descriptor.kind.tag());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(schema: SchemaDef) -> Result<Self, SchemaError> {
        schema.validate()?;

        let builder = RelationBuilder::new(&schema);
        let join_entities = Self::join_entity_shapes(&schema);

        // Pairs between a qualified join entity and its endpoints are the
        // legs of the derived explicit relation; they are paired and
        // validated, but not materialized as standalone descriptors.
        let mut leg_pairs: BTreeSet<(String, String)> = BTreeSet::new();
        for (join_name, shape) in &join_entities {
            for endpoint in [&shape.endpoint_a, &shape.endpoint_b] {
                let (first, second) = if endpoint.as_str() <= join_name.as_str() {
                    (endpoint.clone(), join_name.clone())
                } else {
                    (join_name.clone(), endpoint.clone())
                };
                leg_pairs.insert((first, second));
            }
        }

        let mut descriptors: Vec<RelationDescriptor> = Vec::new();
        let mut by_field: BTreeMap<(String, String), usize> = BTreeMap::new();
        let mut paired: BTreeSet<(String, String)> = BTreeSet::new();

        // Deterministic pair enumeration: entity names in ordinal order.
        let mut names: Vec<&str> = schema.entities.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();

        for (i, left_name) in names.iter().enumerate() {
            for right_name in &names[i + 1..] {
                let left = schema.entity(left_name).expect("validated entity");
                let right = schema.entity(right_name).expect("validated entity");
                for (field_l, field_r) in Self::match_pairs(left, right)? {
                    paired.insert((left_name.to_string(), field_l.clone()));
                    paired.insert((right_name.to_string(), field_r.clone()));
                    if leg_pairs.contains(&(left_name.to_string(), right_name.to_string())) {
                        continue;
                    }
                    let descriptor = builder.build(left_name, &field_l, right_name, &field_r)?;
                    log::debug!(
                        "paired relation '{}' ({}): {}.{} <-> {}.{}",
                        descriptor.name,
                        descriptor.kind.tag(),
                        left_name,
                        field_l,
                        right_name,
                        field_r
                    );
                    let index = descriptors.len();
                    descriptors.push(descriptor);
                    by_field.insert((left_name.to_string(), field_l), index);
                    by_field.insert((right_name.to_string(), field_r), index);
                }
            }
        }

        // Derive the logical explicit many-to-many descriptor carried by each
        // qualified join entity; it owns the endpoint list fields its legs
        // were paired through.
        for (join_name, shape) in &join_entities {
            let descriptor = builder.build(
                &shape.endpoint_a,
                &shape.field_a,
                &shape.endpoint_b,
                &shape.field_b,
            )?;
            log::debug!(
                "derived explicit many-to-many '{}' through join entity '{}'",
                descriptor.name,
                join_name
            );
            let index = descriptors.len();
            descriptors.push(descriptor);
            by_field.insert((shape.endpoint_a.clone(), shape.field_a.clone()), index);
            by_field.insert((shape.endpoint_b.clone(), shape.field_b.clone()), index);
        }

        // Every declared relation field must have ended up in a pair.
        for entity in &schema.entities {
            for relation in &entity.relations {
                let key = (entity.name.clone(), relation.name.clone());
                if !paired.contains(&key) {
                    return Err(SchemaError::UnpairedRelationField {
                        entity: entity.name.clone(),
                        field: relation.name.clone(),
                    });
                }
            }
        }

        let (mut implicit, mut explicit, mut one_to_many) = (0, 0, 0);
        for descriptor in &descriptors {
            match descriptor.kind {
                RelationKind::OneToMany { .. } => one_to_many += 1,
                RelationKind::ManyToManyExplicit { .. } => explicit += 1,
                RelationKind::ManyToManyImplicit { .. } => implicit += 1,
            }
        }
        log::info!(
            "schema loaded: {} entities, {} relations ({} one-to-many, {} explicit, {} implicit)",
            schema.entities.len(),
            descriptors.len(),
            one_to_many,
            explicit,
            implicit
        );

        Ok(Self {
            schema,
            descriptors,
            by_field,
        })
    }

    /// Pair `left`'s relation fields targeting `right` with `right`'s fields
    /// targeting `left`.
    ///
    /// Fields carrying the same relation name pair with each other; unnamed
    /// fields pair only when exactly one candidate remains on each side. More
    /// than one field pair between two entities requires a name on each pair.
    fn match_pairs(
        left: &EntityDef,
        right: &EntityDef,
    ) -> Result<Vec<(String, String)>, SchemaError> {
        let lefts: Vec<_> = left.relations_to(&right.name).collect();
        let rights: Vec<_> = right.relations_to(&left.name).collect();
        if lefts.is_empty() && rights.is_empty() {
            return Ok(Vec::new());
        }

        let mut pairs = Vec::new();
        let mut named: BTreeMap<&str, (Vec<&str>, Vec<&str>)> = BTreeMap::new();
        let mut unnamed_left: Vec<&str> = Vec::new();
        let mut unnamed_right: Vec<&str> = Vec::new();

        for field in &lefts {
            match &field.relation_name {
                Some(name) => named.entry(name.as_str()).or_default().0.push(&field.name),
                None => unnamed_left.push(&field.name),
            }
        }
        for field in &rights {
            match &field.relation_name {
                Some(name) => named.entry(name.as_str()).or_default().1.push(&field.name),
                None => unnamed_right.push(&field.name),
            }
        }

        for (ls, rs) in named.values() {
            match (ls.as_slice(), rs.as_slice()) {
                ([l], [r]) => pairs.push((l.to_string(), r.to_string())),
                ([l], []) => {
                    return Err(SchemaError::UnpairedRelationField {
                        entity: left.name.clone(),
                        field: l.to_string(),
                    });
                }
                ([], [r]) => {
                    return Err(SchemaError::UnpairedRelationField {
                        entity: right.name.clone(),
                        field: r.to_string(),
                    });
                }
                _ => {
                    return Err(SchemaError::AmbiguousRelation {
                        left: left.name.clone(),
                        right: right.name.clone(),
                        candidates: ls.len().max(rs.len()),
                    });
                }
            }
        }

        let unnamed_pairs = unnamed_left.len().max(unnamed_right.len());
        if unnamed_pairs > 1 || (unnamed_pairs == 1 && !pairs.is_empty()) {
            return Err(SchemaError::AmbiguousRelation {
                left: left.name.clone(),
                right: right.name.clone(),
                candidates: pairs.len() + unnamed_pairs,
            });
        }
        match (unnamed_left.as_slice(), unnamed_right.as_slice()) {
            ([], []) => {}
            ([l], [r]) => pairs.push((l.to_string(), r.to_string())),
            ([l], []) => {
                return Err(SchemaError::UnpairedRelationField {
                    entity: left.name.clone(),
                    field: l.to_string(),
                });
            }
            ([], [r]) => {
                return Err(SchemaError::UnpairedRelationField {
                    entity: right.name.clone(),
                    field: r.to_string(),
                });
            }
            _ => unreachable!("unnamed candidate counts checked above"),
        }
        Ok(pairs)
    }

    /// Collect every entity qualifying as a join entity, keyed by its name.
    ///
    /// Qualification (the builder re-validates when the descriptor is built):
    /// exactly two foreign-key-backed to-one fields to two distinct other
    /// entities, an identifier composite over those two foreign-key columns,
    /// and exactly one list field back from each endpoint.
    fn join_entity_shapes(schema: &SchemaDef) -> BTreeMap<String, JoinEntityShape> {
        let mut shapes = BTreeMap::new();
        for entity in &schema.entities {
            let legs: Vec<_> = entity
                .relations
                .iter()
                .filter(|r| r.is_fk_backed() && r.arity == RelationArity::One)
                .collect();
            let [leg_a, leg_b] = legs.as_slice() else {
                continue;
            };
            if leg_a.target == leg_b.target
                || leg_a.target == entity.name
                || leg_b.target == entity.name
            {
                continue;
            }
            let ([fk_a], [fk_b]) = (leg_a.foreign_keys.as_slice(), leg_b.foreign_keys.as_slice())
            else {
                continue;
            };
            let mut fk_columns = [fk_a.as_str(), fk_b.as_str()];
            fk_columns.sort_unstable();
            let mut id_fields: Vec<&str> = entity
                .identifier
                .fields
                .iter()
                .map(String::as_str)
                .collect();
            id_fields.sort_unstable();
            if id_fields != fk_columns {
                continue;
            }

            let back_field = |endpoint: &str| -> Option<String> {
                let endpoint = schema.entity(endpoint)?;
                let mut fields = endpoint
                    .relations_to(&entity.name)
                    .filter(|r| r.arity == RelationArity::Many);
                let field = fields.next()?;
                fields.next().is_none().then(|| field.name.clone())
            };
            let (Some(field_a), Some(field_b)) =
                (back_field(&leg_a.target), back_field(&leg_b.target))
            else {
                continue;
            };

            shapes.insert(
                entity.name.clone(),
                JoinEntityShape {
                    endpoint_a: leg_a.target.clone(),
                    field_a,
                    endpoint_b: leg_b.target.clone(),
                    field_b,
                },
            );
        }
        shapes
    }

    /// The underlying schema document.
    pub fn schema(&self) -> &SchemaDef {
        &self.schema
    }

    /// Look up an entity definition.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.schema.entity(name)
    }

    /// All descriptors, in deterministic build order.
    pub fn descriptors(&self) -> &[RelationDescriptor] {
        &self.descriptors
    }

    /// The descriptor reachable through the given relation field.
    ///
    /// A qualified join entity's endpoint fields resolve to the derived
    /// explicit many-to-many descriptor; the join entity's own leg fields are
    /// part of that descriptor and have no standalone entry.
    pub fn descriptor(&self, entity: &str, field: &str) -> Option<&RelationDescriptor> {
        let index = *self
            .by_field
            .get(&(entity.to_string(), field.to_string()))?;
        self.descriptors.get(index)
    }

    /// Re-classify an independently introspected table: if its name, columns
    /// and indexes match a synthesized join table bit-exactly, return the
    /// implicit relation it materializes.
    pub fn recognize_join_table(&self, table: &IntrospectedTable) -> Option<&RelationDescriptor> {
        self.descriptors.iter().find(|descriptor| {
            descriptor
                .join_table_spec()
                .is_some_and(|spec| spec.matches_introspected(table))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RelationFieldDef;
    use crate::tests_cfg::{sample_registry, sample_schema};

    #[test]
    fn test_load_builds_all_descriptors() {
        let registry = sample_registry();
        // User-Post one-to-many, Category-Post implicit, Post-Tag derived
        // explicit. The Post-PostTag and Tag-PostTag legs are absorbed by the
        // explicit descriptor.
        assert_eq!(registry.descriptors().len(), 3);
    }

    #[test]
    fn test_descriptor_lookup_by_field() {
        let registry = sample_registry();

        let implicit = registry.descriptor("Category", "posts").unwrap();
        assert!(matches!(
            implicit.kind,
            RelationKind::ManyToManyImplicit { .. }
        ));

        // Endpoint fields of the join entity resolve to the derived explicit
        // descriptor; its leg fields have no standalone entry.
        let explicit = registry.descriptor("Post", "tags").unwrap();
        assert!(matches!(
            explicit.kind,
            RelationKind::ManyToManyExplicit { .. }
        ));
        assert!(registry.descriptor("PostTag", "post").is_none());

        let one_to_many = registry.descriptor("User", "posts").unwrap();
        assert!(matches!(one_to_many.kind, RelationKind::OneToMany { .. }));

        assert!(registry.descriptor("Post", "nonexistent").is_none());
    }

    #[test]
    fn test_second_unnamed_relation_pair_is_ambiguous() {
        let mut schema = sample_schema();
        schema
            .entities
            .iter_mut()
            .find(|e| e.name == "Post")
            .unwrap()
            .relations
            .push(RelationFieldDef::many("extra_categories", "Category"));
        schema
            .entities
            .iter_mut()
            .find(|e| e.name == "Category")
            .unwrap()
            .relations
            .push(RelationFieldDef::many("extra_posts", "Post"));

        let err = SchemaRegistry::load(schema).unwrap_err();
        assert!(matches!(err, SchemaError::AmbiguousRelation { .. }));
    }

    #[test]
    fn test_named_pairs_disambiguate() {
        let mut schema = sample_schema();
        for (entity, own_field, extra_field, target) in [
            ("Post", "categories", "extra_categories", "Category"),
            ("Category", "posts", "extra_posts", "Post"),
        ] {
            let entity = schema
                .entities
                .iter_mut()
                .find(|e| e.name == entity)
                .unwrap();
            for relation in &mut entity.relations {
                if relation.name == own_field {
                    relation.relation_name = Some("_PrimaryCategories".to_string());
                }
            }
            entity
                .relations
                .push(RelationFieldDef::many(extra_field, target).named("_ExtraCategories"));
        }

        let registry = SchemaRegistry::load(schema).unwrap();
        assert_eq!(registry.descriptors().len(), 4);

        let primary = registry.descriptor("Post", "categories").unwrap();
        let extra = registry.descriptor("Post", "extra_categories").unwrap();
        assert_eq!(
            primary.join_table_spec().unwrap().table_name,
            "_PrimaryCategories"
        );
        assert_eq!(
            extra.join_table_spec().unwrap().table_name,
            "_ExtraCategories"
        );
    }

    #[test]
    fn test_unpaired_named_relation_field_rejected() {
        let mut schema = sample_schema();
        schema
            .entities
            .iter_mut()
            .find(|e| e.name == "Post")
            .unwrap()
            .relations
            .push(RelationFieldDef::many("lonely", "User").named("Lonely"));

        let err = SchemaRegistry::load(schema).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnpairedRelationField { ref entity, ref field }
                if entity == "Post" && field == "lonely"
        ));
    }

    #[test]
    fn test_recognize_join_table_round_trip() {
        let registry = sample_registry();
        let descriptor = registry.descriptor("Post", "categories").unwrap();
        let spec = descriptor.join_table_spec().unwrap();

        let introspected = IntrospectedTable::from_spec(spec);
        let recognized = registry.recognize_join_table(&introspected).unwrap();
        assert_eq!(recognized, descriptor);

        let unknown = IntrospectedTable {
            name: "_SomethingElse".to_string(),
            columns: vec!["A".to_string(), "B".to_string()],
            unique_indexes: vec![],
            indexes: vec![],
        };
        assert!(registry.recognize_join_table(&unknown).is_none());
    }

    #[test]
    fn test_registries_are_independent() {
        // Two schemas in one process: registries are plain values, not
        // globals.
        let first = sample_registry();

        let mut schema = sample_schema();
        schema
            .entities
            .retain(|e| e.name != "PostTag" && e.name != "Tag");
        schema
            .entities
            .iter_mut()
            .find(|e| e.name == "Post")
            .unwrap()
            .relations
            .retain(|r| r.name != "tags");
        let second = SchemaRegistry::load(schema).unwrap();

        assert_eq!(first.descriptors().len(), 3);
        assert_eq!(second.descriptors().len(), 2);
    }
}
