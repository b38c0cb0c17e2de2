//! The schema document: the full set of entity definitions handed over by the
//! schema-loading subsystem, plus the static validation pass that runs before
//! any relation descriptor is built.
//!
//! Validation failures abort schema loading; they are authoring defects, not
//! runtime conditions.

use crate::schema::entity::{EntityDef, RelationFieldDef};
use crate::schema::error::SchemaError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Entity, field and relation names must start with a letter and contain only
/// letters, digits and underscores. Join-table overrides are exempt (they are
/// required to start with `_` and are validated separately).
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("name pattern is valid"));

/// A complete logical schema: the unit of input for [`SchemaRegistry::load`].
///
/// [`SchemaRegistry::load`]: crate::relation::registry::SchemaRegistry::load
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Entity definitions in declaration order
    pub entities: Vec<EntityDef>,
}

impl SchemaDef {
    /// Build a schema document from entity definitions.
    pub fn new(entities: Vec<EntityDef>) -> Self {
        Self { entities }
    }

    /// Parse a schema document from its JSON interchange form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Render the schema document as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Validate the document: name syntax, duplicate entities, identifier and
    /// foreign-key declarations, and relation targets.
    ///
    /// Relation *pairing* (ambiguity, implicit/explicit classification) is the
    /// descriptor builder's job; this pass only establishes that every name the
    /// document mentions resolves.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = BTreeSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(SchemaError::DuplicateEntity {
                    name: entity.name.clone(),
                });
            }
            self.validate_entity(entity)?;
        }
        log::debug!(
            "schema document validated: {} entities",
            self.entities.len()
        );
        Ok(())
    }

    fn validate_entity(&self, entity: &EntityDef) -> Result<(), SchemaError> {
        check_name(&entity.name, "entity")?;
        for field in &entity.fields {
            check_name(&field.name, "field")?;
        }

        // Identifier fields must exist, be non-nullable, and be of an
        // identifier-capable type.
        if entity.identifier.fields.is_empty() {
            return Err(SchemaError::InvalidIdentifierField {
                entity: entity.name.clone(),
                field: String::new(),
            });
        }
        for id_field in &entity.identifier.fields {
            let field = entity.field(id_field).ok_or_else(|| SchemaError::UnknownField {
                entity: entity.name.clone(),
                field: id_field.clone(),
            })?;
            if field.nullable || !field.field_type.identifier_capable() {
                return Err(SchemaError::InvalidIdentifierField {
                    entity: entity.name.clone(),
                    field: id_field.clone(),
                });
            }
        }

        for relation in &entity.relations {
            self.validate_relation_field(entity, relation)?;
        }
        Ok(())
    }

    fn validate_relation_field(
        &self,
        entity: &EntityDef,
        relation: &RelationFieldDef,
    ) -> Result<(), SchemaError> {
        check_name(&relation.name, "relation field")?;

        let target = self
            .entity(&relation.target)
            .ok_or_else(|| SchemaError::UnknownEntity {
                entity: relation.target.clone(),
                referenced_by: format!("{}.{}", entity.name, relation.name),
            })?;

        // Foreign-key scalar fields live on the declaring entity; referenced
        // fields live on the target and default to its identifier.
        for fk in &relation.foreign_keys {
            if entity.field(fk).is_none() {
                return Err(SchemaError::UnknownField {
                    entity: entity.name.clone(),
                    field: fk.clone(),
                });
            }
        }
        let references: &[String] = if relation.references.is_empty() {
            &target.identifier.fields
        } else {
            &relation.references
        };
        for reference in references {
            if target.field(reference).is_none() {
                return Err(SchemaError::UnknownField {
                    entity: target.name.clone(),
                    field: reference.clone(),
                });
            }
        }
        if relation.is_fk_backed() && relation.foreign_keys.len() != references.len() {
            return Err(SchemaError::ForeignKeyArityMismatch {
                entity: entity.name.clone(),
                field: relation.name.clone(),
                foreign_keys: relation.foreign_keys.len(),
                references: references.len(),
            });
        }
        Ok(())
    }
}

fn check_name(name: &str, kind: &'static str) -> Result<(), SchemaError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            name: name.to_string(),
            kind,
        })
    }
}
