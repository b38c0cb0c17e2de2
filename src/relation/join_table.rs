//! Implicit join-table synthesis.
//!
//! For implicit many-to-many relations the logical schema contains no join
//! entity; the physical representation is derived here. Synthesis is a pure
//! function of the two entity names and must be bit-exact reproducible:
//! introspecting a pre-existing join table has to converge on the very same
//! name, columns and indexes for the relation to be recognized.
//!
//! Layout: table `_<NameA>To<NameB>` (ordinal order, original casing), two
//! columns `A` and `B` foreign-keyed to the respective identifier columns, a
//! unique composite index on (`A`,`B`) and a non-unique index on `B` for
//! reverse-direction lookups.

use crate::relation::def::RelationSide;
use crate::schema::{FieldType, SchemaError};
use sea_query::{
    ColumnDef, DynIden, Expr, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement, Table,
    TableCreateStatement,
};
use serde::{Deserialize, Serialize};

/// Fixed name of the column referencing the first-sorting entity.
pub const COLUMN_A: &str = "A";
/// Fixed name of the column referencing the other entity.
pub const COLUMN_B: &str = "B";

/// One of the two foreign-key columns of a synthesized join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinColumn {
    /// Column name, always `A` or `B`
    pub name: String,
    /// Entity whose identifier this column references
    pub references_entity: String,
    /// Referenced physical table
    pub references_table: String,
    /// Referenced identifier column
    pub references_column: String,
    /// Column type, matching the referenced identifier column
    pub column_type: FieldType,
}

/// An index on the synthesized join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexSpec {
    /// Render this index as a sea-query CREATE INDEX statement.
    pub fn create_statement(&self, table: &str) -> IndexCreateStatement {
        let mut stmt = Index::create();
        stmt.name(self.name.clone())
            .table(DynIden::from(table.to_string()));
        for column in &self.columns {
            stmt.col(Expr::col(DynIden::from(column.clone())));
        }
        if self.unique {
            stmt.unique();
        }
        stmt.to_owned()
    }
}

/// The derived physical representation of an implicit many-to-many relation.
///
/// Owned by the schema-loading subsystem and shared read-only by the
/// translators; nothing mutates a spec once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTableSpec {
    /// Join table name: `_<NameA>To<NameB>` or the validated override
    pub table_name: String,
    /// Column referencing the entity whose name sorts first
    pub column_a: JoinColumn,
    /// Column referencing the other entity
    pub column_b: JoinColumn,
    /// Unique composite index on (`A`,`B`): no duplicate pairing may exist
    pub unique_index: IndexSpec,
    /// Non-unique index on `B` for reverse-direction lookups
    pub secondary_index: IndexSpec,
}

/// Order two entity names canonically: ordinal string comparison, the smaller
/// first. Not locale-aware, by requirement; independent processes must sort
/// identically.
pub fn canonical_order<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The default join-table name for two entities: `_` + the names joined in
/// canonical order by `To`, original casing preserved.
///
/// # Example
///
/// ```
/// use jointure::relation::default_table_name;
///
/// assert_eq!(default_table_name("Category", "Post"), "_CategoryToPost");
/// assert_eq!(default_table_name("Post", "Category"), "_CategoryToPost");
/// ```
pub fn default_table_name(a: &str, b: &str) -> String {
    let (first, second) = canonical_order(a, b);
    format!("_{}To{}", first, second)
}

/// The default relation name: the table name without the `_` prefix.
pub fn default_relation_name(a: &str, b: &str) -> String {
    let (first, second) = canonical_order(a, b);
    format!("{}To{}", first, second)
}

impl JoinTableSpec {
    /// Synthesize the join table for an implicit relation between the two
    /// given sides.
    ///
    /// Deterministic and commutative: the sides may be passed in either order
    /// and identical entity-name pairs always yield identical table, column
    /// and index names. An `override_name` replaces the default table name and
    /// must start with `_`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidJoinTableName`] when the override does
    /// not start with `_`.
    pub fn synthesize(
        left: &RelationSide,
        right: &RelationSide,
        override_name: Option<&str>,
    ) -> Result<Self, SchemaError> {
        // Canonical ordering decides column assignment, not declaration order.
        let (side_a, side_b) = if left.entity.as_str() <= right.entity.as_str() {
            (left, right)
        } else {
            (right, left)
        };

        let table_name = match override_name {
            Some(name) if name.starts_with('_') => name.to_string(),
            Some(name) => {
                return Err(SchemaError::InvalidJoinTableName {
                    name: name.to_string(),
                    relation: default_relation_name(&left.entity, &right.entity),
                });
            }
            None => default_table_name(&side_a.entity, &side_b.entity),
        };

        let column_a = JoinColumn {
            name: COLUMN_A.to_string(),
            references_entity: side_a.entity.clone(),
            references_table: side_a.table.clone(),
            references_column: side_a.id_column.clone(),
            column_type: side_a.id_type,
        };
        let column_b = JoinColumn {
            name: COLUMN_B.to_string(),
            references_entity: side_b.entity.clone(),
            references_table: side_b.table.clone(),
            references_column: side_b.id_column.clone(),
            column_type: side_b.id_type,
        };
        let unique_index = IndexSpec {
            name: format!("{}_AB_unique", table_name),
            columns: vec![COLUMN_A.to_string(), COLUMN_B.to_string()],
            unique: true,
        };
        let secondary_index = IndexSpec {
            name: format!("{}_B_index", table_name),
            columns: vec![COLUMN_B.to_string()],
            unique: false,
        };

        Ok(Self {
            table_name,
            column_a,
            column_b,
            unique_index,
            secondary_index,
        })
    }

    /// The column holding the given entity's identifier, with its opposite.
    ///
    /// Returns `(own column, other column)` or `None` when the entity is not
    /// referenced by this join table.
    pub fn columns_for(&self, entity: &str) -> Option<(&JoinColumn, &JoinColumn)> {
        if self.column_a.references_entity == entity {
            Some((&self.column_a, &self.column_b))
        } else if self.column_b.references_entity == entity {
            Some((&self.column_b, &self.column_a))
        } else {
            None
        }
    }

    /// Render the CREATE TABLE statement for this join table, including both
    /// foreign-key constraints (cascading on delete).
    pub fn create_table_statement(&self) -> TableCreateStatement {
        let mut stmt = Table::create();
        stmt.table(DynIden::from(self.table_name.clone()));
        for column in [&self.column_a, &self.column_b] {
            let mut def = ColumnDef::new(DynIden::from(column.name.clone()));
            column.column_type.apply_to_column(&mut def);
            def.not_null();
            stmt.col(def);
        }
        for column in [&self.column_a, &self.column_b] {
            stmt.foreign_key(
                ForeignKey::create()
                    .name(format!("{}_{}_fkey", self.table_name, column.name))
                    .from(
                        DynIden::from(self.table_name.clone()),
                        DynIden::from(column.name.clone()),
                    )
                    .to(
                        DynIden::from(column.references_table.clone()),
                        DynIden::from(column.references_column.clone()),
                    )
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade),
            );
        }
        stmt.to_owned()
    }

    /// Render the two CREATE INDEX statements: the unique (`A`,`B`) composite
    /// and the non-unique `B` index. Both are emitted unconditionally.
    pub fn create_index_statements(&self) -> Vec<IndexCreateStatement> {
        vec![
            self.unique_index.create_statement(&self.table_name),
            self.secondary_index.create_statement(&self.table_name),
        ]
    }

    /// Whether an independently introspected table matches this spec's
    /// physical layout bit-exactly: same table name, exactly the two `A`/`B`
    /// columns, a unique index on (`A`,`B`) and a non-unique index on `B`.
    pub fn matches_introspected(&self, table: &IntrospectedTable) -> bool {
        table.name == self.table_name
            && table.columns == [COLUMN_A, COLUMN_B]
            && table
                .unique_indexes
                .iter()
                .any(|cols| cols == &[COLUMN_A.to_string(), COLUMN_B.to_string()])
            && table
                .indexes
                .iter()
                .any(|cols| cols == &[COLUMN_B.to_string()])
    }
}

/// A physical table as reported by an (external) introspection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectedTable {
    /// Table name
    pub name: String,
    /// Column names in declaration order
    pub columns: Vec<String>,
    /// Column lists of the table's unique indexes
    pub unique_indexes: Vec<Vec<String>>,
    /// Column lists of the table's non-unique indexes
    pub indexes: Vec<Vec<String>>,
}

impl IntrospectedTable {
    /// The introspected shape a freshly synthesized join table would have.
    pub fn from_spec(spec: &JoinTableSpec) -> Self {
        Self {
            name: spec.table_name.clone(),
            columns: vec![COLUMN_A.to_string(), COLUMN_B.to_string()],
            unique_indexes: vec![spec.unique_index.columns.clone()],
            indexes: vec![spec.secondary_index.columns.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::PostgresQueryBuilder;

    fn side(entity: &str, id_type: FieldType) -> RelationSide {
        RelationSide {
            entity: entity.to_string(),
            table: entity.to_string(),
            field: "unused".to_string(),
            id_column: "id".to_string(),
            id_type,
        }
    }

    #[test]
    fn test_canonical_order_is_ordinal() {
        assert_eq!(canonical_order("Category", "Post"), ("Category", "Post"));
        assert_eq!(canonical_order("Post", "Category"), ("Category", "Post"));
        // Ordinal, not case-folded: uppercase sorts before lowercase.
        assert_eq!(canonical_order("zebra", "Apple"), ("Apple", "zebra"));
    }

    #[test]
    fn test_default_table_name_category_post() {
        assert_eq!(default_table_name("Category", "Post"), "_CategoryToPost");
        assert_eq!(default_table_name("Post", "Category"), "_CategoryToPost");
    }

    #[test]
    fn test_synthesis_commutative_over_input_order() {
        let category = side("Category", FieldType::Int);
        let post = side("Post", FieldType::Int);

        let forward = JoinTableSpec::synthesize(&category, &post, None).unwrap();
        let backward = JoinTableSpec::synthesize(&post, &category, None).unwrap();
        assert_eq!(forward, backward);

        assert_eq!(forward.table_name, "_CategoryToPost");
        assert_eq!(forward.column_a.references_entity, "Category");
        assert_eq!(forward.column_b.references_entity, "Post");
    }

    #[test]
    fn test_index_layout() {
        let spec = JoinTableSpec::synthesize(
            &side("Category", FieldType::Int),
            &side("Post", FieldType::Int),
            None,
        )
        .unwrap();

        assert_eq!(spec.unique_index.name, "_CategoryToPost_AB_unique");
        assert!(spec.unique_index.unique);
        assert_eq!(spec.unique_index.columns, ["A", "B"]);

        assert_eq!(spec.secondary_index.name, "_CategoryToPost_B_index");
        assert!(!spec.secondary_index.unique);
        assert_eq!(spec.secondary_index.columns, ["B"]);
    }

    #[test]
    fn test_override_requires_underscore_prefix() {
        let category = side("Category", FieldType::Int);
        let post = side("Post", FieldType::Int);

        let err = JoinTableSpec::synthesize(&category, &post, Some("CategoryPosts")).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidJoinTableName { ref name, .. } if name == "CategoryPosts"
        ));

        let spec = JoinTableSpec::synthesize(&category, &post, Some("_MyJoinTable")).unwrap();
        assert_eq!(spec.table_name, "_MyJoinTable");
        assert_eq!(spec.unique_index.name, "_MyJoinTable_AB_unique");
    }

    #[test]
    fn test_columns_for_orientation() {
        let spec = JoinTableSpec::synthesize(
            &side("Category", FieldType::Int),
            &side("Post", FieldType::Int),
            None,
        )
        .unwrap();

        let (own, other) = spec.columns_for("Post").unwrap();
        assert_eq!(own.name, "B");
        assert_eq!(other.name, "A");
        assert!(spec.columns_for("User").is_none());
    }

    #[test]
    fn test_create_table_sql_shape() {
        let spec = JoinTableSpec::synthesize(
            &side("Category", FieldType::Int),
            &side("Post", FieldType::Int),
            None,
        )
        .unwrap();

        let sql = spec.create_table_statement().to_string(PostgresQueryBuilder);
        assert!(sql.contains("\"_CategoryToPost\""));
        assert!(sql.contains("\"A\" integer NOT NULL"));
        assert!(sql.contains("\"B\" integer NOT NULL"));
        assert!(sql.contains("FOREIGN KEY (\"A\") REFERENCES \"Category\" (\"id\")"));
        assert!(sql.contains("FOREIGN KEY (\"B\") REFERENCES \"Post\" (\"id\")"));

        let indexes = spec.create_index_statements();
        let unique_sql = indexes[0].to_string(PostgresQueryBuilder);
        assert!(unique_sql.starts_with("CREATE UNIQUE INDEX"));
        assert!(unique_sql.contains("\"_CategoryToPost_AB_unique\""));
        let secondary_sql = indexes[1].to_string(PostgresQueryBuilder);
        assert!(secondary_sql.starts_with("CREATE INDEX"));
        assert!(secondary_sql.contains("\"_CategoryToPost_B_index\""));
    }

    #[test]
    fn test_introspected_round_trip_matches() {
        let spec = JoinTableSpec::synthesize(
            &side("Category", FieldType::Int),
            &side("Post", FieldType::Int),
            None,
        )
        .unwrap();

        let introspected = IntrospectedTable::from_spec(&spec);
        assert!(spec.matches_introspected(&introspected));

        // A table missing the secondary index is not recognized.
        let mut degraded = introspected;
        degraded.indexes.clear();
        assert!(!spec.matches_introspected(&degraded));
    }
}
