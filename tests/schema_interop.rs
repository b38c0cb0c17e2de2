//! Interoperability tests: JSON schema documents, synthesized DDL, and
//! recognition of independently introspected join tables.

use jointure::{
    translate_nested_write, IntrospectedTable, NestedOperation, NestedWrite, SchemaDef,
    SchemaError, SchemaRegistry,
};
use sea_query::{PostgresQueryBuilder, Value};
use uuid::Uuid;

/// A document-style schema with client-generated UUID identifiers, as the
/// schema-loading subsystem would hand it over.
const ACCOUNTS_SCHEMA: &str = r#"{
    "entities": [
        {
            "name": "Account",
            "table_name": "Account",
            "fields": [
                { "name": "id", "field_type": "uuid" },
                { "name": "email", "field_type": "text" }
            ],
            "identifier": { "fields": ["id"] },
            "relations": [
                { "name": "workspaces", "target": "Workspace", "arity": "many" }
            ]
        },
        {
            "name": "Workspace",
            "table_name": "Workspace",
            "fields": [
                { "name": "id", "field_type": "uuid" },
                { "name": "slug", "field_type": "text" }
            ],
            "identifier": { "fields": ["id"] },
            "relations": [
                { "name": "members", "target": "Account", "arity": "many" }
            ]
        }
    ]
}"#;

#[test]
fn json_document_loads_and_round_trips() {
    let schema = SchemaDef::from_json(ACCOUNTS_SCHEMA).unwrap();
    let json = schema.to_json().unwrap();
    let back = SchemaDef::from_json(&json).unwrap();
    assert_eq!(schema, back);

    let registry = SchemaRegistry::load(schema).unwrap();
    assert_eq!(registry.descriptors().len(), 1);
}

#[test]
fn synthesized_ddl_matches_identifier_types() {
    let registry = SchemaRegistry::load(SchemaDef::from_json(ACCOUNTS_SCHEMA).unwrap()).unwrap();
    let descriptor = registry.descriptor("Account", "workspaces").unwrap();
    let spec = descriptor.join_table_spec().unwrap();

    assert_eq!(spec.table_name, "_AccountToWorkspace");
    assert_eq!(spec.column_a.references_entity, "Account");
    assert_eq!(spec.column_b.references_entity, "Workspace");

    let table_sql = spec.create_table_statement().to_string(PostgresQueryBuilder);
    assert!(table_sql.contains("\"_AccountToWorkspace\""));
    assert!(table_sql.contains("\"A\" uuid NOT NULL"));
    assert!(table_sql.contains("\"B\" uuid NOT NULL"));
    assert!(table_sql.contains("REFERENCES \"Account\" (\"id\")"));
    assert!(table_sql.contains("REFERENCES \"Workspace\" (\"id\")"));

    let index_sql: Vec<String> = spec
        .create_index_statements()
        .iter()
        .map(|stmt| stmt.to_string(PostgresQueryBuilder))
        .collect();
    assert!(index_sql[0].starts_with("CREATE UNIQUE INDEX \"_AccountToWorkspace_AB_unique\""));
    assert!(index_sql[1].starts_with("CREATE INDEX \"_AccountToWorkspace_B_index\""));
}

#[test]
fn introspected_join_table_reclassifies_as_the_same_relation() {
    let registry = SchemaRegistry::load(SchemaDef::from_json(ACCOUNTS_SCHEMA).unwrap()).unwrap();
    let descriptor = registry.descriptor("Account", "workspaces").unwrap();

    // What a separate introspection pass would report for the physical table.
    let introspected = IntrospectedTable {
        name: "_AccountToWorkspace".to_string(),
        columns: vec!["A".to_string(), "B".to_string()],
        unique_indexes: vec![vec!["A".to_string(), "B".to_string()]],
        indexes: vec![vec!["B".to_string()]],
    };
    let recognized = registry.recognize_join_table(&introspected).unwrap();
    assert_eq!(recognized, descriptor);

    // Flipped column order is a different table, not this relation.
    let flipped = IntrospectedTable {
        columns: vec!["B".to_string(), "A".to_string()],
        ..introspected
    };
    assert!(registry.recognize_join_table(&flipped).is_none());
}

#[test]
fn uuid_identifiers_flow_through_nested_writes() {
    let registry = SchemaRegistry::load(SchemaDef::from_json(ACCOUNTS_SCHEMA).unwrap()).unwrap();
    let descriptor = registry.descriptor("Workspace", "members").unwrap();

    let workspace = Uuid::new_v4();
    let account = Uuid::new_v4();
    let write = NestedWrite::new("Workspace", workspace, "members")
        .operation(NestedOperation::connect(account));
    let ops = translate_nested_write(descriptor, &write).unwrap();

    // Account sorts before Workspace: the connected account lands in A, the
    // root workspace in B, regardless of the initiating side.
    let pairing = ops[0].pairing().unwrap();
    assert_eq!(pairing.a, Value::from(account));
    assert_eq!(pairing.b, Value::from(workspace));
}

#[test]
fn composite_identifier_blocks_implicit_participation() {
    let mut schema = SchemaDef::from_json(ACCOUNTS_SCHEMA).unwrap();
    let account = schema
        .entities
        .iter_mut()
        .find(|e| e.name == "Account")
        .unwrap();
    account.fields.push(jointure::FieldDef::new(
        "tenant_id",
        jointure::FieldType::Uuid,
    ));
    account.identifier = jointure::IdentifierDef::composite(["id", "tenant_id"]);

    let err = SchemaRegistry::load(schema).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidIdentifier { ref entity, .. } if entity == "Account"
    ));
}
