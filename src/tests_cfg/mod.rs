//! Shared sample schema for unit tests.
//!
//! One schema exercising every relation kind:
//! - `User` 1-n `Post` through `Post.author_id`
//! - `Post` m-n `Category`, implicit (synthesized `_CategoryToPost` table)
//! - `Post` m-n `Tag`, explicit through the `PostTag` join entity, which
//!   carries `assigned_at`/`assigned_by` attributes and a composite
//!   identifier over its two foreign keys

use crate::relation::SchemaRegistry;
use crate::schema::{
    EntityDef, FieldDef, FieldType, IdentifierDef, RelationFieldDef, SchemaDef,
};

/// The sample schema document.
pub fn sample_schema() -> SchemaDef {
    let category = EntityDef {
        name: "Category".to_string(),
        table_name: "Category".to_string(),
        fields: vec![
            FieldDef::new("id", FieldType::Int),
            FieldDef::new("name", FieldType::Text),
        ],
        identifier: IdentifierDef::single("id"),
        relations: vec![RelationFieldDef::many("posts", "Post")],
    };

    let post = EntityDef {
        name: "Post".to_string(),
        table_name: "Post".to_string(),
        fields: vec![
            FieldDef::new("id", FieldType::Int),
            FieldDef::new("title", FieldType::Text),
            FieldDef::new("author_id", FieldType::Int),
        ],
        identifier: IdentifierDef::single("id"),
        relations: vec![
            RelationFieldDef::belongs_to("author", "User", ["author_id"]),
            RelationFieldDef::many("categories", "Category"),
            RelationFieldDef::many("tags", "PostTag"),
        ],
    };

    let tag = EntityDef {
        name: "Tag".to_string(),
        table_name: "Tag".to_string(),
        fields: vec![
            FieldDef::new("id", FieldType::Int),
            FieldDef::new("label", FieldType::Text),
        ],
        identifier: IdentifierDef::single("id"),
        relations: vec![RelationFieldDef::many("posts", "PostTag")],
    };

    let post_tag = EntityDef {
        name: "PostTag".to_string(),
        table_name: "PostTag".to_string(),
        fields: vec![
            FieldDef::new("post_id", FieldType::Int),
            FieldDef::new("tag_id", FieldType::Int),
            FieldDef::new("assigned_at", FieldType::Timestamp),
            FieldDef::new("assigned_by", FieldType::Text),
        ],
        identifier: IdentifierDef::composite(["post_id", "tag_id"]),
        relations: vec![
            RelationFieldDef::belongs_to("post", "Post", ["post_id"]),
            RelationFieldDef::belongs_to("tag", "Tag", ["tag_id"]),
        ],
    };

    let user = EntityDef {
        name: "User".to_string(),
        table_name: "User".to_string(),
        fields: vec![
            FieldDef::new("id", FieldType::Int),
            FieldDef::new("name", FieldType::Text),
        ],
        identifier: IdentifierDef::single("id"),
        relations: vec![RelationFieldDef::many("posts", "Post")],
    };

    SchemaDef::new(vec![category, post, tag, post_tag, user])
}

/// The sample schema, loaded.
pub fn sample_registry() -> SchemaRegistry {
    SchemaRegistry::load(sample_schema()).expect("sample schema loads")
}
