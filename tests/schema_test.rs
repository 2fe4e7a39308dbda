//! Integration tests for schema execution and schema files.

mod common;

use common::{mock_orm, row};
use fluent_orm::config::SchemaFile;
use fluent_orm::{EntityFields, FieldDefinition, OrmError, SqlType, SqlValue};
use serde_json::json;
use std::io::Write;

#[tokio::test]
async fn test_create_and_drop_index() {
    let (orm, provider) = mock_orm();
    let name = orm
        .create_index("users", &["email".to_string()], true)
        .await
        .unwrap();
    orm.drop_index("users", &name).await.unwrap();

    assert_eq!(name, "idx_users_email");
    assert_eq!(
        provider.executed(),
        vec![
            "CREATE UNIQUE INDEX idx_users_email ON users (email)",
            "DROP INDEX idx_users_email ON users",
        ]
    );
}

#[tokio::test]
async fn test_create_index_without_fields_is_schema_error() {
    let (orm, provider) = mock_orm();
    let err = orm.create_index("users", &[], false).await.unwrap_err();

    assert!(matches!(err, OrmError::Schema { .. }));
    assert_eq!(provider.state().acquired, 0);
}

#[tokio::test]
async fn test_drop_table() {
    let (orm, provider) = mock_orm();
    orm.drop_table("sessions").await.unwrap();
    assert_eq!(provider.executed(), vec!["DROP TABLE IF EXISTS sessions"]);
}

#[tokio::test]
async fn test_table_exists_binds_name() {
    let (orm, provider) = mock_orm();
    provider.queue_rows(vec![row(&[("count", json!(1))])]);
    provider.queue_rows(vec![row(&[("count", json!(0))])]);

    assert!(orm.table_exists("users").await.unwrap());
    assert!(!orm.table_exists("ghosts").await.unwrap());

    let executed = provider.executed();
    assert!(executed[0].contains("information_schema.tables"));
    assert!(executed[0].ends_with("table_name = ?"));
}

#[tokio::test]
async fn test_create_table_with_empty_name_is_schema_error() {
    let (orm, _provider) = mock_orm();
    let fields = EntityFields::new().with("label", FieldDefinition::new(SqlType::Text));
    let err = orm.create_table("", &fields).await.unwrap_err();
    assert!(matches!(err, OrmError::Schema { .. }));
}

#[tokio::test]
async fn test_create_table_renders_defaults_as_literals() {
    let (orm, provider) = mock_orm();
    let fields = EntityFields::new().with(
        "status",
        FieldDefinition::new(SqlType::Varchar)
            .size(16)
            .default_value(SqlValue::from("new"))
            .check("status <> ''")
            .comment("workflow state"),
    );
    orm.create_table("tasks", &fields).await.unwrap();

    assert_eq!(
        provider.executed(),
        vec![
            "CREATE TABLE IF NOT EXISTS tasks (id INT AUTO_INCREMENT PRIMARY KEY, \
             status VARCHAR(16) NOT NULL DEFAULT 'new' CHECK (status <> '') \
             COMMENT 'workflow state')"
        ]
    );
}

#[test]
fn test_schema_file_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "tables": [
                {{
                    "name": "authors",
                    "fields": [
                        {{"name": "name", "type": "varchar", "size": 80}},
                        {{"name": "bio", "type": "text", "nullability": "engine_default"}}
                    ]
                }},
                {{
                    "name": "books",
                    "fields": [
                        {{"name": "title", "type": "varchar", "size": 200, "unique": true}},
                        {{"name": "author_id", "type": "int"}}
                    ],
                    "indexes": [{{"fields": ["author_id"]}}]
                }}
            ]
        }}"#
    )
    .unwrap();

    let schema = SchemaFile::load(file.path()).unwrap();
    assert_eq!(schema.tables.len(), 2);

    let statements = schema.statements(false).unwrap();
    assert_eq!(
        statements,
        vec![
            "CREATE TABLE IF NOT EXISTS authors (id INT AUTO_INCREMENT PRIMARY KEY, \
             name VARCHAR(80) NOT NULL, bio TEXT)",
            "CREATE TABLE IF NOT EXISTS books (id INT AUTO_INCREMENT PRIMARY KEY, \
             title VARCHAR(200) UNIQUE NOT NULL, author_id INT NOT NULL)",
            "CREATE INDEX idx_books_author_id ON books (author_id)",
        ]
    );
}

#[test]
fn test_schema_file_missing_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SchemaFile::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, OrmError::Config { .. }));
}
