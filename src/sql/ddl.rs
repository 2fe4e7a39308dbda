//! DDL builders for tables and indexes.

use crate::error::{OrmError, OrmResult};
use crate::models::{EntityFields, FieldDefinition, Nullability};
use crate::sql::escape;
use std::fmt::Write;

/// Column injected as the first column of every table.
pub const ID_COLUMN: &str = "id INT AUTO_INCREMENT PRIMARY KEY";

/// `CREATE TABLE IF NOT EXISTS name (id …, col …)`.
pub fn build_create_table(name: &str, fields: &EntityFields) -> OrmResult<String> {
    if name.is_empty() {
        return Err(OrmError::schema("Table name cannot be empty", name));
    }
    fields.validate(name)?;

    let mut columns = Vec::with_capacity(fields.len() + 1);
    columns.push(ID_COLUMN.to_string());
    for (field, definition) in fields.iter() {
        columns.push(column_clause(field, definition));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        name,
        columns.join(", ")
    ))
}

/// Render one column clause:
/// `name TYPE[(size)] [UNIQUE] [PRIMARY KEY] [NULL|NOT NULL] [AUTO_INCREMENT]
/// [DEFAULT v] [CHECK (p)] [COMMENT 'c']`.
pub fn column_clause(name: &str, definition: &FieldDefinition) -> String {
    let mut sql = format!("{} {}", name, definition.sql_type.as_sql());
    if let Some(size) = definition.size {
        let _ = write!(sql, "({})", size);
    }
    if definition.unique {
        sql.push_str(" UNIQUE");
    }
    if definition.primary {
        sql.push_str(" PRIMARY KEY");
    }
    match definition.nullability {
        Nullability::Nullable => sql.push_str(" NULL"),
        Nullability::NotNull => sql.push_str(" NOT NULL"),
        Nullability::EngineDefault => {}
    }
    if definition.auto_increment {
        sql.push_str(" AUTO_INCREMENT");
    }
    if let Some(default) = &definition.default_value {
        sql.push_str(" DEFAULT ");
        escape::write_literal(&mut sql, default);
    }
    if let Some(check) = &definition.check {
        let _ = write!(sql, " CHECK ({})", check);
    }
    if let Some(comment) = &definition.comment {
        sql.push_str(" COMMENT ");
        escape::write_string(&mut sql, comment);
    }
    sql
}

/// `DROP TABLE IF EXISTS name`.
pub fn build_drop_table(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", name)
}

/// Deterministic index name: `idx_<table>_<f1>_<f2>…`.
pub fn index_name(table: &str, fields: &[String]) -> String {
    format!("idx_{}_{}", table, fields.join("_"))
}

/// `CREATE [UNIQUE] INDEX idx_t_f ON t (f…)`.
pub fn build_create_index(table: &str, fields: &[String], unique: bool) -> OrmResult<String> {
    if fields.is_empty() {
        return Err(OrmError::schema("An index needs at least one field", table));
    }
    Ok(format!(
        "CREATE {}INDEX {} ON {} ({})",
        if unique { "UNIQUE " } else { "" },
        index_name(table, fields),
        table,
        fields.join(", ")
    ))
}

/// `DROP INDEX name ON t`.
pub fn build_drop_index(table: &str, index_name: &str) -> String {
    format!("DROP INDEX {} ON {}", index_name, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SqlType;

    fn names(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_create_table_injects_id() {
        let fields = EntityFields::new()
            .with("name", FieldDefinition::new(SqlType::Varchar).size(100));
        assert_eq!(
            build_create_table("users", &fields).unwrap(),
            "CREATE TABLE IF NOT EXISTS users (id INT AUTO_INCREMENT PRIMARY KEY, \
             name VARCHAR(100) NOT NULL)"
        );
    }

    #[test]
    fn test_column_clause_order() {
        let definition = FieldDefinition::new(SqlType::Int)
            .unique()
            .nullable()
            .default_value(0)
            .check("score >= 0")
            .comment("player's score");
        assert_eq!(
            column_clause("score", &definition),
            "score INT UNIQUE NULL DEFAULT 0 CHECK (score >= 0) COMMENT 'player\\'s score'"
        );
    }

    #[test]
    fn test_engine_default_nullability_emits_nothing() {
        let definition =
            FieldDefinition::new(SqlType::Text).nullability(Nullability::EngineDefault);
        assert_eq!(column_clause("bio", &definition), "bio TEXT");
    }

    #[test]
    fn test_primary_auto_increment() {
        let definition = FieldDefinition::new(SqlType::BigInt).primary().auto_increment();
        assert_eq!(
            column_clause("seq", &definition),
            "seq BIGINT PRIMARY KEY NOT NULL AUTO_INCREMENT"
        );
    }

    #[test]
    fn test_string_default_escaped() {
        let definition = FieldDefinition::new(SqlType::Varchar)
            .size(20)
            .default_value("it's");
        assert_eq!(
            column_clause("status", &definition),
            "status VARCHAR(20) NOT NULL DEFAULT 'it\\'s'"
        );
    }

    #[test]
    fn test_create_table_rejects_empty_name() {
        assert!(build_create_table("", &EntityFields::new()).is_err());
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(build_drop_table("users"), "DROP TABLE IF EXISTS users");
    }

    #[test]
    fn test_index_statements() {
        assert_eq!(
            build_create_index("users", &names(&["last", "first"]), false).unwrap(),
            "CREATE INDEX idx_users_last_first ON users (last, first)"
        );
        assert_eq!(
            build_create_index("users", &names(&["email"]), true).unwrap(),
            "CREATE UNIQUE INDEX idx_users_email ON users (email)"
        );
        assert!(build_create_index("users", &[], false).is_err());
        assert_eq!(
            build_drop_index("users", "idx_users_email"),
            "DROP INDEX idx_users_email ON users"
        );
    }
}
