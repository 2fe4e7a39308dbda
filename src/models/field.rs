//! Column definitions used to generate table DDL.

use crate::error::{OrmError, OrmResult};
use crate::models::SqlValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Column types understood by the DDL generator (MySQL names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    Int,
    TinyInt,
    SmallInt,
    BigInt,
    Float,
    Double,
    Decimal,
    Varchar,
    Char,
    Text,
    LongText,
    Boolean,
    Date,
    DateTime,
    Timestamp,
    Time,
    Json,
    Blob,
}

impl SqlType {
    /// SQL keyword for this type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Varchar => "VARCHAR",
            Self::Char => "CHAR",
            Self::Text => "TEXT",
            Self::LongText => "LONGTEXT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Time => "TIME",
            Self::Json => "JSON",
            Self::Blob => "BLOB",
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SqlType {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Self::Int,
            "TINYINT" => Self::TinyInt,
            "SMALLINT" => Self::SmallInt,
            "BIGINT" => Self::BigInt,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" | "NUMERIC" => Self::Decimal,
            "VARCHAR" => Self::Varchar,
            "CHAR" => Self::Char,
            "TEXT" => Self::Text,
            "LONGTEXT" => Self::LongText,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "JSON" => Self::Json,
            "BLOB" => Self::Blob,
            other => {
                return Err(OrmError::schema(
                    format!("Unsupported column type '{}'", other),
                    s,
                ));
            }
        };
        Ok(ty)
    }
}

/// Three-way NULL policy for a column.
///
/// `NotNull` is the default. `EngineDefault` emits no constraint at all and
/// leaves the column to the engine's own default (nullable in MySQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    Nullable,
    #[default]
    NotNull,
    EngineDefault,
}

/// Definition of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFieldDefinition")]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub nullability: Nullability,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SqlValue>,
    /// SQL predicate rendered inside `CHECK (...)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Schema-file form of a column. Accepts either the three-way
/// `nullability` or a plain `nullable` flag.
#[derive(Deserialize)]
struct RawFieldDefinition {
    #[serde(rename = "type")]
    sql_type: SqlType,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    nullability: Option<Nullability>,
    #[serde(default)]
    nullable: Option<bool>,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    auto_increment: bool,
    #[serde(default)]
    default_value: Option<SqlValue>,
    #[serde(default)]
    check: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

impl From<RawFieldDefinition> for FieldDefinition {
    fn from(raw: RawFieldDefinition) -> Self {
        // `nullable: false` leaves the clause bare; `nullability` wins over both
        let nullability = raw.nullability.unwrap_or(match raw.nullable {
            Some(true) => Nullability::Nullable,
            Some(false) => Nullability::EngineDefault,
            None => Nullability::NotNull,
        });
        Self {
            sql_type: raw.sql_type,
            size: raw.size,
            unique: raw.unique,
            nullability,
            primary: raw.primary,
            auto_increment: raw.auto_increment,
            default_value: raw.default_value,
            check: raw.check,
            comment: raw.comment,
        }
    }
}

impl FieldDefinition {
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            sql_type,
            size: None,
            unique: false,
            nullability: Nullability::default(),
            primary: false,
            auto_increment: false,
            default_value: None,
            check: None,
            comment: None,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullability = Nullability::Nullable;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullability = Nullability::NotNull;
        self
    }

    pub fn nullability(mut self, nullability: Nullability) -> Self {
        self.nullability = nullability;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn check(mut self, predicate: impl Into<String>) -> Self {
        self.check = Some(predicate.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// One named column as it appears in a schema file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub definition: FieldDefinition,
}

/// Ordered field name → definition map for one table.
///
/// Order drives the column order of generated DDL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct EntityFields {
    fields: Vec<(String, FieldDefinition)>,
}

impl EntityFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.insert(name, definition);
        self
    }

    /// Insert a field; a repeated name replaces the earlier definition in place.
    pub fn insert(&mut self, name: impl Into<String>, definition: FieldDefinition) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = definition,
            None => self.fields.push((name, definition)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, definition)| definition)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Reject names that cannot appear as a plain column identifier.
    pub fn validate(&self, table: &str) -> OrmResult<()> {
        for (name, _) in &self.fields {
            if name.is_empty() {
                return Err(OrmError::schema("Field name cannot be empty", table));
            }
            if name.eq_ignore_ascii_case("id") {
                return Err(OrmError::schema(
                    "Field 'id' is reserved: every table gets an AUTO_INCREMENT id column",
                    table,
                ));
            }
        }
        Ok(())
    }
}

impl From<Vec<FieldSpec>> for EntityFields {
    fn from(specs: Vec<FieldSpec>) -> Self {
        let mut fields = EntityFields::new();
        for spec in specs {
            fields.insert(spec.name, spec.definition);
        }
        fields
    }
}

impl From<EntityFields> for Vec<FieldSpec> {
    fn from(fields: EntityFields) -> Self {
        fields
            .fields
            .into_iter()
            .map(|(name, definition)| FieldSpec { name, definition })
            .collect()
    }
}
