//! Query-related data models.
//!
//! This module defines the inputs of the statement builder (find options,
//! join descriptions) and the shapes results come back in.

use crate::error::{OrmError, OrmResult};
use crate::models::{ConditionMap, SqlValue};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// One decoded result row, keyed by column label.
pub type Row = serde_json::Map<String, JsonValue>;

/// SQL text plus its positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement with no parameters (DDL, escaped-literal selects).
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Number of `?` placeholders in the SQL text outside string literals.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut in_literal = false;
        let mut escaped = false;
        for c in self.sql.chars() {
            if in_literal {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '\'' => in_literal = false,
                    _ => {}
                }
            } else if c == '\'' {
                in_literal = true;
            } else if c == '?' {
                count += 1;
            }
        }
        count
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Result of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// AUTO_INCREMENT value generated by an INSERT, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<u64>,
}

impl ExecOutcome {
    pub fn new(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(OrmError::validation(format!(
                "Invalid sort order '{}': expected ASC or DESC",
                other
            ))),
        }
    }
}

/// Options for [`build_select`](crate::sql::build_select).
///
/// Ordering needs both `sort_by` and `sort_order`; paging needs both `page`
/// and `page_size` to be positive. Anything less omits the clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub conditions: ConditionMap,
    pub fields: Vec<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.conditions.insert(column, value);
        self
    }

    pub fn conditions(mut self, conditions: ConditionMap) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn paginate(mut self, page: u64, page_size: u64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(column.into());
        self.sort_order = Some(order);
        self
    }

    /// `(limit, offset)` when paging applies.
    pub fn limit_offset(&self) -> Option<(u64, u64)> {
        match (self.page, self.page_size) {
            (Some(page), Some(size)) if page > 0 && size > 0 => {
                Some((size, (page - 1).saturating_mul(size)))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

impl FromStr for JoinType {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INNER" => Ok(Self::Inner),
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            other => Err(OrmError::validation(format!(
                "Invalid join type '{}': expected INNER, LEFT or RIGHT",
                other
            ))),
        }
    }
}

/// Description of a two-table join.
///
/// `conditions` are raw SQL predicates such as `users.id = orders.user_id`,
/// combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub left: String,
    pub right: String,
    pub conditions: Vec<String>,
    pub fields: Vec<String>,
}

impl JoinSpec {
    pub fn new(join_type: JoinType, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            join_type,
            left: left.into(),
            right: right.into(),
            conditions: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn on(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Read the `count` column of a `SELECT COUNT(*) AS count` result.
pub fn count_from_rows(rows: &[Row]) -> OrmResult<u64> {
    let value = rows
        .first()
        .and_then(|row| row.get("count"))
        .ok_or_else(|| OrmError::driver("COUNT query returned no rows", None))?;

    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| OrmError::driver(format!("Unexpected COUNT value: {}", value), None))
}
