//! DML statement builders.
//!
//! Pure functions from table names and maps to [`Statement`]s. Identifiers
//! (table and column names) are interpolated as given: they come from the
//! application's own schema definitions, not from row data. Values in
//! INSERT/UPDATE/DELETE and select-by-id are always bound as `?` parameters.
//!
//! `build_select` and `build_count` render their equality conditions through
//! [`escape::literal`] instead. That is a weaker guarantee than binding and is
//! kept as a separate, named path.

use crate::error::{OrmError, OrmResult};
use crate::models::{ConditionMap, FindOptions, JoinSpec, SqlValue, Statement, Values};
use crate::sql::escape;
use std::fmt::Write;

/// `INSERT INTO t (c1, c2) VALUES (?, ?)`.
pub fn build_insert(table: &str, values: &Values) -> OrmResult<Statement> {
    if values.is_empty() {
        return Err(OrmError::schema("No fields to insert", table));
    }

    let columns: Vec<&str> = values.columns().collect();
    let placeholders = vec!["?"; values.len()];
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );

    Ok(Statement::new(sql, values.values().cloned().collect()))
}

/// `UPDATE t SET c1 = ?, c2 = ? WHERE id = ?`, with `id` bound last.
pub fn build_update(table: &str, id: impl Into<SqlValue>, values: &Values) -> OrmResult<Statement> {
    if values.is_empty() {
        return Err(OrmError::schema("No fields to update", table));
    }

    let assignments: Vec<String> = values.columns().map(|c| format!("{} = ?", c)).collect();
    let sql = format!("UPDATE {} SET {} WHERE id = ?", table, assignments.join(", "));

    let mut params: Vec<SqlValue> = values.values().cloned().collect();
    params.push(id.into());
    Ok(Statement::new(sql, params))
}

/// `DELETE FROM t WHERE id = ?`.
pub fn build_delete(table: &str, id: impl Into<SqlValue>) -> Statement {
    Statement::new(format!("DELETE FROM {} WHERE id = ?", table), vec![id.into()])
}

/// `SELECT <fields|*> FROM t WHERE id = ?`.
pub fn build_select_by_id(table: &str, id: impl Into<SqlValue>, fields: &[String]) -> Statement {
    Statement::new(
        format!("SELECT {} FROM {} WHERE id = ?", field_list(fields), table),
        vec![id.into()],
    )
}

/// `SELECT <fields|*> FROM t [WHERE …] [ORDER BY …] [LIMIT n OFFSET m]`.
///
/// Conditions are escaped literals, so the statement carries no parameters.
pub fn build_select(table: &str, options: &FindOptions) -> Statement {
    let mut sql = format!("SELECT {} FROM {}", field_list(&options.fields), table);
    write_where(&mut sql, &options.conditions);

    if let (Some(sort_by), Some(order)) = (&options.sort_by, options.sort_order) {
        let _ = write!(sql, " ORDER BY {} {}", sort_by, order.as_sql());
    }

    if let Some((limit, offset)) = options.limit_offset() {
        let _ = write!(sql, " LIMIT {} OFFSET {}", limit, offset);
    }

    Statement::raw(sql)
}

/// `SELECT COUNT(*) AS count FROM t [WHERE …]`.
pub fn build_count(table: &str, conditions: &ConditionMap) -> Statement {
    let mut sql = format!("SELECT COUNT(*) AS count FROM {}", table);
    write_where(&mut sql, conditions);
    Statement::raw(sql)
}

/// `SELECT <fields|*> FROM t1 <TYPE> JOIN t2 ON c1 AND c2 …`.
pub fn build_join(join: &JoinSpec) -> OrmResult<Statement> {
    if join.conditions.is_empty() {
        return Err(OrmError::validation(format!(
            "Join between '{}' and '{}' requires at least one ON condition",
            join.left, join.right
        )));
    }

    let sql = format!(
        "SELECT {} FROM {} {} JOIN {} ON {}",
        field_list(&join.fields),
        join.left,
        join.join_type.as_sql(),
        join.right,
        join.conditions.join(" AND ")
    );
    Ok(Statement::raw(sql))
}

fn field_list(fields: &[String]) -> String {
    if fields.is_empty() {
        "*".to_string()
    } else {
        fields.join(", ")
    }
}

/// Append ` WHERE a = 'x' AND b IS NULL` for non-empty conditions.
fn write_where(sql: &mut String, conditions: &ConditionMap) {
    if conditions.is_empty() {
        return;
    }
    sql.push_str(" WHERE ");
    for (i, (column, value)) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        sql.push_str(column);
        if value.is_null() {
            sql.push_str(" IS NULL");
        } else {
            sql.push_str(" = ");
            escape::write_literal(sql, value);
        }
    }
}
