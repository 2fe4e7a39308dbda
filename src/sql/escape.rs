//! SQL literal formatting.
//!
//! Renders a [`SqlValue`] as MySQL literal text, matching the escaping the
//! MySQL client libraries apply. Only condition values of `find`/`count` and
//! column defaults/comments in DDL take this path. Every INSERT, UPDATE,
//! DELETE and select-by-id binds real positional parameters instead, which is
//! the stronger guarantee; callers that need it for filters should prefer
//! [`Orm::fetch`](crate::Orm::fetch) with bound parameters.

use crate::models::SqlValue;
use std::fmt::Write;

/// Render a value as a SQL literal.
pub fn literal(value: &SqlValue) -> String {
    let mut out = String::new();
    write_literal(&mut out, value);
    out
}

/// Append a value as a SQL literal.
pub fn write_literal(out: &mut String, value: &SqlValue) {
    match value {
        SqlValue::Null => out.push_str("NULL"),
        SqlValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        SqlValue::Int(v) => {
            let _ = write!(out, "{}", v);
        }
        SqlValue::Float(v) if v.is_finite() => {
            let _ = write!(out, "{}", v);
        }
        SqlValue::Float(_) => out.push_str("NULL"),
        SqlValue::String(v) => write_string(out, v),
        SqlValue::Bytes(v) => {
            out.push_str("X'");
            for byte in v {
                let _ = write!(out, "{:02x}", byte);
            }
            out.push('\'');
        }
        SqlValue::Json(v) => write_string(out, &v.to_string()),
    }
}

/// Append a single-quoted, backslash-escaped string literal.
pub fn write_string(out: &mut String, value: &str) {
    out.reserve(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
}
