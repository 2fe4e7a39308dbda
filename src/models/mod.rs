//! Data models for fluent-orm.
//!
//! This module re-exports all model types used throughout the crate.

pub mod field;
pub mod query;
pub mod value;

// Re-export commonly used types
pub use field::{EntityFields, FieldDefinition, FieldSpec, Nullability, SqlType};
pub use query::{ExecOutcome, FindOptions, JoinSpec, JoinType, Row, SortOrder, Statement};
pub use value::{ConditionMap, SqlValue, Values};
