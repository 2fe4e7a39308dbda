//! SQL text generation.
//!
//! Everything in this module is pure: no connections, no I/O.
//! - `statement`: parameterized DML (insert/update/delete/select/count/join)
//! - `ddl`: CREATE/DROP for tables and indexes
//! - `escape`: MySQL literal formatting for the escaped-literal paths

pub mod ddl;
pub mod escape;
pub mod statement;

pub use ddl::{
    build_create_index, build_create_table, build_drop_index, build_drop_table, index_name,
};
pub use statement::{
    build_count, build_delete, build_insert, build_join, build_select, build_select_by_id,
    build_update,
};
