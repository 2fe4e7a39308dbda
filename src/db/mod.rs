//! Database execution layer.
//!
//! This module provides everything that touches a connection:
//! - The connection provider capability and its MySQL implementation
//! - Row decoding into JSON maps
//! - Schema (DDL) execution
//! - The per-instance transaction coordinator
//! - The operation interceptor used for logging

pub mod intercept;
pub mod mysql;
pub mod provider;
pub mod schema;
pub mod transaction;
pub mod types;

pub use intercept::Operation;
pub use mysql::{MySqlConnection, MySqlProvider};
pub use provider::{Connection, ConnectionProvider};
pub use schema::SchemaManager;
pub use transaction::{TransactionCoordinator, TransactionInfo};
