//! Schema execution.
//!
//! The DDL text comes from [`crate::sql::ddl`]; this module runs it against a
//! [`ConnectionProvider`]. MySQL commits DDL implicitly, so none of these
//! calls go through the transaction coordinator.

use crate::db::provider::{Connection, ConnectionProvider};
use crate::error::OrmResult;
use crate::models::query::count_from_rows;
use crate::models::{EntityFields, SqlValue};
use crate::sql::ddl;
use tracing::{debug, info, warn};

const TABLE_EXISTS: &str = "SELECT COUNT(*) AS count FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_name = ?";

/// Runs table and index DDL.
pub struct SchemaManager;

impl SchemaManager {
    /// Create a table from its field definitions.
    ///
    /// With `sync` the table is dropped first, on the same connection. That
    /// discards every row in it.
    pub async fn create_table<P: ConnectionProvider>(
        provider: &P,
        name: &str,
        fields: &EntityFields,
        sync: bool,
    ) -> OrmResult<()> {
        // Build before touching the pool so a bad definition does no I/O.
        let create = ddl::build_create_table(name, fields)?;
        let mut conn = provider.acquire().await?;

        if sync {
            warn!(table = %name, "Sync mode: dropping table before re-creating it");
            conn.execute(&ddl::build_drop_table(name), &[]).await?;
        }
        conn.execute(&create, &[]).await?;

        info!(table = %name, columns = fields.len() + 1, "Table created");
        Ok(())
    }

    pub async fn drop_table<P: ConnectionProvider>(provider: &P, name: &str) -> OrmResult<()> {
        let sql = ddl::build_drop_table(name);
        provider.acquire().await?.execute(&sql, &[]).await?;
        info!(table = %name, "Table dropped");
        Ok(())
    }

    /// Create an index and return its generated name.
    pub async fn create_index<P: ConnectionProvider>(
        provider: &P,
        table: &str,
        fields: &[String],
        unique: bool,
    ) -> OrmResult<String> {
        let sql = ddl::build_create_index(table, fields, unique)?;
        provider.acquire().await?.execute(&sql, &[]).await?;

        let index = ddl::index_name(table, fields);
        info!(table = %table, index = %index, unique, "Index created");
        Ok(index)
    }

    pub async fn drop_index<P: ConnectionProvider>(
        provider: &P,
        table: &str,
        index: &str,
    ) -> OrmResult<()> {
        let sql = ddl::build_drop_index(table, index);
        provider.acquire().await?.execute(&sql, &[]).await?;
        info!(table = %table, index = %index, "Index dropped");
        Ok(())
    }

    /// Whether `name` exists in the current database.
    pub async fn table_exists<P: ConnectionProvider>(provider: &P, name: &str) -> OrmResult<bool> {
        let params = [SqlValue::from(name)];
        let rows = provider.acquire().await?.fetch(TABLE_EXISTS, &params).await?;
        let exists = count_from_rows(&rows)? > 0;
        debug!(table = %name, exists, "Checked table existence");
        Ok(exists)
    }
}
