//! MySQL connection provider backed by `sqlx::MySqlPool`.

use crate::config::OrmConfig;
use crate::db::provider::{Connection, ConnectionProvider};
use crate::db::types::RowToJson;
use crate::error::{OrmError, OrmResult};
use crate::models::{ExecOutcome, Row, SqlValue};
use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::{Executor, MySql, MySqlPool};
use std::time::Duration;
use tracing::{debug, info};

/// Pool of MySQL connections.
#[derive(Debug, Clone)]
pub struct MySqlProvider {
    pool: MySqlPool,
}

impl MySqlProvider {
    /// Open a pool sized by `connection_limit`.
    pub async fn connect(config: &OrmConfig) -> OrmResult<Self> {
        config.validate()?;

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8mb4");

        info!(
            url = %config.masked_url(),
            connection_limit = config.connection_limit,
            "Connecting to database"
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(config.connection_limit)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| OrmError::driver(format!("Failed to connect: {}", e), None))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

impl ConnectionProvider for MySqlProvider {
    type Connection = MySqlConnection;

    async fn acquire(&self) -> OrmResult<MySqlConnection> {
        let conn = self.pool.acquire().await.map_err(OrmError::from)?;
        Ok(MySqlConnection { conn })
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Connection pool closed");
    }
}

/// A connection checked out of a [`MySqlProvider`]. Dropping it returns it to the pool.
#[derive(Debug)]
pub struct MySqlConnection {
    conn: PoolConnection<MySql>,
}

impl Connection for MySqlConnection {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> OrmResult<ExecOutcome> {
        debug!(sql = %sql, params = params.len(), "Executing statement");

        // Statements without parameters go through the text protocol; some DDL
        // cannot be prepared.
        let result = if params.is_empty() {
            (&mut *self.conn).execute(sql).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            query.execute(&mut *self.conn).await
        }
        .map_err(OrmError::from)?;

        let last_insert_id = Some(result.last_insert_id()).filter(|id| *id != 0);
        Ok(ExecOutcome::new(result.rows_affected(), last_insert_id))
    }

    async fn fetch(&mut self, sql: &str, params: &[SqlValue]) -> OrmResult<Vec<Row>> {
        debug!(sql = %sql, params = params.len(), "Fetching rows");

        let rows: Vec<MySqlRow> = if params.is_empty() {
            (&mut *self.conn)
                .fetch(sql)
                .try_collect()
                .await
                .map_err(OrmError::from)?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            query
                .fetch(&mut *self.conn)
                .try_collect()
                .await
                .map_err(OrmError::from)?
        };

        Ok(rows.iter().map(|r| r.to_json_map()).collect())
    }

    async fn begin(&mut self) -> OrmResult<()> {
        (&mut *self.conn).execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> OrmResult<()> {
        (&mut *self.conn).execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        (&mut *self.conn).execute("ROLLBACK").await?;
        Ok(())
    }
}

/// Bind a parameter to a MySQL query.
fn bind_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q SqlValue,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::String(v) => query.bind(v.as_str()),
        SqlValue::Bytes(v) => query.bind(v.as_slice()),
        SqlValue::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}
