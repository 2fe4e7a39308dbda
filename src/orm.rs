//! The ORM handle.
//!
//! An [`Orm`] owns the configuration, the connection provider and the
//! transaction coordinator. Models created from it share all three, so a
//! transaction begun on the handle is the one every model's bulk operation
//! competes with.

use crate::config::OrmConfig;
use crate::db::intercept::Operation;
use crate::db::mysql::MySqlProvider;
use crate::db::provider::{Connection, ConnectionProvider};
use crate::db::schema::SchemaManager;
use crate::db::transaction::{TransactionCoordinator, TransactionInfo};
use crate::error::OrmResult;
use crate::model::EntityModel;
use crate::models::{EntityFields, ExecOutcome, Row, Statement};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};

const SCOPE: &str = "Orm";

pub(crate) struct OrmInner<P: ConnectionProvider> {
    pub(crate) config: OrmConfig,
    pub(crate) provider: P,
    pub(crate) coordinator: TransactionCoordinator<P::Connection>,
}

impl<P: ConnectionProvider> OrmInner<P> {
    pub(crate) fn operation(&self, scope: &str, operation: &str) -> Operation {
        Operation::new(scope, operation, self.config.logging)
    }

    /// Run one statement in autocommit on a fresh connection.
    pub(crate) async fn execute(&self, statement: &Statement) -> OrmResult<ExecOutcome> {
        let mut conn = self.provider.acquire().await?;
        conn.execute(&statement.sql, &statement.params).await
    }

    pub(crate) async fn fetch(&self, statement: &Statement) -> OrmResult<Vec<Row>> {
        let mut conn = self.provider.acquire().await?;
        conn.fetch(&statement.sql, &statement.params).await
    }
}

/// Entry point: one connection pool plus one transaction slot.
///
/// Cloning is cheap and clones share the pool and the transaction slot.
pub struct Orm<P: ConnectionProvider = MySqlProvider> {
    inner: Arc<OrmInner<P>>,
}

impl<P: ConnectionProvider> Clone for Orm<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Orm<MySqlProvider> {
    /// Open a MySQL pool sized by `config.connection_limit`.
    pub async fn connect(config: OrmConfig) -> OrmResult<Self> {
        let provider = MySqlProvider::connect(&config).await?;
        Ok(Self::with_provider(provider, config))
    }
}

impl<P: ConnectionProvider> Orm<P> {
    /// Build an ORM over an already constructed provider.
    pub fn with_provider(provider: P, config: OrmConfig) -> Self {
        info!(
            url = %config.masked_url(),
            sync = config.sync,
            logging = config.logging,
            "ORM initialized"
        );
        Self {
            inner: Arc::new(OrmInner {
                config,
                provider,
                coordinator: TransactionCoordinator::new(),
            }),
        }
    }

    pub fn config(&self) -> &OrmConfig {
        &self.inner.config
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// Create the table (dropping it first in sync mode) and return a model
    /// bound to it.
    pub async fn define<T: DeserializeOwned>(
        &self,
        name: &str,
        fields: EntityFields,
    ) -> OrmResult<EntityModel<T, P>> {
        self.create_table(name, &fields).await?;
        Ok(self.model(name, fields))
    }

    /// A model for a table that already exists. Runs no DDL.
    pub fn model<T: DeserializeOwned>(&self, name: &str, fields: EntityFields) -> EntityModel<T, P> {
        EntityModel::new(Arc::clone(&self.inner), name, fields)
    }

    /// Begin the instance's transaction. Fails with a conflict while one is active.
    pub async fn begin(&self) -> OrmResult<TransactionInfo> {
        self.inner
            .operation(SCOPE, "begin")
            .run(self.inner.coordinator.begin(&self.inner.provider))
            .await
    }

    /// Commit the active transaction. Does nothing when none is active.
    pub async fn commit(&self) -> OrmResult<()> {
        self.inner
            .operation(SCOPE, "commit")
            .run(self.inner.coordinator.commit())
            .await
    }

    /// Roll back the active transaction. Does nothing when none is active.
    pub async fn rollback(&self) -> OrmResult<()> {
        self.inner
            .operation(SCOPE, "rollback")
            .run(self.inner.coordinator.rollback())
            .await
    }

    pub async fn is_active(&self) -> bool {
        self.inner.coordinator.is_active().await
    }

    pub async fn current_transaction(&self) -> Option<TransactionInfo> {
        self.inner.coordinator.current().await
    }

    /// Run a write statement in autocommit.
    pub async fn execute(&self, statement: &Statement) -> OrmResult<ExecOutcome> {
        self.inner
            .operation(SCOPE, "execute")
            .arg("sql", &statement.sql)
            .arg("params", &statement.params)
            .run(self.inner.execute(statement))
            .await
    }

    /// Run a query in autocommit.
    pub async fn fetch(&self, statement: &Statement) -> OrmResult<Vec<Row>> {
        self.inner
            .operation(SCOPE, "fetch")
            .arg("sql", &statement.sql)
            .arg("params", &statement.params)
            .run(self.inner.fetch(statement))
            .await
    }

    /// Run a write statement on the active transaction's connection.
    pub async fn execute_in_transaction(
        &self,
        transaction_id: &str,
        statement: &Statement,
    ) -> OrmResult<ExecOutcome> {
        self.inner
            .operation(SCOPE, "execute_in_transaction")
            .arg("transaction_id", &transaction_id)
            .arg("sql", &statement.sql)
            .arg("params", &statement.params)
            .run(
                self.inner
                    .coordinator
                    .execute_in_transaction(transaction_id, statement),
            )
            .await
    }

    /// Run a query on the active transaction's connection.
    pub async fn fetch_in_transaction(
        &self,
        transaction_id: &str,
        statement: &Statement,
    ) -> OrmResult<Vec<Row>> {
        self.inner
            .operation(SCOPE, "fetch_in_transaction")
            .arg("transaction_id", &transaction_id)
            .arg("sql", &statement.sql)
            .arg("params", &statement.params)
            .run(
                self.inner
                    .coordinator
                    .fetch_in_transaction(transaction_id, statement),
            )
            .await
    }

    /// Create a table, honouring the configured sync mode.
    pub async fn create_table(&self, name: &str, fields: &EntityFields) -> OrmResult<()> {
        self.inner
            .operation(SCOPE, "create_table")
            .arg("table", &name)
            .arg("fields", &fields.names().collect::<Vec<_>>())
            .run(SchemaManager::create_table(
                &self.inner.provider,
                name,
                fields,
                self.inner.config.sync,
            ))
            .await
    }

    pub async fn drop_table(&self, name: &str) -> OrmResult<()> {
        self.inner
            .operation(SCOPE, "drop_table")
            .arg("table", &name)
            .run(SchemaManager::drop_table(&self.inner.provider, name))
            .await
    }

    /// Create an index named `idx_<table>_<fields>` and return the name.
    pub async fn create_index(
        &self,
        table: &str,
        fields: &[String],
        unique: bool,
    ) -> OrmResult<String> {
        self.inner
            .operation(SCOPE, "create_index")
            .arg("table", &table)
            .arg("fields", &fields)
            .arg("unique", &unique)
            .run(SchemaManager::create_index(
                &self.inner.provider,
                table,
                fields,
                unique,
            ))
            .await
    }

    pub async fn drop_index(&self, table: &str, index: &str) -> OrmResult<()> {
        self.inner
            .operation(SCOPE, "drop_index")
            .arg("table", &table)
            .arg("index", &index)
            .run(SchemaManager::drop_index(&self.inner.provider, table, index))
            .await
    }

    pub async fn table_exists(&self, name: &str) -> OrmResult<bool> {
        self.inner
            .operation(SCOPE, "table_exists")
            .arg("table", &name)
            .run(SchemaManager::table_exists(&self.inner.provider, name))
            .await
    }

    /// Roll back any active transaction and close the pool.
    pub async fn close(&self) -> OrmResult<()> {
        if let Some(tx) = self.inner.coordinator.current().await {
            warn!(
                transaction_id = %tx.transaction_id,
                "Closing with an active transaction, rolling back"
            );
            self.inner.coordinator.rollback().await?;
        }
        self.inner.provider.close().await;
        Ok(())
    }
}
