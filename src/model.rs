//! Entity model facade.
//!
//! An [`EntityModel`] is a table name plus its field schema, bound to the
//! [`Orm`](crate::Orm) that created it. Each method builds a statement with
//! [`crate::sql`] and runs it: single-row calls in autocommit, `*_many` calls
//! inside their own transaction. A view from [`EntityModel::in_transaction`]
//! runs everything on a transaction the caller began, and leaves commit or
//! rollback to the caller.
//!
//! Column names are not checked against the schema. Unknown columns surface
//! as driver errors.

use crate::db::mysql::MySqlProvider;
use crate::db::provider::ConnectionProvider;
use crate::db::transaction::TransactionInfo;
use crate::error::{OrmError, OrmResult};
use crate::models::query::count_from_rows;
use crate::models::{
    ConditionMap, EntityFields, ExecOutcome, FindOptions, JoinSpec, JoinType, Row, SqlValue,
    Statement, Values,
};
use crate::orm::OrmInner;
use crate::sql;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed view over one table. Rows decode into `T`.
pub struct EntityModel<T = Row, P: ConnectionProvider = MySqlProvider> {
    orm: Arc<OrmInner<P>>,
    table: Arc<str>,
    fields: Arc<EntityFields>,
    transaction: Option<Arc<str>>,
    _row: PhantomData<fn() -> T>,
}

impl<T, P: ConnectionProvider> Clone for EntityModel<T, P> {
    fn clone(&self) -> Self {
        Self {
            orm: Arc::clone(&self.orm),
            table: Arc::clone(&self.table),
            fields: Arc::clone(&self.fields),
            transaction: self.transaction.clone(),
            _row: PhantomData,
        }
    }
}

impl<T, P: ConnectionProvider> std::fmt::Debug for EntityModel<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityModel")
            .field("table", &self.table)
            .field("fields", &self.fields.names().collect::<Vec<_>>())
            .field("transaction", &self.transaction)
            .finish()
    }
}

impl<T: DeserializeOwned, P: ConnectionProvider> EntityModel<T, P> {
    pub(crate) fn new(orm: Arc<OrmInner<P>>, table: &str, fields: EntityFields) -> Self {
        Self {
            orm,
            table: Arc::from(table),
            fields: Arc::new(fields),
            transaction: None,
            _row: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &EntityFields {
        &self.fields
    }

    /// The same table, decoding rows into `U`.
    pub fn with_row_type<U: DeserializeOwned>(&self) -> EntityModel<U, P> {
        EntityModel {
            orm: Arc::clone(&self.orm),
            table: Arc::clone(&self.table),
            fields: Arc::clone(&self.fields),
            transaction: self.transaction.clone(),
            _row: PhantomData,
        }
    }

    /// The same model, running every call on the given transaction.
    ///
    /// Calls fail with a conflict error once that transaction has ended.
    pub fn in_transaction(&self, transaction: &TransactionInfo) -> Self {
        Self {
            transaction: Some(Arc::from(transaction.transaction_id.as_str())),
            ..self.clone()
        }
    }

    /// Insert one row. The outcome carries the generated id.
    pub async fn create(&self, values: &Values) -> OrmResult<ExecOutcome> {
        self.orm
            .operation(&self.table, "create")
            .arg("values", values)
            .run(async {
                let statement = sql::build_insert(&self.table, values)?;
                self.execute(&statement).await
            })
            .await
    }

    /// Insert every row in one transaction. All rows or none.
    pub async fn create_many(&self, rows: &[Values]) -> OrmResult<Vec<ExecOutcome>> {
        self.orm
            .operation(&self.table, "create_many")
            .arg("rows", &rows)
            .run(async {
                let statements = rows
                    .iter()
                    .map(|values| sql::build_insert(&self.table, values))
                    .collect::<OrmResult<Vec<_>>>()?;
                self.run_batch(&statements).await
            })
            .await
    }

    pub async fn update(
        &self,
        id: impl Into<SqlValue>,
        values: &Values,
    ) -> OrmResult<ExecOutcome> {
        let id = id.into();
        self.orm
            .operation(&self.table, "update")
            .arg("id", &id)
            .arg("values", values)
            .run(async {
                let statement = sql::build_update(&self.table, id.clone(), values)?;
                self.execute(&statement).await
            })
            .await
    }

    /// Apply every `(id, values)` update in one transaction, in order.
    pub async fn update_many<I, K>(&self, updates: I) -> OrmResult<Vec<ExecOutcome>>
    where
        I: IntoIterator<Item = (K, Values)>,
        K: Into<SqlValue>,
    {
        let updates: Vec<(SqlValue, Values)> = updates
            .into_iter()
            .map(|(id, values)| (id.into(), values))
            .collect();
        self.orm
            .operation(&self.table, "update_many")
            .arg("updates", &updates)
            .run(async {
                let statements = updates
                    .iter()
                    .map(|(id, values)| sql::build_update(&self.table, id.clone(), values))
                    .collect::<OrmResult<Vec<_>>>()?;
                self.run_batch(&statements).await
            })
            .await
    }

    pub async fn delete(&self, id: impl Into<SqlValue>) -> OrmResult<ExecOutcome> {
        let id = id.into();
        self.orm
            .operation(&self.table, "delete")
            .arg("id", &id)
            .run(async {
                let statement = sql::build_delete(&self.table, id.clone());
                self.execute(&statement).await
            })
            .await
    }

    /// Delete every id in one transaction, committed once.
    pub async fn delete_many<I, K>(&self, ids: I) -> OrmResult<Vec<ExecOutcome>>
    where
        I: IntoIterator<Item = K>,
        K: Into<SqlValue>,
    {
        let ids: Vec<SqlValue> = ids.into_iter().map(Into::into).collect();
        self.orm
            .operation(&self.table, "delete_many")
            .arg("ids", &ids)
            .run(async {
                let statements: Vec<Statement> = ids
                    .iter()
                    .map(|id| sql::build_delete(&self.table, id.clone()))
                    .collect();
                self.run_batch(&statements).await
            })
            .await
    }

    /// Fetch one row by primary key. Empty `fields` selects every column.
    pub async fn find_by_id(
        &self,
        id: impl Into<SqlValue>,
        fields: &[&str],
    ) -> OrmResult<Option<T>> {
        let id = id.into();
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.orm
            .operation(&self.table, "find_by_id")
            .arg("id", &id)
            .arg("fields", &fields)
            .run(async {
                let statement = sql::build_select_by_id(&self.table, id.clone(), &fields);
                let rows = self.fetch(&statement).await?;
                rows.into_iter().next().map(|row| self.decode(row)).transpose()
            })
            .await
    }

    /// Rows matching `options`.
    ///
    /// Condition values are inlined as escaped literals rather than bound.
    pub async fn find(&self, options: &FindOptions) -> OrmResult<Vec<T>> {
        self.orm
            .operation(&self.table, "find")
            .arg("options", options)
            .run(async {
                let statement = sql::build_select(&self.table, options);
                let rows = self.fetch(&statement).await?;
                rows.into_iter().map(|row| self.decode(row)).collect()
            })
            .await
    }

    /// Join this table (left side) with `other`. Rows stay untyped since
    /// they span both tables.
    pub async fn join(
        &self,
        join_type: JoinType,
        other: &str,
        conditions: &[&str],
        fields: &[&str],
    ) -> OrmResult<Vec<Row>> {
        let spec = conditions
            .iter()
            .fold(JoinSpec::new(join_type, &*self.table, other), |spec, c| {
                spec.on(*c)
            })
            .select(fields.iter().copied());
        self.orm
            .operation(&self.table, "join")
            .arg("join", &spec)
            .run(async {
                let statement = sql::build_join(&spec)?;
                self.fetch(&statement).await
            })
            .await
    }

    /// Number of rows matching `conditions`.
    pub async fn count(&self, conditions: &ConditionMap) -> OrmResult<u64> {
        self.orm
            .operation(&self.table, "count")
            .arg("conditions", conditions)
            .run(async {
                let statement = sql::build_count(&self.table, conditions);
                let rows = self.fetch(&statement).await?;
                count_from_rows(&rows)
            })
            .await
    }

    async fn execute(&self, statement: &Statement) -> OrmResult<ExecOutcome> {
        match &self.transaction {
            Some(id) => {
                self.orm
                    .coordinator
                    .execute_in_transaction(id, statement)
                    .await
            }
            None => self.orm.execute(statement).await,
        }
    }

    async fn fetch(&self, statement: &Statement) -> OrmResult<Vec<Row>> {
        match &self.transaction {
            Some(id) => self.orm.coordinator.fetch_in_transaction(id, statement).await,
            None => self.orm.fetch(statement).await,
        }
    }

    /// Bulk writes get their own transaction unless the view is bound to one.
    async fn run_batch(&self, statements: &[Statement]) -> OrmResult<Vec<ExecOutcome>> {
        if self.transaction.is_none() {
            return self
                .orm
                .coordinator
                .run_batch(&self.orm.provider, statements)
                .await;
        }

        let mut outcomes = Vec::with_capacity(statements.len());
        for statement in statements {
            outcomes.push(self.execute(statement).await?);
        }
        Ok(outcomes)
    }

    fn decode(&self, row: Row) -> OrmResult<T> {
        serde_json::from_value(JsonValue::Object(row)).map_err(|e| {
            OrmError::schema(format!("Row does not match the target type: {}", e), &*self.table)
        })
    }
}
