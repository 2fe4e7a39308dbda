//! Transaction coordinator.
//!
//! Each ORM instance owns one coordinator, and the coordinator holds at most
//! one active transaction. The transaction keeps a dedicated connection from
//! `begin` until `commit` or `rollback`, which clear the slot before anything
//! else can start a new transaction.
//!
//! State machine: Idle → Active → (Committed | RolledBack) → Idle. A second
//! `begin` while Active is rejected with a conflict error; `commit` and
//! `rollback` while Idle do nothing.
//!
//! A bulk write whose future is dropped mid-transaction rolls its own
//! transaction back on a spawned task, so the instance returns to Idle.

use crate::db::provider::{Connection, ConnectionProvider};
use crate::error::{OrmError, OrmResult};
use crate::models::{ExecOutcome, Row, Statement};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Identity of an active transaction, returned by `begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    /// Unique transaction identifier
    pub transaction_id: String,
    /// When the transaction started
    pub started_at: DateTime<Utc>,
}

struct ActiveTransaction<C> {
    info: TransactionInfo,
    connection: C,
}

type Slot<C> = Arc<Mutex<Option<ActiveTransaction<C>>>>;

pub struct TransactionCoordinator<C> {
    state: Slot<C>,
}

impl<C: Connection> TransactionCoordinator<C> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// Acquire a connection, issue BEGIN and become Active.
    pub async fn begin<P>(&self, provider: &P) -> OrmResult<TransactionInfo>
    where
        P: ConnectionProvider<Connection = C>,
    {
        let mut state = self.state.lock().await;
        if let Some(active) = &*state {
            return Err(OrmError::conflict(format!(
                "Transaction {} is already active on this instance",
                active.info.transaction_id
            )));
        }

        // A failed BEGIN drops the connection, which releases it.
        let mut connection = provider.acquire().await?;
        connection.begin().await?;

        let info = TransactionInfo {
            transaction_id: generate_transaction_id(),
            started_at: Utc::now(),
        };
        *state = Some(ActiveTransaction {
            info: info.clone(),
            connection,
        });

        info!(transaction_id = %info.transaction_id, "Transaction started");
        Ok(info)
    }

    /// Issue COMMIT and release the connection. No-op when Idle.
    ///
    /// If COMMIT fails a best-effort ROLLBACK is attempted; the connection is
    /// released either way and the COMMIT error is returned.
    pub async fn commit(&self) -> OrmResult<()> {
        let Some(active) = self.state.lock().await.take() else {
            debug!("Commit requested with no active transaction");
            return Ok(());
        };
        Self::commit_active(active).await
    }

    /// Issue ROLLBACK and release the connection. No-op when Idle.
    pub async fn rollback(&self) -> OrmResult<()> {
        let Some(active) = self.state.lock().await.take() else {
            debug!("Rollback requested with no active transaction");
            return Ok(());
        };
        Self::rollback_active(active).await
    }

    async fn commit_active(mut active: ActiveTransaction<C>) -> OrmResult<()> {
        let transaction_id = active.info.transaction_id;
        match active.connection.commit().await {
            Ok(()) => {
                active.connection.release();
                info!(transaction_id = %transaction_id, "Transaction committed");
                Ok(())
            }
            Err(e) => {
                warn!(
                    transaction_id = %transaction_id,
                    error = %e,
                    "Commit failed, rolling back"
                );
                // Best effort rollback - the commit error is what the caller sees
                let _ = active.connection.rollback().await;
                active.connection.release();
                Err(e)
            }
        }
    }

    async fn rollback_active(mut active: ActiveTransaction<C>) -> OrmResult<()> {
        let transaction_id = active.info.transaction_id;
        let result = active.connection.rollback().await;
        active.connection.release();
        match &result {
            Ok(()) => info!(transaction_id = %transaction_id, "Transaction rolled back"),
            Err(e) => warn!(transaction_id = %transaction_id, error = %e, "Rollback failed"),
        }
        result
    }

    /// Clear the slot, but only if it still holds `transaction_id`.
    async fn take_matching(&self, transaction_id: &str) -> OrmResult<ActiveTransaction<C>> {
        let mut state = self.state.lock().await;
        Self::validate(&mut state, transaction_id)?;
        state.take().ok_or_else(|| {
            OrmError::conflict(format!("Transaction {} is no longer active", transaction_id))
        })
    }

    /// Run a write statement on the active transaction's connection.
    pub async fn execute_in_transaction(
        &self,
        transaction_id: &str,
        statement: &Statement,
    ) -> OrmResult<ExecOutcome> {
        let mut state = self.state.lock().await;
        let active = Self::validate(&mut state, transaction_id)?;
        let outcome = active
            .connection
            .execute(&statement.sql, &statement.params)
            .await?;

        debug!(
            transaction_id = %transaction_id,
            sql = %statement.sql,
            rows_affected = outcome.rows_affected,
            "Executed in transaction"
        );
        Ok(outcome)
    }

    /// Run a query on the active transaction's connection.
    pub async fn fetch_in_transaction(
        &self,
        transaction_id: &str,
        statement: &Statement,
    ) -> OrmResult<Vec<Row>> {
        let mut state = self.state.lock().await;
        let active = Self::validate(&mut state, transaction_id)?;
        let rows = active
            .connection
            .fetch(&statement.sql, &statement.params)
            .await?;

        debug!(
            transaction_id = %transaction_id,
            sql = %statement.sql,
            row_count = rows.len(),
            "Queried in transaction"
        );
        Ok(rows)
    }

    /// Run every statement in one transaction, in order.
    ///
    /// The first failure rolls the whole batch back and is returned; otherwise
    /// the batch commits exactly once. An empty batch touches nothing.
    pub async fn run_batch<P>(
        &self,
        provider: &P,
        statements: &[Statement],
    ) -> OrmResult<Vec<ExecOutcome>>
    where
        P: ConnectionProvider<Connection = C>,
    {
        if statements.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.begin(provider).await?;
        let mut guard = BatchGuard {
            state: Arc::clone(&self.state),
            transaction_id: Some(tx.transaction_id.clone()),
        };
        let mut outcomes = Vec::with_capacity(statements.len());
        for (index, statement) in statements.iter().enumerate() {
            match self.execute_in_transaction(&tx.transaction_id, statement).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(
                        transaction_id = %tx.transaction_id,
                        row = index,
                        error = %e,
                        "Batch statement failed, rolling back"
                    );
                    // Someone else may have ended the transaction; leave any successor alone.
                    let taken = self.take_matching(&tx.transaction_id).await;
                    guard.disarm();
                    if let Ok(active) = taken {
                        if let Err(rollback_err) = Self::rollback_active(active).await {
                            warn!(error = %rollback_err, "Rollback after batch failure also failed");
                        }
                    }
                    return Err(e);
                }
            }
        }

        let taken = self.take_matching(&tx.transaction_id).await;
        guard.disarm();
        Self::commit_active(taken?).await?;
        Ok(outcomes)
    }

    /// Whether a transaction is currently active.
    pub async fn is_active(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Info about the active transaction, if any.
    pub async fn current(&self) -> Option<TransactionInfo> {
        let state = self.state.lock().await;
        state.as_ref().map(|a| a.info.clone())
    }

    /// Check that `transaction_id` names the active transaction.
    fn validate<'a>(
        active: &'a mut Option<ActiveTransaction<C>>,
        transaction_id: &str,
    ) -> OrmResult<&'a mut ActiveTransaction<C>> {
        match active.as_mut() {
            Some(active) if active.info.transaction_id == transaction_id => Ok(active),
            Some(active) => Err(OrmError::conflict(format!(
                "Transaction {} is not the active transaction ({})",
                transaction_id, active.info.transaction_id
            ))),
            None => Err(OrmError::conflict(format!(
                "Transaction {} is no longer active",
                transaction_id
            ))),
        }
    }
}

/// Take the slot's transaction if it is still `transaction_id`.
fn take_if_current<C>(
    slot: &mut Option<ActiveTransaction<C>>,
    transaction_id: &str,
) -> Option<ActiveTransaction<C>> {
    let current = slot
        .as_ref()
        .is_some_and(|active| active.info.transaction_id == transaction_id);
    if current {
        slot.take()
    } else {
        None
    }
}

/// Owns a batch's transaction until the batch takes it back from the slot.
///
/// Dropped while armed, it rolls that transaction back in the background.
struct BatchGuard<C: Connection> {
    state: Slot<C>,
    transaction_id: Option<String>,
}

impl<C: Connection> BatchGuard<C> {
    fn disarm(&mut self) {
        self.transaction_id = None;
    }
}

impl<C: Connection> Drop for BatchGuard<C> {
    fn drop(&mut self) {
        let Some(transaction_id) = self.transaction_id.take() else {
            return;
        };
        warn!(transaction_id = %transaction_id, "Batch abandoned, rolling back");

        let state = Arc::clone(&self.state);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let active = take_if_current(&mut *state.lock().await, &transaction_id);
                    if let Some(active) = active {
                        let _ = TransactionCoordinator::<C>::rollback_active(active).await;
                    }
                });
            }
            // No runtime left to send ROLLBACK; dropping the connection still frees the slot.
            Err(_) => {
                if let Ok(mut slot) = state.try_lock() {
                    drop(take_if_current(&mut *slot, &transaction_id));
                }
            }
        }
    }
}

impl<C: Connection> Default for TransactionCoordinator<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a unique transaction ID.
fn generate_transaction_id() -> String {
    format!("tx_{}", uuid::Uuid::new_v4().simple())
}
