//! In-memory connection provider for integration tests.
//!
//! Writes made outside a transaction are committed immediately. Writes made
//! between BEGIN and COMMIT stay pending on the connection and are discarded
//! by ROLLBACK, so tests can check what would have been visible.

#![allow(dead_code)]

use fluent_orm::models::{ExecOutcome, Row, SqlValue, Statement};
use fluent_orm::{Connection, ConnectionProvider, Orm, OrmConfig, OrmError, OrmResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MockState {
    /// Every SQL string sent, including BEGIN/COMMIT/ROLLBACK.
    pub executed: Vec<String>,
    /// Writes that reached a committed state.
    pub committed: Vec<Statement>,
    /// Result sets handed out by `fetch`, oldest first.
    pub queued_rows: VecDeque<Vec<Row>>,
    /// Fail any statement whose SQL contains this, or that binds it as a string.
    pub fail_on: Option<String>,
    /// Never finish a write whose SQL contains this.
    pub stall_on: Option<String>,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub acquired: usize,
    pub released: usize,
    pub closed: bool,
    next_insert_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn fail_on(&self, pattern: &str) {
        self.state().fail_on = Some(pattern.to_string());
    }

    pub fn stall_on(&self, pattern: &str) {
        self.state().stall_on = Some(pattern.to_string());
    }

    pub fn queue_rows(&self, rows: Vec<Row>) {
        self.state().queued_rows.push_back(rows);
    }

    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn committed(&self) -> Vec<Statement> {
        self.state().committed.clone()
    }
}

impl ConnectionProvider for MockProvider {
    type Connection = MockConnection;

    async fn acquire(&self) -> OrmResult<MockConnection> {
        self.state().acquired += 1;
        Ok(MockConnection {
            state: Arc::clone(&self.state),
            in_transaction: false,
            pending: Vec::new(),
        })
    }

    async fn close(&self) {
        self.state().closed = true;
    }
}

#[derive(Debug)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
    in_transaction: bool,
    pending: Vec<Statement>,
}

impl MockConnection {
    fn record(&self, sql: &str, params: &[SqlValue]) -> OrmResult<()> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(sql.to_string());

        let Some(pattern) = state.fail_on.as_deref() else {
            return Ok(());
        };
        let hit = sql.contains(pattern)
            || params
                .iter()
                .any(|p| matches!(p, SqlValue::String(s) if s == pattern));
        if hit {
            return Err(OrmError::driver(
                format!("Simulated failure on '{}'", pattern),
                Some("23000".to_string()),
            ));
        }
        Ok(())
    }
}

impl Connection for MockConnection {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> OrmResult<ExecOutcome> {
        self.record(sql, params)?;
        let stall = self
            .state
            .lock()
            .unwrap()
            .stall_on
            .as_deref()
            .is_some_and(|pattern| sql.contains(pattern));
        if stall {
            std::future::pending::<()>().await;
        }

        let statement = Statement::new(sql, params.to_vec());
        let last_insert_id = if sql.starts_with("INSERT") {
            let mut state = self.state.lock().unwrap();
            state.next_insert_id += 1;
            Some(state.next_insert_id)
        } else {
            None
        };

        if self.in_transaction {
            self.pending.push(statement);
        } else {
            self.state.lock().unwrap().committed.push(statement);
        }
        Ok(ExecOutcome::new(1, last_insert_id))
    }

    async fn fetch(&mut self, sql: &str, params: &[SqlValue]) -> OrmResult<Vec<Row>> {
        self.record(sql, params)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .queued_rows
            .pop_front()
            .unwrap_or_default())
    }

    async fn begin(&mut self) -> OrmResult<()> {
        self.record("BEGIN", &[])?;
        self.state.lock().unwrap().begins += 1;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> OrmResult<()> {
        self.record("COMMIT", &[])?;
        let mut state = self.state.lock().unwrap();
        state.commits += 1;
        state.committed.append(&mut self.pending);
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.record("ROLLBACK", &[])?;
        self.state.lock().unwrap().rollbacks += 1;
        self.pending.clear();
        self.in_transaction = false;
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.released += 1;
        }
    }
}

pub fn config() -> OrmConfig {
    OrmConfig::new("localhost", "test", "secret", "test_db").with_logging(true)
}

/// An ORM over a fresh mock, plus a handle to inspect the mock.
pub fn mock_orm() -> (Orm<MockProvider>, MockProvider) {
    mock_orm_with(config())
}

pub fn mock_orm_with(config: OrmConfig) -> (Orm<MockProvider>, MockProvider) {
    let provider = MockProvider::new();
    (Orm::with_provider(provider.clone(), config), provider)
}

/// Build a result row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
