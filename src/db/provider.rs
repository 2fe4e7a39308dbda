//! Connection provider capability interface.
//!
//! The ORM never talks to the wire protocol directly. It acquires a
//! [`Connection`] from a [`ConnectionProvider`], runs statements on it and
//! lets it go. Dropping a connection returns it to the pool, so every exit
//! path (including `?` and panics) releases it.

use crate::error::OrmResult;
use crate::models::{ExecOutcome, Row, SqlValue};
use std::future::Future;

/// One pooled connection.
pub trait Connection: Send + 'static {
    /// Run a statement that produces no rows (INSERT/UPDATE/DELETE/DDL).
    fn execute(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = OrmResult<ExecOutcome>> + Send;

    /// Run a statement and collect its rows.
    fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    fn begin(&mut self) -> impl Future<Output = OrmResult<()>> + Send;

    fn commit(&mut self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(&mut self) -> impl Future<Output = OrmResult<()>> + Send;

    /// Give the connection back to its pool.
    fn release(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Source of pooled connections.
pub trait ConnectionProvider: Send + Sync + 'static {
    type Connection: Connection;

    fn acquire(&self) -> impl Future<Output = OrmResult<Self::Connection>> + Send;

    /// Close the pool. Connections still checked out finish their work first.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
