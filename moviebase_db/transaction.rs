use std::{any::Any, sync::Arc};

use sqlx::{PgConnection, PgPool, Postgres};
use tokio::sync::{Mutex, MutexGuard};

use moviebase_app::tx::{SharedTransaction, Transaction, TransactionSource, TxContext};
use moviebase_types::{
    Result,
    errors::{ApplicationError, DbError},
};

#[derive(Debug, Clone)]
pub struct PgTransactionSource {
    pool: PgPool,
}

impl PgTransactionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TransactionSource for PgTransactionSource {
    async fn begin(&self) -> Result<SharedTransaction> {
        let tx = self.pool.begin().await.map_err(DbError::Database)?;
        Ok(Arc::new(PgTransaction {
            inner: Mutex::new(Some(tx)),
        }))
    }
}

/// An open Postgres transaction. `None` once committed, rolled back or aborted.
pub struct PgTransaction {
    inner: Mutex<Option<sqlx::Transaction<'static, Postgres>>>,
}

/// Exclusive access to the connection of a [`PgTransaction`].
pub struct PgConnectionGuard<'a>(MutexGuard<'a, Option<sqlx::Transaction<'static, Postgres>>>);

impl PgConnectionGuard<'_> {
    pub fn conn(&mut self) -> Result<&mut PgConnection> {
        self.0.as_deref_mut().ok_or_else(finished)
    }
}

impl PgTransaction {
    /// The Postgres transaction carried by `ctx`.
    pub fn from_context(ctx: &TxContext) -> Result<&PgTransaction> {
        ctx.transaction()
            .and_then(|tx| tx.as_any().downcast_ref::<PgTransaction>())
            .ok_or_else(|| {
                DbError::Transaction("no postgres transaction in context".to_string()).into()
            })
    }

    pub async fn lock(&self) -> PgConnectionGuard<'_> {
        PgConnectionGuard(self.inner.lock().await)
    }
}

fn finished() -> ApplicationError {
    DbError::Transaction("transaction already finished".to_string()).into()
}

#[async_trait::async_trait]
impl Transaction for PgTransaction {
    async fn commit(&self) -> Result<()> {
        let tx = self.inner.lock().await.take().ok_or_else(finished)?;
        tx.commit().await.map_err(DbError::Database)?;
        Ok(())
    }

    /// Rolling back after a failed commit finds nothing left to undo: the
    /// server already discarded the transaction.
    async fn rollback(&self) -> Result<()> {
        match self.inner.lock().await.take() {
            Some(tx) => Ok(tx.rollback().await.map_err(DbError::Database)?),
            None => Ok(()),
        }
    }

    fn abort(&self) {
        // sqlx rolls the transaction back when it is dropped.
        if let Ok(mut inner) = self.inner.try_lock() {
            inner.take();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
