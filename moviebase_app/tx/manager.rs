use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::time::timeout_at;
use tracing::{debug, error, warn};

use moviebase_types::{Result, errors::DbError};

use super::{SharedTransaction, TransactionSource, TxContext};

/// Join-or-create policy for units of work.
///
/// Holds no per-call state: the context passed to each call decides whether
/// the call owns a new transaction or joins the one already open upstream.
#[derive(Clone)]
pub struct TransactionManager {
    source: Arc<dyn TransactionSource>,
}

impl TransactionManager {
    pub fn new(source: Arc<dyn TransactionSource>) -> Self {
        Self { source }
    }

    /// Runs `body` in the ambient transaction, opening one if `ctx` has none.
    pub async fn use_transaction<F, Fut>(&self, ctx: &TxContext, body: F) -> Result<()>
    where
        F: FnOnce(TxContext) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.in_transaction(ctx, body).await
    }

    /// Like [`use_transaction`](Self::use_transaction), returning the body's value.
    ///
    /// When this call owns the transaction it commits on `Ok`, rolls back on
    /// `Err` or panic (the panic is resumed afterwards) and aborts it if the
    /// returned future is dropped before completion.
    pub async fn in_transaction<T, F, Fut>(&self, ctx: &TxContext, body: F) -> Result<T>
    where
        F: FnOnce(TxContext) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if ctx.transaction().is_some() {
            // Joined calls keep their own deadline; expiry fails the body
            // and the owner rolls back.
            return match ctx.deadline() {
                Some(deadline) => timeout_at(deadline, body(ctx.clone()))
                    .await
                    .unwrap_or_else(|_| Err(DbError::DeadlineExceeded.into())),
                None => body(ctx.clone()).await,
            };
        }

        let deadline = ctx.deadline();
        let tx = match deadline {
            Some(deadline) => timeout_at(deadline, self.source.begin())
                .await
                .map_err(|_| DbError::DeadlineExceeded)??,
            None => self.source.begin().await?,
        };
        let guard = AbortOnDrop(Some(tx.clone()));
        let scoped = ctx.attach(tx.clone());

        let run = AssertUnwindSafe(async move { body(scoped).await }).catch_unwind();
        let outcome = match deadline {
            Some(deadline) => timeout_at(deadline, run)
                .await
                .unwrap_or_else(|_| Ok(Err(DbError::DeadlineExceeded.into()))),
            None => run.await,
        };

        let result = match outcome {
            Ok(Ok(value)) => match tx.commit().await {
                Ok(()) => {
                    debug!("transaction committed");
                    Ok(value)
                }
                Err(commit_err) => {
                    error!(error = %commit_err, "commit failed, rolling back");
                    rollback(&tx).await;
                    Err(commit_err)
                }
            },
            Ok(Err(err)) => {
                debug!(error = %err, "unit of work failed, rolling back");
                rollback(&tx).await;
                Err(err)
            }
            Err(panic) => {
                error!("unit of work panicked, rolling back");
                rollback(&tx).await;
                guard.disarm();
                std::panic::resume_unwind(panic);
            }
        };
        guard.disarm();
        result
    }
}

async fn rollback(tx: &SharedTransaction) {
    if let Err(err) = tx.rollback().await {
        error!(error = %err, "rollback failed");
    }
}

struct AbortOnDrop(Option<SharedTransaction>);

impl AbortOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            warn!("unit of work dropped before completion, aborting transaction");
            tx.abort();
        }
    }
}
