//! Ambient transactions.
//!
//! A [`TxContext`] travels down a call chain by reference. The outermost
//! [`TransactionManager`] call that finds no transaction in it opens one,
//! attaches it and owns its termination; every nested call joins it.

use std::{any::Any, sync::Arc};

use moviebase_types::Result;

mod context;
mod manager;

pub use context::TxContext;
pub use manager::TransactionManager;

/// A live database transaction shared by every call of one chain.
#[async_trait::async_trait]
pub trait Transaction: Send + Sync {
    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;

    /// Gives the transaction up without waiting on the backend.
    /// Called when the owning unit of work is dropped before it finished.
    /// No-op once committed or rolled back.
    fn abort(&self);

    fn as_any(&self) -> &dyn Any;
}

pub type SharedTransaction = Arc<dyn Transaction>;

/// Opens transactions, usually backed by a connection pool.
#[async_trait::async_trait]
pub trait TransactionSource: Send + Sync {
    async fn begin(&self) -> Result<SharedTransaction>;
}
