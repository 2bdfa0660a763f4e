pub mod app;
pub mod auth;
pub mod config;
pub mod jwt;
pub mod repository;
pub mod services;
pub mod tx;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{App, Repositories};
pub use tx::{TransactionManager, TxContext};
