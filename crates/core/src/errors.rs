//! Error types shared by every Pennywise crate.
//!
//! The storage crate flattens Diesel and r2d2 failures into [`DatabaseError`];
//! the provider crate folds HTTP failures into [`SyncError`].

use thiserror::Error;

use crate::fx::{FxError, SyncError};
use crate::reactive::GraphError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the rates core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Rate sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid reactive graph: {0}")]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Async runtime unavailable: {0}")]
    Runtime(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Storage failures with the backend detail flattened to text.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A second row for the same `(code, base_currency)`.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
