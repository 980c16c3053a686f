//! SQLite storage implementation for Pennywise.
//!
//! This crate provides the persistent currency store using Diesel ORM with
//! SQLite. It implements the repository traits defined in `pennywise-core`:
//! - Database connection pooling and management
//! - Embedded Diesel migrations
//! - The single-writer actor that serializes all writes
//! - Database-specific model types (with Diesel derives)
//!
//! ```text
//! core (domain)      market-data (provider)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

pub mod fx;

pub use db::{
    create_pool, get_connection, get_db_path, init, open, run_migrations, spawn_writer,
    DbConnection, DbPool, WriteHandle,
};
pub use errors::{IntoCore, StorageError};
pub use fx::CurrencyRepository;

pub use pennywise_core::errors::{DatabaseError, Error, Result};
