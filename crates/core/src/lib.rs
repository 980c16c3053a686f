//! Pennywise Core - reactive derived state and currency-rate synchronization.
//!
//! This crate contains the rate domain, the reactive graph the screens are
//! built on, and the filter/sort pipelines over it. It is database-agnostic
//! and defines traits that are implemented by the `storage-sqlite` and
//! `market-data` crates.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod expenses;
pub mod fx;
pub mod pipeline;
pub mod reactive;
pub mod session;
pub mod taxes;
pub mod utils;

pub use config::RatesConfig;
pub use session::{CurrencySession, SessionEvent};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
