//! Rate provider implementations.

pub mod freecurrencyapi;
