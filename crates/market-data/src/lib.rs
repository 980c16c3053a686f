//! Remote exchange-rate provider for Pennywise.
//!
//! Implements [`pennywise_core::fx::RateProvider`] over HTTP. Provider
//! failures are reported as [`RateProviderError`] and folded into the
//! core [`SyncError`](pennywise_core::fx::SyncError) at the trait boundary.

pub mod errors;
pub mod provider;

pub use errors::RateProviderError;
pub use provider::freecurrencyapi::FreeCurrencyApiProvider;
