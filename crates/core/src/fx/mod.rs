//! FX (Foreign Exchange) module - rate records, sync, reconciliation and conversion.

pub mod currency_converter;
pub mod currency_filter;
pub mod currency_names;
mod fx_errors;
mod fx_model;
#[cfg(test)]
pub(crate) mod fx_test_support;
mod fx_traits;
mod memory_repository;
pub mod reconciler;
mod sync;

pub use currency_converter::CurrencyConverter;
pub use currency_filter::{CurrencyCriteria, CurrencyFilters, CurrencySortOrder};
pub use currency_names::{currency_name, LocaleFamily};
pub use fx_errors::{FxError, SyncError};
pub use fx_model::{CurrencyRate, RateRequest, RateSnapshot, Trend};
pub use fx_traits::{CurrencyRepositoryTrait, RateProvider};
pub use memory_repository::InMemoryCurrencyRepository;
pub use reconciler::{reconcile, RateReconciler};
pub use sync::{RateSyncService, SyncOutcome};
