use super::fx_errors::SyncError;
use super::fx_model::{CurrencyRate, RateRequest, RateSnapshot};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait defining the contract for currency store operations.
///
/// There is exactly one record per `(code, base_currency)`; records are never
/// deleted.
#[async_trait]
pub trait CurrencyRepositoryTrait: Send + Sync {
    /// All records quoted against `base_currency`, ordered by code.
    fn list_by_base(&self, base_currency: &str) -> Result<Vec<CurrencyRate>>;

    fn get_by_code(&self, code: &str, base_currency: &str) -> Result<Option<CurrencyRate>>;

    /// Newest `updated_at` among the records for `base_currency`.
    fn latest_update(&self, base_currency: &str) -> Result<Option<DateTime<Utc>>>;

    /// Inserts or replaces every record as one atomic unit. Returns the number
    /// of records written.
    async fn upsert_batch(&self, rates: Vec<CurrencyRate>) -> Result<usize>;
}

/// A remote source of current exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &'static str;

    async fn latest_rates(
        &self,
        request: &RateRequest,
    ) -> std::result::Result<RateSnapshot, SyncError>;
}
