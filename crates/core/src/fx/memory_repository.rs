use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::fx_model::CurrencyRate;
use super::fx_traits::CurrencyRepositoryTrait;
use crate::errors::{DatabaseError, Result};

type Key = (String, String);

/// Currency store kept in process memory.
///
/// Keyed by `(base_currency, code)` so listing one base is a range scan that
/// comes back ordered by code.
#[derive(Debug, Default)]
pub struct InMemoryCurrencyRepository {
    records: RwLock<BTreeMap<Key, CurrencyRate>>,
}

impl InMemoryCurrencyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rates(rates: impl IntoIterator<Item = CurrencyRate>) -> Self {
        let records = rates
            .into_iter()
            .map(|rate| ((rate.base_currency.clone(), rate.code.clone()), rate))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> DatabaseError {
    DatabaseError::Internal(format!("currency store lock poisoned: {}", e))
}

#[async_trait]
impl CurrencyRepositoryTrait for InMemoryCurrencyRepository {
    fn list_by_base(&self, base_currency: &str) -> Result<Vec<CurrencyRate>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .values()
            .filter(|rate| rate.base_currency == base_currency)
            .cloned()
            .collect())
    }

    fn get_by_code(&self, code: &str, base_currency: &str) -> Result<Option<CurrencyRate>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .get(&(base_currency.to_string(), code.to_string()))
            .cloned())
    }

    fn latest_update(&self, base_currency: &str) -> Result<Option<DateTime<Utc>>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .values()
            .filter(|rate| rate.base_currency == base_currency)
            .map(|rate| rate.updated_at)
            .max())
    }

    async fn upsert_batch(&self, rates: Vec<CurrencyRate>) -> Result<usize> {
        // One write guard for the whole batch: readers see all of it or none.
        let mut records = self.records.write().map_err(poisoned)?;
        let count = rates.len();
        for rate in rates {
            records.insert((rate.base_currency.clone(), rate.code.clone()), rate);
        }
        Ok(count)
    }
}
