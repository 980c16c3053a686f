//! Merges a fetched rate snapshot into the stored records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::currency_names::{currency_name, LocaleFamily};
use super::fx_model::{CurrencyRate, RateSnapshot, Trend};
use super::fx_traits::CurrencyRepositoryTrait;
use crate::errors::Result;

/// Computes the records to write for one sync pass.
///
/// `existing` are the stored records for `base_currency`. The result holds the
/// base currency's own record plus one record per usable snapshot code; codes
/// that are stored but missing from the snapshot are not part of it and stay
/// untouched.
pub fn reconcile(
    existing: &[CurrencyRate],
    snapshot: &RateSnapshot,
    base_currency: &str,
    now: DateTime<Utc>,
) -> Vec<CurrencyRate> {
    let locale = LocaleFamily::for_base(base_currency);
    let stored: HashMap<&str, &CurrencyRate> = existing
        .iter()
        .filter(|rate| rate.base_currency == base_currency)
        .map(|rate| (rate.code.as_str(), rate))
        .collect();

    let base_name = stored
        .get(base_currency)
        .map(|rate| rate.name.clone())
        .unwrap_or_else(|| currency_name(base_currency, locale));
    let mut updates = vec![CurrencyRate::base(base_currency, base_name, now)];

    for (code, &new_rate) in &snapshot.rates {
        if code == base_currency {
            continue;
        }
        if !new_rate.is_finite() || new_rate < 0.0 {
            log::warn!(
                "Skipping unusable rate {} for {}/{} from snapshot",
                new_rate,
                code,
                base_currency
            );
            continue;
        }

        let record = match stored.get(code.as_str()) {
            None => CurrencyRate {
                code: code.clone(),
                name: currency_name(code, locale),
                base_currency: base_currency.to_string(),
                rate: new_rate,
                trend: Trend::Stable,
                change: 0.0,
                change_percentage: 0.0,
                updated_at: now,
            },
            Some(old) => {
                let delta = new_rate - old.rate;
                let mut next = (*old).clone();
                if delta != 0.0 {
                    next.change = delta;
                    next.change_percentage = if old.rate != 0.0 {
                        delta / old.rate * 100.0
                    } else {
                        0.0
                    };
                }
                next.rate = new_rate;
                next.trend = Trend::from_delta(delta);
                next.updated_at = now;
                next
            }
        };
        updates.push(record);
    }

    updates
}

/// Applies snapshots to a currency store.
#[derive(Clone)]
pub struct RateReconciler {
    repository: Arc<dyn CurrencyRepositoryTrait>,
}

impl RateReconciler {
    pub fn new(repository: Arc<dyn CurrencyRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn CurrencyRepositoryTrait> {
        &self.repository
    }

    /// Reconciles `snapshot` against the store and writes the result as one
    /// batch. Returns the store contents for `base_currency` afterwards.
    pub async fn apply(
        &self,
        snapshot: &RateSnapshot,
        base_currency: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CurrencyRate>> {
        let existing = self.repository.list_by_base(base_currency)?;
        let updates = reconcile(&existing, snapshot, base_currency, now);
        let written = self.repository.upsert_batch(updates).await?;
        log::debug!(
            "Reconciled {} rate records for base {}",
            written,
            base_currency
        );
        self.repository.list_by_base(base_currency)
    }
}
