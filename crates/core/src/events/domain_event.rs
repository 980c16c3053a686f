//! Domain event types.

use serde::{Deserialize, Serialize};

/// Domain events emitted by core services after a sync pass.
///
/// These events represent facts about rate data. Embedding applications
/// translate them into platform-specific actions (notifications, widget
/// refresh, analytics recalculation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Fresh rates were fetched and written to the store.
    CurrencyRatesSynced {
        base_currency: String,
        /// Codes written in this pass, the base currency included.
        currency_codes: Vec<String>,
    },

    /// A sync pass failed; the store was left untouched.
    CurrencyRatesSyncFailed { base_currency: String, error: String },
}

impl DomainEvent {
    /// Creates a CurrencyRatesSynced event.
    pub fn rates_synced(base_currency: String, currency_codes: Vec<String>) -> Self {
        Self::CurrencyRatesSynced {
            base_currency,
            currency_codes,
        }
    }

    /// Creates a CurrencyRatesSyncFailed event.
    pub fn rates_sync_failed(base_currency: String, error: String) -> Self {
        Self::CurrencyRatesSyncFailed {
            base_currency,
            error,
        }
    }
}
