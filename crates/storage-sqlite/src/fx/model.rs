//! Database model for stored currency rates.

use chrono::{NaiveDateTime, TimeZone, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use pennywise_core::fx::{CurrencyRate, Trend};

/// One row per `(code, base_currency)`.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::currencies)]
#[diesel(primary_key(code, base_currency))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CurrencyDB {
    pub code: String,
    pub name: String,
    pub base_currency: String,
    pub rate: f64,
    pub trend: String,
    pub change: f64,
    pub change_percentage: f64,
    pub updated_at: NaiveDateTime,
}

impl From<CurrencyDB> for CurrencyRate {
    fn from(db: CurrencyDB) -> Self {
        let trend = db.trend.parse::<Trend>().unwrap_or_else(|_| {
            log::warn!(
                "Unknown trend '{}' stored for {}/{}, reading it as stable",
                db.trend,
                db.code,
                db.base_currency
            );
            Trend::Stable
        });
        Self {
            code: db.code,
            name: db.name,
            base_currency: db.base_currency,
            rate: db.rate,
            trend,
            change: db.change,
            change_percentage: db.change_percentage,
            updated_at: Utc.from_utc_datetime(&db.updated_at),
        }
    }
}

impl From<CurrencyRate> for CurrencyDB {
    fn from(domain: CurrencyRate) -> Self {
        Self {
            code: domain.code,
            name: domain.name,
            base_currency: domain.base_currency,
            rate: domain.rate,
            trend: domain.trend.as_str().to_string(),
            change: domain.change,
            change_percentage: domain.change_percentage,
            updated_at: domain.updated_at.naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_trend_reads_as_stable() {
        let row = CurrencyDB {
            code: "USD".to_string(),
            name: "US Dollar".to_string(),
            base_currency: "RUB".to_string(),
            rate: 0.011,
            trend: "sideways".to_string(),
            change: 0.0,
            change_percentage: 0.0,
            updated_at: Utc::now().naive_utc(),
        };
        assert_eq!(CurrencyRate::from(row).trend, Trend::Stable);
    }

    #[test]
    fn test_trend_is_stored_lowercase() {
        let mut rate = CurrencyRate::base("RUB", "Российский рубль".to_string(), Utc::now());
        rate.trend = Trend::Down;
        assert_eq!(CurrencyDB::from(rate).trend, "down");
    }
}
