use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fx_errors::FxError;

/// Direction of the last rate change for a currency.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

impl Trend {
    /// Trend implied by the sign of `delta`.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Trend::Up
        } else if delta < 0.0 {
            Trend::Down
        } else {
            Trend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            "stable" => Ok(Trend::Stable),
            other => Err(format!("unknown trend '{}'", other)),
        }
    }
}

/// One exchange-rate record: how much of `code` one unit of `base_currency` buys.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub code: String,
    pub name: String,
    pub base_currency: String,
    pub rate: f64,
    pub trend: Trend,
    pub change: f64,
    pub change_percentage: f64,
    pub updated_at: DateTime<Utc>,
}

impl CurrencyRate {
    /// The record a base currency keeps for itself.
    pub fn base(code: &str, name: String, updated_at: DateTime<Utc>) -> Self {
        Self {
            code: code.to_string(),
            name,
            base_currency: code.to_string(),
            rate: crate::constants::BASE_RATE,
            trend: Trend::Stable,
            change: 0.0,
            change_percentage: 0.0,
            updated_at,
        }
    }

    pub fn is_base(&self) -> bool {
        self.code == self.base_currency
    }

    /// Fails unless the rate is a positive finite number.
    pub fn validate_rate(&self) -> Result<f64, FxError> {
        if self.rate.is_finite() && self.rate > 0.0 {
            Ok(self.rate)
        } else {
            Err(FxError::InvalidRate {
                code: self.code.clone(),
                rate: self.rate,
            })
        }
    }
}

/// Rates returned by one provider call, keyed by currency code.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    pub base_currency: String,
    pub rates: BTreeMap<String, f64>,
}

impl RateSnapshot {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into(),
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rate(mut self, code: impl Into<String>, rate: f64) -> Self {
        self.rates.insert(code.into(), rate);
        self
    }
}

/// Parameters of one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    pub api_key: String,
    pub currency_codes: Vec<String>,
    pub base_currency: String,
}

impl RateRequest {
    /// Codes as the provider expects them: comma-separated.
    pub fn currencies_param(&self) -> String {
        self.currency_codes.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_text_round_trips_through_storage_form() {
        for trend in [Trend::Up, Trend::Down, Trend::Stable] {
            assert_eq!(trend.as_str().parse::<Trend>(), Ok(trend));
        }
        assert!("sideways".parse::<Trend>().is_err());
    }

    #[test]
    fn test_trend_from_delta() {
        assert_eq!(Trend::from_delta(0.002), Trend::Up);
        assert_eq!(Trend::from_delta(-0.5), Trend::Down);
        assert_eq!(Trend::from_delta(0.0), Trend::Stable);
    }

    #[test]
    fn test_serializes_camel_case() {
        let rate = CurrencyRate::base("RUB", "Russian Ruble".to_string(), Utc::now());
        let json = serde_json::to_value(&rate).unwrap();
        assert_eq!(json["baseCurrency"], "RUB");
        assert_eq!(json["changePercentage"], 0.0);
        assert_eq!(json["trend"], "stable");
    }

    #[test]
    fn test_validate_rate_rejects_zero_and_nan() {
        let mut rate = CurrencyRate::base("USD", "US Dollar".to_string(), Utc::now());
        assert_eq!(rate.validate_rate(), Ok(1.0));
        rate.rate = 0.0;
        assert!(matches!(rate.validate_rate(), Err(FxError::InvalidRate { .. })));
        rate.rate = f64::NAN;
        assert!(rate.validate_rate().is_err());
    }

    #[test]
    fn test_request_joins_codes() {
        let request = RateRequest {
            api_key: "key".to_string(),
            currency_codes: vec!["USD".to_string(), "EUR".to_string()],
            base_currency: "RUB".to_string(),
        };
        assert_eq!(request.currencies_param(), "USD,EUR");
    }
}
