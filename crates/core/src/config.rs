use std::time::Duration;

use crate::constants::{
    DEFAULT_BASE_CURRENCY, DEFAULT_PROVIDER_BASE_URL, DEFAULT_RATES_TTL_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS, SUPPORTED_CURRENCIES,
};
use crate::reactive::DEFAULT_WORKER_COUNT;

/// Settings for rate sync and the session that drives it.
#[derive(Debug, Clone, PartialEq)]
pub struct RatesConfig {
    pub api_key: String,
    pub provider_base_url: String,
    pub currencies: Vec<String>,
    pub base_currency: String,
    pub ttl: Duration,
    pub request_timeout: Duration,
    pub worker_count: usize,
    pub db_path: String,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            provider_base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            currencies: SUPPORTED_CURRENCIES.iter().map(|c| c.to_string()).collect(),
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            ttl: Duration::from_secs(DEFAULT_RATES_TTL_SECS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            worker_count: DEFAULT_WORKER_COUNT,
            db_path: "./db/pennywise.db".to_string(),
        }
    }
}

impl RatesConfig {
    /// Reads `PENNYWISE_*` variables, loading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their
    /// defaults; unparsable numbers fall back with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_key = lookup("PENNYWISE_API_KEY").unwrap_or(defaults.api_key);
        let provider_base_url = lookup("PENNYWISE_PROVIDER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.provider_base_url);
        let currencies = lookup("PENNYWISE_CURRENCIES")
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.currencies);
        let base_currency = lookup("PENNYWISE_BASE_CURRENCY")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_currency);
        let ttl_secs = parse_or(
            &lookup,
            "PENNYWISE_RATES_TTL_SECS",
            defaults.ttl.as_secs(),
        );
        let timeout_ms = parse_or(
            &lookup,
            "PENNYWISE_REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT_MS,
        );
        let worker_count = parse_or(&lookup, "PENNYWISE_WORKERS", defaults.worker_count).max(1);
        let db_path = lookup("PENNYWISE_DB_PATH").unwrap_or(defaults.db_path);

        Self {
            api_key,
            provider_base_url,
            currencies,
            base_currency,
            ttl: Duration::from_secs(ttl_secs),
            request_timeout: Duration::from_millis(timeout_ms),
            worker_count,
            db_path,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
