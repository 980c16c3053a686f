//! Client for freecurrencyapi-compatible `v1/latest` endpoints.
//!
//! `GET {base_url}/v1/latest?apikey=..&currencies=..&base_currency=..`
//! answers `{"data": {"USD": 0.011, ...}}`, one rate per requested code,
//! quoted as units of that currency per one unit of the base.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use pennywise_core::constants::{DEFAULT_PROVIDER_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS};
use pennywise_core::fx::{RateProvider, RateRequest, RateSnapshot, SyncError};
use pennywise_core::RatesConfig;

use crate::errors::RateProviderError;

const PROVIDER_ID: &str = "FREECURRENCYAPI";

#[derive(Debug, Deserialize)]
struct LatestResponse {
    data: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

pub struct FreeCurrencyApiProvider {
    client: Client,
    base_url: String,
}

impl Default for FreeCurrencyApiProvider {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROVIDER_BASE_URL,
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }
}

impl FreeCurrencyApiProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &RatesConfig) -> Self {
        Self::new(&config.provider_base_url, config.request_timeout)
    }

    fn latest_url(&self) -> String {
        format!("{}/v1/latest", self.base_url)
    }

    fn query(request: &RateRequest) -> [(&'static str, String); 3] {
        [
            ("apikey", request.api_key.clone()),
            ("currencies", request.currencies_param()),
            ("base_currency", request.base_currency.clone()),
        ]
    }

    async fn fetch(&self, request: &RateRequest) -> Result<RateSnapshot, RateProviderError> {
        let response = self
            .client
            .get(self.latest_url())
            .query(&Self::query(request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        parse_latest(status, &body, &request.base_currency)
    }
}

fn transport_error(err: reqwest::Error) -> RateProviderError {
    if err.is_timeout() {
        RateProviderError::Timeout {
            provider: PROVIDER_ID.to_string(),
        }
    } else if err.is_decode() {
        RateProviderError::InvalidResponse {
            provider: PROVIDER_ID.to_string(),
            message: err.to_string(),
        }
    } else {
        RateProviderError::Network(err)
    }
}

/// Turns a raw response into a snapshot for `base_currency`.
fn parse_latest(
    status: StatusCode,
    body: &str,
    base_currency: &str,
) -> Result<RateSnapshot, RateProviderError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
        return Err(RateProviderError::HttpStatus {
            provider: PROVIDER_ID.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    let parsed: LatestResponse =
        serde_json::from_str(body).map_err(|e| RateProviderError::InvalidResponse {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;

    Ok(RateSnapshot {
        base_currency: base_currency.to_string(),
        rates: parsed.data,
    })
}

#[async_trait]
impl RateProvider for FreeCurrencyApiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn latest_rates(&self, request: &RateRequest) -> Result<RateSnapshot, SyncError> {
        log::debug!(
            "{}: requesting {} rates against {}",
            PROVIDER_ID,
            request.currency_codes.len(),
            request.base_currency
        );
        let snapshot = self.fetch(request).await.map_err(|e| {
            log::warn!("{}: {}", PROVIDER_ID, e);
            SyncError::from(e)
        })?;
        log::debug!("{}: received {} rates", PROVIDER_ID, snapshot.rates.len());
        Ok(snapshot)
    }
}
