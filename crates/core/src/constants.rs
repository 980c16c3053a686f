/// Default base currency for rate records.
pub const DEFAULT_BASE_CURRENCY: &str = "RUB";

/// How long fetched rates stay fresh before `refresh(false)` hits the provider again.
pub const DEFAULT_RATES_TTL_SECS: u64 = 60;

/// Request timeout for the remote rate provider.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Public endpoint of the freecurrencyapi-compatible provider.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.freecurrencyapi.com";

/// Codes requested from the provider on every sync.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "EUR", "USD", "JPY", "CNY", "CZK", "INR", "HUF", "PLN", "RON", "TRY", "CAD", "ILS", "KRW",
    "SGD", "BGN", "DKK", "GBP", "SEK", "CHF", "ISK", "NOK", "HRK", "RUB", "AUD", "BRL", "HKD",
    "IDR", "MXN", "MYR", "NZD", "PHP", "THB", "ZAR",
];

/// Currencies pinned to the top of the rates screen, in display order.
pub const POPULAR_CURRENCIES: &[&str] = &["RUB", "USD", "EUR"];

/// Rate stored for a base currency against itself.
pub const BASE_RATE: f64 = 1.0;
