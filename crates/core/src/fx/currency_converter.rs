use super::fx_errors::FxError;
use super::fx_model::CurrencyRate;

/// Converts amounts between two records quoted against the same base.
///
/// A record's `rate` is units of that currency per one unit of its base, so
/// going through the base is `amount / from.rate * to.rate`.
pub struct CurrencyConverter;

impl CurrencyConverter {
    pub fn convert(amount: f64, from: &CurrencyRate, to: &CurrencyRate) -> Result<f64, FxError> {
        if from.base_currency != to.base_currency {
            return Err(FxError::CrossBaseConversion {
                from_base: from.base_currency.clone(),
                to_base: to.base_currency.clone(),
            });
        }
        let from_rate = from.validate_rate()?;
        let to_rate = to.validate_rate()?;
        if from.code == to.code {
            return Ok(amount);
        }
        Ok(amount / from_rate * to_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::Trend;
    use chrono::Utc;

    fn rate(code: &str, base: &str, value: f64) -> CurrencyRate {
        CurrencyRate {
            code: code.to_string(),
            name: code.to_string(),
            base_currency: base.to_string(),
            rate: value,
            trend: Trend::Stable,
            change: 0.0,
            change_percentage: 0.0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_same_base_conversion() {
        let usd = rate("USD", "RUB", 0.012);
        let eur = rate("EUR", "RUB", 0.0106);
        let result = CurrencyConverter::convert(100.0, &usd, &eur).unwrap();
        assert!((result - 88.333_333).abs() < 1e-3);
    }

    #[test]
    fn test_to_base_record() {
        let usd = rate("USD", "RUB", 0.0125);
        let rub = rate("RUB", "RUB", 1.0);
        assert_eq!(CurrencyConverter::convert(10.0, &usd, &rub).unwrap(), 800.0);
    }

    #[test]
    fn test_cross_base_is_rejected() {
        let usd = rate("USD", "RUB", 0.012);
        let eur = rate("EUR", "USD", 0.92);
        assert_eq!(
            CurrencyConverter::convert(1.0, &usd, &eur),
            Err(FxError::CrossBaseConversion {
                from_base: "RUB".to_string(),
                to_base: "USD".to_string(),
            })
        );
    }

    #[test]
    fn test_zero_source_rate_is_invalid() {
        let usd = rate("USD", "RUB", 0.0);
        let eur = rate("EUR", "RUB", 0.0106);
        assert!(matches!(
            CurrencyConverter::convert(5.0, &usd, &eur),
            Err(FxError::InvalidRate { .. })
        ));
    }
}
