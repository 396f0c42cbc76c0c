//! Exchange rate provider port.
//!
//! This trait defines the interface for exchange rate sources.
//! Implementations can be HTTP clients, static tables, test fakes, etc.

use std::collections::BTreeMap;

use crate::CurrencyCode;

/// Error type for provider fetches.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Unsupported base currency: {0}")]
    UnsupportedBase(CurrencyCode),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Provider returned HTTP {0}")]
    Status(u16),

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Provider rejected the request: {0}")]
    Rejected(String),
}

/// Raw result of one provider fetch.
///
/// The two maps are supposed to describe the same currencies but a provider
/// may return partial data; [`crate::RateSnapshot::new`] reconciles them.
#[derive(Debug, Clone, PartialEq)]
pub struct RateData {
    pub base: CurrencyCode,
    pub rates: BTreeMap<CurrencyCode, f64>,
    pub names: BTreeMap<CurrencyCode, String>,
}

impl RateData {
    /// Codes that will not make it into a snapshot: a rate without a name, a
    /// name without a rate, or a rate that is not a positive finite number.
    pub fn unusable_codes(&self) -> Vec<CurrencyCode> {
        let bad_rates = self.rates.iter().filter(|(code, rate)| {
            **code != self.base
                && (!rate.is_finite() || **rate <= 0.0 || !self.names.contains_key(*code))
        });
        let unnamed = self
            .names
            .keys()
            .filter(|code| **code != self.base && !self.rates.contains_key(*code));

        let mut codes: Vec<CurrencyCode> = bad_rates
            .map(|(code, _)| code.clone())
            .chain(unnamed.cloned())
            .collect();
        codes.sort();
        codes
    }
}

/// Port trait for exchange rate sources.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Fetch the latest rates for every currency the provider is configured
    /// for, expressed against `base`.
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateData, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unusable_codes() {
        let code = |s: &str| s.parse::<CurrencyCode>().unwrap();
        let data = RateData {
            base: code("USD"),
            rates: [("EUR", 0.9), ("CHF", 0.88), ("GBP", -2.0)]
                .into_iter()
                .map(|(c, r)| (code(c), r))
                .collect(),
            names: [
                ("USD", "United States Dollar"),
                ("EUR", "Euro"),
                ("GBP", "British Pound"),
                ("JPY", "Japanese Yen"),
            ]
            .into_iter()
            .map(|(c, n)| (code(c), n.to_string()))
            .collect(),
        };

        assert_eq!(
            data.unusable_codes(),
            vec![code("CHF"), code("GBP"), code("JPY")]
        );
    }
}
