//! Hardcoded rates for development and testing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use converter_types::{CurrencyCode, ProviderError, RateData, RateProvider};

/// Units of each currency per one US dollar, with display names.
const DEVELOPMENT_RATES: &[(&str, &str, f64)] = &[
    ("USD", "United States Dollar", 1.0),
    ("EUR", "Euro", 0.9260101824),
    ("JPY", "Japanese Yen", 149.62),
    ("GBP", "British Pound", 0.7899),
    ("INR", "Indian Rupee", 83.12),
];

/// Rate provider backed by a fixed table.
///
/// Rates are stored against one reference currency and rebased on every
/// fetch, so any currency in the table can serve as the base.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    /// code -> (display name, units per reference unit)
    table: BTreeMap<CurrencyCode, (String, f64)>,
}

impl StaticRateProvider {
    /// Builds a provider from `(code, name, units per reference unit)` rows.
    ///
    /// Rows with a non-positive or non-finite rate are skipped.
    pub fn new(rows: impl IntoIterator<Item = (CurrencyCode, String, f64)>) -> Self {
        let table = rows
            .into_iter()
            .filter(|(_, _, rate)| rate.is_finite() && *rate > 0.0)
            .map(|(code, name, rate)| (code, (name, rate)))
            .collect();
        Self { table }
    }

    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.table.keys()
    }
}

impl Default for StaticRateProvider {
    fn default() -> Self {
        Self::new(DEVELOPMENT_RATES.iter().filter_map(|(code, name, rate)| {
            Some((code.parse().ok()?, name.to_string(), *rate))
        }))
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, base: &CurrencyCode) -> Result<RateData, ProviderError> {
        let (_, pivot) = self
            .table
            .get(base)
            .ok_or_else(|| ProviderError::UnsupportedBase(base.clone()))?;

        let rates = self
            .table
            .iter()
            .map(|(code, (_, rate))| (code.clone(), rate / pivot))
            .collect();
        let names = self
            .table
            .iter()
            .map(|(code, (name, _))| (code.clone(), name.clone()))
            .collect();

        Ok(RateData {
            base: base.clone(),
            rates,
            names,
        })
    }
}
