//! Immutable exchange-rate snapshot.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::domain::CurrencyCode;
use crate::error::SnapshotError;
use crate::ports::RateData;

/// One complete set of exchange rates, valid until superseded.
///
/// Every rate is expressed against `base`, whose own rate is always 1.0.
/// The rate map and the name map always cover the same set of codes.
/// A snapshot is never edited after construction; a refresh builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, f64>,
    names: BTreeMap<CurrencyCode, String>,
    fetched_at: DateTime<Utc>,
    version: u64,
}

impl RateSnapshot {
    /// Builds a snapshot, keeping only the codes that have both a usable rate
    /// and a display name.
    ///
    /// The base currency gets rate 1.0 regardless of what the provider said.
    /// Fails if the base has no display name or nothing but the base survives.
    pub fn new(
        base: CurrencyCode,
        mut rates: BTreeMap<CurrencyCode, f64>,
        mut names: BTreeMap<CurrencyCode, String>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        if !names.contains_key(base.as_str()) {
            return Err(SnapshotError::MissingBaseName(base));
        }

        rates.retain(|_, rate| rate.is_finite() && *rate > 0.0);
        rates.insert(base.clone(), 1.0);
        rates.retain(|code, _| names.contains_key(code.as_str()));
        names.retain(|code, _| rates.contains_key(code.as_str()));

        if rates.len() < 2 {
            return Err(SnapshotError::Empty(base));
        }

        Ok(Self {
            base,
            rates,
            names,
            fetched_at,
            version: 0,
        })
    }

    /// Builds a snapshot from a provider response.
    pub fn from_rate_data(
        data: RateData,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        Self::new(data.base, data.rates, data.names, fetched_at)
    }

    /// Returns the same snapshot stamped with an install version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn rates(&self) -> &BTreeMap<CurrencyCode, f64> {
        &self.rates
    }

    pub fn names(&self) -> &BTreeMap<CurrencyCode, String> {
        &self.names
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Install sequence number; 0 until a store installs the snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// Rate of `code` against the base.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// Units of `target` per one unit of `source`, derived through the base.
    pub fn cross_rate(&self, source: &str, target: &str) -> Option<f64> {
        Some(self.rate(target)? / self.rate(source)?)
    }

    /// Every currency's rate relative to `code`; `code` itself maps to 1.0.
    pub fn rates_relative_to(&self, code: &str) -> Option<BTreeMap<CurrencyCode, f64>> {
        let pivot = self.rate(code)?;
        Some(
            self.rates
                .iter()
                .map(|(other, rate)| {
                    let relative = if other.as_str() == code { 1.0 } else { rate / pivot };
                    (other.clone(), relative)
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// How long ago the data was fetched.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
    }
}
