//! Converter Application Service
//!
//! Answers requests from the current rate snapshot.
//! Contains NO infrastructure logic - pure request validation and arithmetic.

use std::collections::BTreeMap;
use std::sync::Arc;

use converter_types::{
    ConversionReply, ConvertCurrencyRequest, CurrencyCode, ExchangeRatesQuery, RateSnapshot,
    Reply, Request, ServiceError,
};

use crate::store::RateStore;

/// Application service for currency requests.
///
/// Each call captures one snapshot up front and uses only that snapshot, so a
/// refresh that lands mid-request cannot mix old and new rates in one answer.
/// The service never writes to the store.
#[derive(Clone)]
pub struct ConverterService {
    store: Arc<RateStore>,
}

impl ConverterService {
    /// Creates a new service reading from `store`.
    pub fn new(store: Arc<RateStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<RateStore> {
        &self.store
    }

    /// Dispatches one request.
    pub fn handle(&self, request: &Request) -> Result<Reply, ServiceError> {
        let snapshot = self.store.current();
        match request {
            Request::ConvertCurrency(req) => {
                convert_currency(&snapshot, req).map(Reply::Conversion)
            }
            Request::GetExchangeRates(query) => {
                get_exchange_rates(&snapshot, query).map(Reply::ExchangeRates)
            }
            Request::GetSupportedCurrencies => {
                Ok(Reply::SupportedCurrencies(get_supported_currencies(&snapshot)))
            }
        }
    }

    pub fn convert_currency(
        &self,
        req: &ConvertCurrencyRequest,
    ) -> Result<ConversionReply, ServiceError> {
        convert_currency(&self.store.current(), req)
    }

    pub fn get_exchange_rates(
        &self,
        query: &ExchangeRatesQuery,
    ) -> Result<BTreeMap<CurrencyCode, f64>, ServiceError> {
        get_exchange_rates(&self.store.current(), query)
    }

    pub fn get_supported_currencies(&self) -> BTreeMap<CurrencyCode, String> {
        get_supported_currencies(&self.store.current())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operations over a single snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves a raw code against the snapshot's currency universe.
fn known_currency(snapshot: &RateSnapshot, raw: &str) -> Result<CurrencyCode, ServiceError> {
    raw.parse::<CurrencyCode>()
        .ok()
        .filter(|code| snapshot.contains(code.as_str()))
        .ok_or_else(|| ServiceError::InvalidCurrency(raw.to_string()))
}

/// `amount * rate[target] / rate[source]`, unrounded.
pub fn convert_currency(
    snapshot: &RateSnapshot,
    req: &ConvertCurrencyRequest,
) -> Result<ConversionReply, ServiceError> {
    let source = known_currency(snapshot, &req.source_currency)?;
    let target = known_currency(snapshot, &req.target_currency)?;

    if !req.amount.is_finite() || req.amount < 0.0 {
        return Err(ServiceError::InvalidAmount(req.amount));
    }

    let rate = snapshot
        .cross_rate(source.as_str(), target.as_str())
        .ok_or_else(|| ServiceError::InvalidCurrency(req.target_currency.clone()))?;

    let converted_amount = req.amount * rate;
    if !converted_amount.is_finite() {
        return Err(ServiceError::OutOfRange);
    }

    Ok(ConversionReply {
        source_currency: source,
        target_currency: target,
        amount: req.amount,
        converted_amount,
    })
}

/// Every currency's rate relative to the queried one (default: the base),
/// including the queried currency itself at 1.0.
///
/// Extreme provider rates can make a relative rate overflow or underflow;
/// such a table is refused rather than sent with holes in it.
pub fn get_exchange_rates(
    snapshot: &RateSnapshot,
    query: &ExchangeRatesQuery,
) -> Result<BTreeMap<CurrencyCode, f64>, ServiceError> {
    let pivot = match &query.currency_code {
        Some(raw) => known_currency(snapshot, raw)?,
        None => snapshot.base().clone(),
    };

    let rates = snapshot
        .rates_relative_to(pivot.as_str())
        .ok_or_else(|| ServiceError::InvalidCurrency(pivot.to_string()))?;

    if rates.values().any(|rate| !rate.is_finite() || *rate <= 0.0) {
        return Err(ServiceError::OutOfRange);
    }
    Ok(rates)
}

/// Code to display-name map of the snapshot.
pub fn get_supported_currencies(snapshot: &RateSnapshot) -> BTreeMap<CurrencyCode, String> {
    snapshot.names().clone()
}
