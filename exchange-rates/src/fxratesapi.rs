//! FXRatesAPI client.
//!
//! Calls `GET {api_url}?api_key=..&base=..&currencies=..` and maps the
//! `latest` response onto [`RateData`]. The API only returns codes, so display
//! names come from the configured [`CurrencyTable`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use converter_types::{CurrencyCode, CurrencyTable, ProviderError, RateData, RateProvider};

/// Public endpoint for the latest rates.
pub const DEFAULT_API_URL: &str = "https://api.fxratesapi.com/latest";

/// Rate provider backed by FXRatesAPI.
pub struct FxRatesApiProvider {
    client: reqwest::Client,
    api_url: String,
    token: String,
    currencies: CurrencyTable,
}

impl FxRatesApiProvider {
    /// Creates a provider that asks for every currency in `currencies`.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        currencies: CurrencyTable,
    ) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token, currencies)
    }

    /// Same as [`FxRatesApiProvider::new`] with a preconfigured HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
        currencies: CurrencyTable,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
            currencies,
        }
    }

    /// Comma-separated symbols to request: the whole table minus the base.
    fn symbols(&self, base: &CurrencyCode) -> String {
        self.currencies
            .codes()
            .filter(|code| *code != base)
            .map(CurrencyCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl RateProvider for FxRatesApiProvider {
    fn name(&self) -> &str {
        "fxratesapi"
    }

    #[instrument(skip(self, base), fields(base = %base))]
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateData, ProviderError> {
        if !self.currencies.contains(base.as_str()) {
            return Err(ProviderError::UnsupportedBase(base.clone()));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("api_key", self.token.as_str()),
                ("base", base.as_str()),
                ("currencies", self.symbols(base).as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ServiceUnavailable(e.to_string()))?;
        debug!(bytes = body.len(), "Received provider response");

        parse_latest(&body, base, &self.currencies)
    }
}

/// Body of a `latest` response. Failures come back as
/// `{"success": false, "error": "...", "description": "..."}`.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

fn parse_latest(
    body: &str,
    base: &CurrencyCode,
    currencies: &CurrencyTable,
) -> Result<RateData, ProviderError> {
    let latest: LatestResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if latest.success == Some(false) {
        let reason = latest
            .description
            .or(latest.error)
            .unwrap_or_else(|| "unspecified error".to_string());
        return Err(ProviderError::Rejected(reason));
    }

    let reported_base = latest
        .base
        .ok_or_else(|| ProviderError::Malformed("missing base".into()))?;
    if reported_base.parse::<CurrencyCode>().ok().as_ref() != Some(base) {
        return Err(ProviderError::Malformed(format!(
            "asked for base {base}, got {reported_base}"
        )));
    }

    let raw_rates = latest
        .rates
        .ok_or_else(|| ProviderError::Malformed("missing rates".into()))?;

    let rates: BTreeMap<CurrencyCode, f64> = raw_rates
        .into_iter()
        .filter_map(|(code, rate)| Some((code.parse::<CurrencyCode>().ok()?, rate)))
        .filter(|(code, _)| currencies.contains(code.as_str()))
        .collect();
    let names = currencies
        .iter()
        .map(|(code, name)| (code.clone(), name.clone()))
        .collect();

    Ok(RateData {
        base: base.clone(),
        rates,
        names,
    })
}
