//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use converter_types::{CurrencyCode, CurrencyTable, IpcEndpoint};
use exchange_rates::DEFAULT_API_URL;

/// Where rates come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    FxRatesApi { api_url: String, token: String },
    Static,
}

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub base_currency: CurrencyCode,
    pub currencies: CurrencyTable,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
    pub endpoint: IpcEndpoint,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let currencies = match var("SUPPORTED_CURRENCIES") {
            Some(raw) => parse_var::<CurrencyTable>("SUPPORTED_CURRENCIES", &raw)?,
            None => CurrencyTable::default(),
        };

        let base_currency = match var("BASE_CURRENCY") {
            Some(raw) => parse_var::<CurrencyCode>("BASE_CURRENCY", &raw)?,
            None => CurrencyCode::from_str("USD")?,
        };

        let provider = match var("RATE_PROVIDER").as_deref().map(str::trim) {
            None | Some("fxratesapi") => {
                let token = var("FXRATES_TOKEN").context(
                    "FXRATES_TOKEN environment variable is required for the fxratesapi provider",
                )?;
                if !currencies.contains(base_currency.as_str()) {
                    bail!("BASE_CURRENCY {base_currency} is not in SUPPORTED_CURRENCIES");
                }
                ProviderConfig::FxRatesApi {
                    api_url: var("FXRATES_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                    token,
                }
            }
            Some("static") => ProviderConfig::Static,
            Some(other) => bail!("RATE_PROVIDER must be fxratesapi or static, got {other:?}"),
        };

        let refresh_interval = seconds(&var, "REFRESH_INTERVAL_SECS", 3600)?;
        let fetch_timeout = seconds(&var, "FETCH_TIMEOUT_SECS", 10)?;

        let endpoint = match var("IPC_ENDPOINT") {
            Some(raw) => parse_var::<IpcEndpoint>("IPC_ENDPOINT", &raw)?,
            None => IpcEndpoint::default(),
        };

        let log_format = match var("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be pretty or json, got {other:?}"),
        };

        Ok(Self {
            provider,
            base_currency,
            currencies,
            refresh_interval,
            fetch_timeout,
            endpoint,
            log_format,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>().with_context(|| format!("Invalid {key}"))
}

/// A positive whole number of seconds.
fn seconds<F>(var: &F, key: &str, default: u64) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
