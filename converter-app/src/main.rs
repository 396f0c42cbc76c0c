//! # Currency Converter Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the rate provider and load the initial snapshot
//! - Start the hourly refresher
//! - Serve requests over IPC until shutdown

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use converter_hex::{ConverterService, RateStore, RefreshConfig, Refresher, inbound::IpcServer};
use converter_types::RateProvider;
use exchange_rates::{FxRatesApiProvider, StaticRateProvider};

use config::{Config, LogFormat, ProviderConfig};

const DEFAULT_LOG_FILTER: &str = "info,converter_app=debug,converter_hex=debug";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_provider(config: &Config) -> Arc<dyn RateProvider> {
    match &config.provider {
        ProviderConfig::FxRatesApi { api_url, token } => Arc::new(FxRatesApiProvider::new(
            api_url.clone(),
            token.clone(),
            config.currencies.clone(),
        )),
        ProviderConfig::Static => Arc::new(StaticRateProvider::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    let provider = build_provider(&config);
    tracing::info!(
        provider = provider.name(),
        base = %config.base_currency,
        interval_secs = config.refresh_interval.as_secs(),
        "Starting currency converter"
    );

    let refresher = Refresher::new(
        provider,
        RefreshConfig {
            base: config.base_currency.clone(),
            interval: config.refresh_interval,
            fetch_timeout: config.fetch_timeout,
        },
    );

    // No requests are served until the first snapshot is in place.
    let initial = refresher
        .initial_snapshot()
        .await
        .context("Failed to load initial exchange rates")?;
    let store = Arc::new(RateStore::new(initial));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_task = refresher.spawn(store.clone(), shutdown_rx);

    let service = ConverterService::new(store);
    let server = IpcServer::bind(service, &config.endpoint)?;
    let served = server.run().await;

    // Stop the refresher even if the server failed
    let _ = shutdown_tx.send(true);
    if let Err(e) = refresh_task.await {
        tracing::warn!(error = %e, "Refresher task ended abnormally");
    }

    served
}
