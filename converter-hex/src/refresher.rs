//! Periodic rate refresh.
//!
//! The refresher owns the only write path into [`RateStore`]. It fetches on a
//! fixed interval, one fetch at a time, and installs the result only if the
//! data forms a valid snapshot. A failed refresh keeps the previous snapshot
//! and is logged; it never stops the schedule.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use converter_types::{CurrencyCode, ProviderError, RateProvider, RateSnapshot, SnapshotError};

use crate::store::{RateStore, ReplaceOutcome};

/// Why a fetch did not produce a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unusable rate data: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Refresh schedule settings.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Base currency every snapshot is expressed against.
    pub base: CurrencyCode,
    /// Time between refreshes.
    pub interval: Duration,
    /// Upper bound for one provider call.
    pub fetch_timeout: Duration,
}

/// Fetches rates from a provider and publishes them into a [`RateStore`].
pub struct Refresher {
    provider: Arc<dyn RateProvider>,
    config: RefreshConfig,
}

impl Refresher {
    pub fn new(provider: Arc<dyn RateProvider>, config: RefreshConfig) -> Self {
        Self { provider, config }
    }

    /// Performs one bounded fetch and builds a snapshot from it.
    ///
    /// The snapshot is stamped with the time the fetch started, so a slow
    /// fetch never looks fresher than one that began after it.
    pub async fn fetch_snapshot(&self) -> Result<RateSnapshot, RefreshError> {
        let started_at = Utc::now();
        let data = tokio::time::timeout(
            self.config.fetch_timeout,
            self.provider.fetch(&self.config.base),
        )
        .await
        .map_err(|_| RefreshError::Timeout(self.config.fetch_timeout))??;

        let unusable = data.unusable_codes();
        if !unusable.is_empty() {
            warn!(
                provider = self.provider.name(),
                codes = ?unusable,
                "Dropping currencies with incomplete data"
            );
        }

        Ok(RateSnapshot::from_rate_data(data, started_at)?)
    }

    /// The startup fetch. There is nothing to fall back to, so the caller
    /// should treat an error as fatal.
    #[instrument(skip(self), fields(provider = self.provider.name(), base = %self.config.base))]
    pub async fn initial_snapshot(&self) -> Result<RateSnapshot, RefreshError> {
        let snapshot = self.fetch_snapshot().await?;
        info!(currencies = snapshot.len(), "Initial exchange rates loaded");
        Ok(snapshot)
    }

    /// Runs one refresh cycle against `store`.
    ///
    /// On failure the store is left untouched.
    #[instrument(
        skip(self, store),
        fields(provider = self.provider.name(), base = %self.config.base)
    )]
    pub async fn refresh_once(&self, store: &RateStore) -> Result<ReplaceOutcome, RefreshError> {
        let snapshot = match self.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let current = store.current();
                warn!(
                    error = %e,
                    serving_version = current.version(),
                    serving_fetched_at = %current.fetched_at(),
                    staleness_secs = store.staleness().num_seconds(),
                    "Exchange rate refresh failed, keeping previous rates"
                );
                return Err(e);
            }
        };

        let outcome = store.replace(snapshot);
        match &outcome {
            ReplaceOutcome::Installed { version } => {
                info!(version, "Exchange rates updated");
            }
            ReplaceOutcome::Stale { current, rejected } => {
                warn!(%current, %rejected, "Ignoring snapshot older than the installed one");
            }
        }
        Ok(outcome)
    }

    /// Starts the refresh loop on the tokio runtime.
    ///
    /// The first refresh happens one interval from now; the initial snapshot is
    /// expected to be in the store already. The loop stops once `shutdown`
    /// flips to `true` or its sender is dropped.
    pub fn spawn(self, store: Arc<RateStore>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(store, shutdown))
    }

    async fn run(self, store: Arc<RateStore>, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        // A tick that comes due while a fetch is still running is dropped, not queued.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = period.as_secs(), "Refresher started");
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    debug!("Refresh tick");
                    // Errors are already logged inside refresh_once.
                    let _ = self.refresh_once(&store).await;
                }
            }
        }
        info!("Refresher stopped");
    }
}
