//! Rate Store
//!
//! Process-wide holder of the current [`RateSnapshot`].
//!
//! - Reads are wait-free: `current()` is an `ArcSwap` load that hands out an
//!   `Arc` pinning the snapshot for as long as the caller needs it.
//! - Writes publish a whole new snapshot with a single pointer store, so a
//!   reader sees either the old snapshot or the new one, never a mix.
//! - Writers are serialized by a short mutex that is held only for the
//!   compare-and-store, never across a network call.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Duration, Utc};

use converter_types::RateSnapshot;

/// Result of [`RateStore::replace`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceOutcome {
    /// The snapshot is now current.
    Installed { version: u64 },
    /// The snapshot was fetched before the one already installed and was dropped.
    Stale {
        current: DateTime<Utc>,
        rejected: DateTime<Utc>,
    },
}

impl ReplaceOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, ReplaceOutcome::Installed { .. })
    }
}

/// Atomic holder of the current rate snapshot.
///
/// A store can only be built from an initial snapshot, so there is no
/// "empty" state for readers to observe.
pub struct RateStore {
    current: ArcSwap<RateSnapshot>,
    write_lock: Mutex<()>,
}

impl RateStore {
    /// Creates a store with `initial` installed as version 1.
    pub fn new(initial: RateSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial.with_version(1)),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the most recently installed snapshot.
    pub fn current(&self) -> Arc<RateSnapshot> {
        self.current.load_full()
    }

    /// Installs `snapshot` unless it is older than the current one.
    ///
    /// Snapshots with an equal fetch time are installed; only strictly older
    /// data is rejected.
    pub fn replace(&self, snapshot: RateSnapshot) -> ReplaceOutcome {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.current.load();
        if snapshot.fetched_at() < current.fetched_at() {
            return ReplaceOutcome::Stale {
                current: current.fetched_at(),
                rejected: snapshot.fetched_at(),
            };
        }

        let version = current.version() + 1;
        self.current.store(Arc::new(snapshot.with_version(version)));
        ReplaceOutcome::Installed { version }
    }

    /// Age of the current data.
    pub fn staleness(&self) -> Duration {
        self.current.load().age(Utc::now())
    }
}
