//! Generic per-domain synchronizer.
//!
//! A refresh walks: readiness check, staleness gate (skipped when forced),
//! single in-flight claim on the store, fetch through the facade, then one
//! atomic store write. The previous payload stays readable the whole time.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ReadView;
use crate::clock::Clock;
use crate::sdk::LedgerSdk;
use crate::staleness::{is_stale, FreshnessPolicy};
use crate::store::DomainStore;
use crate::types::ResourceClass;

/// Fetches one domain's payload for a key. Implementations own the fan-out
/// and normalization; the synchronizer owns caching.
#[async_trait]
pub trait ResourceFetcher: Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    fn class(&self) -> ResourceClass;

    async fn fetch(&self, sdk: &dyn LedgerSdk, key: &Self::Key) -> Result<Self::Output>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Entry still fresh, or the facade is not ready yet
    Skipped,
    /// A fetch for this key was already in flight
    Deduplicated,
    Updated,
    Failed(String),
}

impl RefreshOutcome {
    pub fn is_fetch(&self) -> bool {
        matches!(self, RefreshOutcome::Updated | RefreshOutcome::Failed(_))
    }
}

/// Releases the in-flight slot if the refresh future is dropped mid-fetch.
struct InFlight<'a, K: Clone + Eq + Hash, T: Clone> {
    store: &'a DomainStore<K, T>,
    key: &'a K,
    armed: bool,
}

impl<K: Clone + Eq + Hash, T: Clone> InFlight<'_, K, T> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<K: Clone + Eq + Hash, T: Clone> Drop for InFlight<'_, K, T> {
    fn drop(&mut self) {
        if self.armed {
            self.store.abandon(self.key);
        }
    }
}

pub struct Synchronizer<F: ResourceFetcher> {
    fetcher: F,
    sdk: Arc<dyn LedgerSdk>,
    store: DomainStore<F::Key, F::Output>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl<F: ResourceFetcher> Synchronizer<F> {
    pub fn new(
        fetcher: F,
        sdk: Arc<dyn LedgerSdk>,
        freshness: &FreshnessPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let class = fetcher.class();
        Self {
            window: freshness.window(class),
            store: DomainStore::new(class),
            fetcher,
            sdk,
            clock,
        }
    }

    pub fn class(&self) -> ResourceClass {
        self.fetcher.class()
    }

    pub fn store(&self) -> &DomainStore<F::Key, F::Output> {
        &self.store
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_stale(&self, key: &F::Key) -> bool {
        let last = self.store.entry(key).map_or(0, |e| e.last_updated_ms);
        is_stale(last, self.window, self.clock.now_ms())
    }

    pub fn read(&self, key: &F::Key) -> ReadView<F::Output> {
        match self.store.entry(key) {
            Some(entry) => ReadView {
                is_stale: is_stale(entry.last_updated_ms, self.window, self.clock.now_ms()),
                payload: entry.payload,
                is_loading: entry.is_loading,
                error: entry.error,
                last_updated_ms: entry.last_updated_ms,
                is_placeholder: false,
            },
            None => ReadView::empty(),
        }
    }

    pub async fn refresh(&self, key: &F::Key, force: bool) -> RefreshOutcome {
        let class = self.class();

        if !self.sdk.is_ready() {
            log::debug!("[sync] {class} {key:?}: facade not ready, skipping");
            return RefreshOutcome::Skipped;
        }
        if !force && !self.is_stale(key) {
            log::debug!("[sync] {class} {key:?}: fresh, skipping");
            return RefreshOutcome::Skipped;
        }
        if !self.store.try_begin(key) {
            log::debug!("[sync] {class} {key:?}: fetch already in flight");
            return RefreshOutcome::Deduplicated;
        }

        let mut guard = InFlight {
            store: &self.store,
            key,
            armed: true,
        };
        log::debug!("🔄 [sync] {class} {key:?}: fetching (force={force})");
        let result = self.fetcher.fetch(self.sdk.as_ref(), key).await;
        guard.disarm();

        match result {
            Ok(payload) => {
                self.store.complete_ok(key, payload, self.clock.now_ms());
                log::debug!("✅ [sync] {class} {key:?}: updated");
                RefreshOutcome::Updated
            }
            Err(e) => {
                let msg = format!("{e:#}");
                log::warn!("⚠️ [sync] {class} {key:?}: refresh failed: {msg}");
                self.store.complete_err(key, msg.clone());
                RefreshOutcome::Failed(msg)
            }
        }
    }
}
