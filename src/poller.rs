//! Lifecycle-aware polling.
//!
//! One tokio task per visible resource key. The task waits for the facade to
//! report ready, refreshes once right away and then on the class interval.
//! Each refresh runs as its own detached task, so hiding a key stops future
//! ticks without cancelling a fetch already on the wire; its result still
//! lands in the store.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::constants::polling;
use crate::synchronizer::RefreshOutcome;
use crate::types::{ResourceClass, ResourceKey};

/// Anything that can refresh a resource by key (the explorer's domains).
#[async_trait]
pub trait Refresher: Send + Sync + 'static {
    fn is_ready(&self) -> bool;

    async fn refresh(&self, key: &ResourceKey, force: bool) -> RefreshOutcome;
}

/// `tokio::time::interval` panics on a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(100);

pub struct Poller {
    target: Arc<dyn Refresher>,
    intervals: BTreeMap<ResourceClass, Duration>,
    ready_check: Duration,
    active: Mutex<HashMap<ResourceKey, JoinHandle<()>>>,
}

impl Poller {
    pub fn new(target: Arc<dyn Refresher>, cfg: &Config) -> Self {
        let intervals = ResourceClass::ALL
            .iter()
            .map(|c| (*c, cfg.poll_interval(*c).max(MIN_INTERVAL)))
            .collect();
        Self {
            target,
            intervals,
            ready_check: Duration::from_millis(polling::READY_CHECK_MS),
            active: Mutex::new(HashMap::new()),
        }
    }

    fn active(&self) -> MutexGuard<'_, HashMap<ResourceKey, JoinHandle<()>>> {
        self.active.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn interval(&self, class: ResourceClass) -> Duration {
        self.intervals
            .get(&class)
            .copied()
            .unwrap_or(Duration::from_millis(polling::CHAIN_STATS_MS))
    }

    /// Start polling `key`. A key that is already being polled is left alone.
    /// Must be called from within a tokio runtime.
    pub fn on_become_visible(&self, key: ResourceKey) {
        let key = key.normalized();
        let mut active = self.active();
        if active.get(&key).is_some_and(|h| !h.is_finished()) {
            return;
        }
        let every = self.interval(key.class());
        log::debug!("👀 [poller] {key} visible, polling every {}ms", every.as_millis());
        let handle = tokio::spawn(poll_loop(
            self.target.clone(),
            key.clone(),
            every,
            self.ready_check,
        ));
        active.insert(key, handle);
    }

    pub fn on_become_hidden(&self, key: &ResourceKey) {
        if let Some(handle) = self.active().remove(&key.normalized()) {
            handle.abort();
            log::debug!("🙈 [poller] {key} hidden, polling stopped");
        }
    }

    /// The application came back to the foreground: refresh every active key
    /// now, forced, whatever the timer phase.
    pub async fn on_foreground(&self) -> Vec<(ResourceKey, RefreshOutcome)> {
        let keys = self.active_keys();
        log::info!("[poller] foreground, forcing refresh of {} keys", keys.len());
        let outcomes = join_all(keys.iter().map(|k| self.target.refresh(k, true))).await;
        keys.into_iter().zip(outcomes).collect()
    }

    pub fn active_keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = self
            .active()
            .iter()
            .filter(|(_, h)| !h.is_finished())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn is_active(&self, key: &ResourceKey) -> bool {
        self.active().get(key).is_some_and(|h| !h.is_finished())
    }

    /// Stop every poll loop
    pub fn shutdown(&self) {
        for (key, handle) in self.active().drain() {
            handle.abort();
            log::debug!("[poller] {key} stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn poll_loop(
    target: Arc<dyn Refresher>,
    key: ResourceKey,
    every: Duration,
    ready_check: Duration,
) {
    while !target.is_ready() {
        tokio::time::sleep(ready_check).await;
    }

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        // First tick completes immediately
        ticker.tick().await;
        log::debug!("⏰ [poller] {key} tick");
        let target = target.clone();
        let key = key.clone();
        tokio::spawn(async move {
            target.refresh(&key, false).await;
        });
    }
}
