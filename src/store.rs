//! Domain stores: one keyed container of cache entries per resource domain.
//!
//! Writes replace every field of an entry under a single lock, then observers
//! are notified once the lock is released. Only the synchronizer owning a
//! store writes to it; everyone else reads or subscribes.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::cache::CacheEntry;
use crate::types::ResourceClass;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Loading,
    Updated,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreEvent<K> {
    pub class: ResourceClass,
    pub key: K,
    pub kind: ChangeKind,
}

pub struct DomainStore<K, T> {
    class: ResourceClass,
    entries: Mutex<HashMap<K, CacheEntry<T>>>,
    subscribers: Mutex<Vec<UnboundedSender<StoreEvent<K>>>>,
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    // A panic while holding the guard leaves the map itself intact
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<K, T> DomainStore<K, T>
where
    K: Clone + Eq + Hash,
    T: Clone,
{
    pub fn new(class: ResourceClass) -> Self {
        Self {
            class,
            entries: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// Claim the single in-flight slot for `key`. Returns false when a fetch
    /// is already running, in which case the caller must not fetch.
    pub(crate) fn try_begin(&self, key: &K) -> bool {
        {
            let mut entries = lock(&self.entries);
            let entry = entries.entry(key.clone()).or_default();
            if entry.is_loading {
                return false;
            }
            entry.begin();
        }
        self.notify(key, ChangeKind::Loading);
        true
    }

    pub(crate) fn complete_ok(&self, key: &K, payload: T, now_ms: u64) {
        {
            let mut entries = lock(&self.entries);
            entries
                .entry(key.clone())
                .or_default()
                .succeed(payload, now_ms);
        }
        self.notify(key, ChangeKind::Updated);
    }

    pub(crate) fn complete_err(&self, key: &K, error: String) {
        {
            let mut entries = lock(&self.entries);
            entries.entry(key.clone()).or_default().fail(error);
        }
        self.notify(key, ChangeKind::Failed);
    }

    /// Release the in-flight slot of a fetch that never completed. Payload and
    /// error stay as they were.
    pub(crate) fn abandon(&self, key: &K) {
        let released = {
            let mut entries = lock(&self.entries);
            match entries.get_mut(key) {
                Some(entry) if entry.is_loading => {
                    entry.is_loading = false;
                    true
                }
                _ => false,
            }
        };
        if released {
            self.notify(key, ChangeKind::Failed);
        }
    }

    /// Snapshot of one entry (cloned; never a half-written view)
    pub fn entry(&self, key: &K) -> Option<CacheEntry<T>> {
        lock(&self.entries).get(key).cloned()
    }

    pub fn payload(&self, key: &K) -> Option<T> {
        lock(&self.entries).get(key).and_then(|e| e.payload.clone())
    }

    pub fn keys(&self) -> Vec<K> {
        lock(&self.entries).keys().cloned().collect()
    }

    pub fn is_any_loading(&self) -> bool {
        lock(&self.entries).values().any(|e| e.is_loading)
    }

    /// Every key whose latest fetch failed, with its message
    pub fn errors(&self) -> Vec<(K, String)> {
        lock(&self.entries)
            .iter()
            .filter_map(|(k, e)| e.error.clone().map(|err| (k.clone(), err)))
            .collect()
    }

    pub fn subscribe(&self) -> UnboundedReceiver<StoreEvent<K>> {
        let (tx, rx) = unbounded_channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    fn notify(&self, key: &K, kind: ChangeKind) {
        let mut subs = lock(&self.subscribers);
        subs.retain(|tx| {
            tx.send(StoreEvent {
                class: self.class,
                key: key.clone(),
                kind,
            })
            .is_ok()
        });
    }
}
