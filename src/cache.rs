//! Cache entry: the unit of cached state for one logical resource.

use serde::Serialize;

/// One cached resource.
///
/// `is_loading` is only ever true while a fetch for this entry is in flight.
/// `payload` and `last_updated_ms` always change together on success, and
/// `payload` survives failed fetches.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry<T> {
    pub payload: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Monotonic ms of the last successful fetch; 0 means never fetched
    pub last_updated_ms: u64,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            payload: None,
            is_loading: false,
            error: None,
            last_updated_ms: 0,
        }
    }
}

impl<T> CacheEntry<T> {
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Mark a fetch as started. Keeps the current payload visible.
    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
    }

    pub(crate) fn succeed(&mut self, payload: T, now_ms: u64) {
        self.payload = Some(payload);
        self.error = None;
        self.last_updated_ms = now_ms;
        self.is_loading = false;
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.error = Some(error);
        self.is_loading = false;
    }
}

/// What a consumer sees when it reads an entry
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReadView<T> {
    pub payload: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_stale: bool,
    pub last_updated_ms: u64,
    /// No data arrived within the fallback window after the facade became
    /// ready; render a placeholder instead of waiting
    pub is_placeholder: bool,
}

impl<T> ReadView<T> {
    pub fn empty() -> Self {
        Self {
            payload: None,
            is_loading: false,
            error: None,
            is_stale: true,
            last_updated_ms: 0,
            is_placeholder: false,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadView<U> {
        ReadView {
            payload: self.payload.map(f),
            is_loading: self.is_loading,
            error: self.error,
            is_stale: self.is_stale,
            last_updated_ms: self.last_updated_ms,
            is_placeholder: self.is_placeholder,
        }
    }
}
