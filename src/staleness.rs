//! Freshness windows and the staleness check.
//!
//! `is_stale` is a pure function of `(last_updated, window, now)` so it can be
//! evaluated anywhere, including from tests with a hand-driven clock.

use std::collections::HashMap;
use std::time::Duration;

use crate::constants::freshness;
use crate::types::ResourceClass;

/// `true` when an entry was never fetched or is older than `window`.
/// An age exactly equal to the window still counts as fresh.
#[inline]
pub fn is_stale(last_updated_ms: u64, window: Duration, now_ms: u64) -> bool {
    last_updated_ms == 0 || now_ms.saturating_sub(last_updated_ms) > window.as_millis() as u64
}

/// Per-class freshness windows with a global fallback
#[derive(Clone, Debug)]
pub struct FreshnessPolicy {
    windows: HashMap<ResourceClass, Duration>,
    default_window: Duration,
}

impl FreshnessPolicy {
    pub fn new(default_window: Duration) -> Self {
        Self {
            windows: HashMap::new(),
            default_window,
        }
    }

    pub fn with_window(mut self, class: ResourceClass, window: Duration) -> Self {
        self.windows.insert(class, window);
        self
    }

    pub fn set_window(&mut self, class: ResourceClass, window: Duration) {
        self.windows.insert(class, window);
    }

    pub fn window(&self, class: ResourceClass) -> Duration {
        self.windows
            .get(&class)
            .copied()
            .unwrap_or(self.default_window)
    }

    pub fn default_window(&self) -> Duration {
        self.default_window
    }

    pub fn is_stale(&self, class: ResourceClass, last_updated_ms: u64, now_ms: u64) -> bool {
        is_stale(last_updated_ms, self.window(class), now_ms)
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        let ms = Duration::from_millis;
        FreshnessPolicy::new(ms(freshness::DEFAULT_MS))
            .with_window(ResourceClass::ChainStats, ms(freshness::CHAIN_STATS_MS))
            .with_window(ResourceClass::Transactions, ms(freshness::TRANSACTIONS_MS))
            .with_window(
                ResourceClass::TransactionDetail,
                ms(freshness::TRANSACTION_DETAIL_MS),
            )
            .with_window(ResourceClass::Account, ms(freshness::ACCOUNT_MS))
            .with_window(
                ResourceClass::AccountOverlay,
                ms(freshness::ACCOUNT_OVERLAY_MS),
            )
            .with_window(ResourceClass::Vouching, ms(freshness::VOUCHING_MS))
            .with_window(ResourceClass::Epoch, ms(freshness::EPOCH_MS))
            .with_window(ResourceClass::Donations, ms(freshness::DONATIONS_MS))
            .with_window(ResourceClass::Supply, ms(freshness::SUPPLY_MS))
    }
}
