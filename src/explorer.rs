//! Explorer context: every domain store and synchronizer, constructed once
//! and handed to consumers explicitly.
//!
//! Consumers read through `read`/typed accessors, trigger `refresh`, and
//! report view lifecycle through `on_become_visible`/`on_become_hidden`/
//! `on_foreground`. Errors never escape as `Err`; they show up on the read
//! view and in the session status.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::cache::ReadView;
use crate::clock::{Clock, MonotonicClock};
use crate::config::Config;
use crate::fetchers::{
    AccountFetcher, ChainStatsFetcher, DonationsFetcher, EpochFetcher, OverlayFetcher,
    SupplyFetcher, TransactionDetailFetcher, TransactionsFetcher, VouchingFetcher,
};
use crate::normalize::normalize_address;
use crate::poller::{Poller, Refresher};
use crate::sdk::{initialize_with_retry, LedgerSdk};
use crate::store::StoreEvent;
use crate::synchronizer::{RefreshOutcome, Synchronizer};
use crate::types::{
    Account, AccountOverlay, ChainStats, Donations, EpochData, Resource, ResourceKey,
    SupplyStats, Transaction, TransactionDetail,
};
use crate::vouch::{summarize, VouchRules, VouchSummary};

/// One synchronizer per domain
pub struct Domains {
    sdk: Arc<dyn LedgerSdk>,
    pub chain_stats: Synchronizer<ChainStatsFetcher>,
    pub transactions: Synchronizer<TransactionsFetcher>,
    pub transaction_detail: Synchronizer<TransactionDetailFetcher>,
    pub account: Synchronizer<AccountFetcher>,
    pub overlay: Synchronizer<OverlayFetcher>,
    pub vouching: Synchronizer<VouchingFetcher>,
    pub epoch: Synchronizer<EpochFetcher>,
    pub donations: Synchronizer<DonationsFetcher>,
    pub supply: Synchronizer<SupplyFetcher>,
}

impl Domains {
    pub fn new(sdk: Arc<dyn LedgerSdk>, cfg: &Config, clock: Arc<dyn Clock>) -> Self {
        let f = &cfg.freshness;
        Self {
            chain_stats: Synchronizer::new(ChainStatsFetcher, sdk.clone(), f, clock.clone()),
            transactions: Synchronizer::new(
                TransactionsFetcher::new(cfg.tx_list_limit),
                sdk.clone(),
                f,
                clock.clone(),
            ),
            transaction_detail: Synchronizer::new(
                TransactionDetailFetcher,
                sdk.clone(),
                f,
                clock.clone(),
            ),
            account: Synchronizer::new(AccountFetcher, sdk.clone(), f, clock.clone()),
            overlay: Synchronizer::new(OverlayFetcher, sdk.clone(), f, clock.clone()),
            vouching: Synchronizer::new(VouchingFetcher, sdk.clone(), f, clock.clone()),
            epoch: Synchronizer::new(EpochFetcher, sdk.clone(), f, clock.clone()),
            donations: Synchronizer::new(DonationsFetcher, sdk.clone(), f, clock.clone()),
            supply: Synchronizer::new(SupplyFetcher, sdk.clone(), f, clock),
            sdk,
        }
    }

    pub fn read(&self, key: &ResourceKey) -> ReadView<Resource> {
        match &key.normalized() {
            ResourceKey::ChainStats => self.chain_stats.read(&()).map(Resource::ChainStats),
            ResourceKey::Transactions => self.transactions.read(&()).map(Resource::Transactions),
            ResourceKey::Epoch => self.epoch.read(&()).map(Resource::Epoch),
            ResourceKey::Supply => self.supply.read(&()).map(Resource::Supply),
            ResourceKey::TransactionDetail(h) => self
                .transaction_detail
                .read(h)
                .map(Resource::TransactionDetail),
            ResourceKey::Account(a) => self.account.read(a).map(Resource::Account),
            ResourceKey::AccountOverlay(a) => self.overlay.read(a).map(Resource::AccountOverlay),
            ResourceKey::Vouching(a) => self.vouching.read(a).map(Resource::Vouching),
            ResourceKey::Donations(a) => self.donations.read(a).map(Resource::Donations),
        }
    }

    pub fn is_any_loading(&self) -> bool {
        self.chain_stats.store().is_any_loading()
            || self.transactions.store().is_any_loading()
            || self.transaction_detail.store().is_any_loading()
            || self.account.store().is_any_loading()
            || self.overlay.store().is_any_loading()
            || self.vouching.store().is_any_loading()
            || self.epoch.store().is_any_loading()
            || self.donations.store().is_any_loading()
            || self.supply.store().is_any_loading()
    }

    /// Every entry whose latest fetch failed
    pub fn errors(&self) -> Vec<(ResourceKey, String)> {
        fn tag<K>(errs: Vec<(K, String)>, to_key: impl Fn(K) -> ResourceKey) -> Vec<(ResourceKey, String)> {
            errs.into_iter().map(|(k, e)| (to_key(k), e)).collect()
        }
        let mut out = Vec::new();
        out.extend(tag(self.chain_stats.store().errors(), |_| ResourceKey::ChainStats));
        out.extend(tag(self.transactions.store().errors(), |_| ResourceKey::Transactions));
        out.extend(tag(self.epoch.store().errors(), |_| ResourceKey::Epoch));
        out.extend(tag(self.supply.store().errors(), |_| ResourceKey::Supply));
        out.extend(tag(
            self.transaction_detail.store().errors(),
            ResourceKey::TransactionDetail,
        ));
        out.extend(tag(self.account.store().errors(), ResourceKey::Account));
        out.extend(tag(self.overlay.store().errors(), ResourceKey::AccountOverlay));
        out.extend(tag(self.vouching.store().errors(), ResourceKey::Vouching));
        out.extend(tag(self.donations.store().errors(), ResourceKey::Donations));
        out.sort();
        out
    }

    /// Merge every store's notifications into one stream keyed by
    /// `ResourceKey`. Needs a tokio runtime.
    pub fn subscribe(&self) -> UnboundedReceiver<StoreEvent<ResourceKey>> {
        let (tx, rx) = unbounded_channel();
        forward(self.chain_stats.store().subscribe(), tx.clone(), |_| ResourceKey::ChainStats);
        forward(self.transactions.store().subscribe(), tx.clone(), |_| ResourceKey::Transactions);
        forward(self.epoch.store().subscribe(), tx.clone(), |_| ResourceKey::Epoch);
        forward(self.supply.store().subscribe(), tx.clone(), |_| ResourceKey::Supply);
        forward(
            self.transaction_detail.store().subscribe(),
            tx.clone(),
            ResourceKey::TransactionDetail,
        );
        forward(self.account.store().subscribe(), tx.clone(), ResourceKey::Account);
        forward(self.overlay.store().subscribe(), tx.clone(), ResourceKey::AccountOverlay);
        forward(self.vouching.store().subscribe(), tx.clone(), ResourceKey::Vouching);
        forward(self.donations.store().subscribe(), tx, ResourceKey::Donations);
        rx
    }
}

fn forward<K: Send + 'static>(
    mut rx: UnboundedReceiver<StoreEvent<K>>,
    tx: UnboundedSender<StoreEvent<ResourceKey>>,
    to_key: fn(K) -> ResourceKey,
) {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let mapped = StoreEvent {
                class: ev.class,
                key: to_key(ev.key),
                kind: ev.kind,
            };
            if tx.send(mapped).is_err() {
                break;
            }
        }
    });
}

#[async_trait]
impl Refresher for Domains {
    fn is_ready(&self) -> bool {
        self.sdk.is_ready()
    }

    async fn refresh(&self, key: &ResourceKey, force: bool) -> RefreshOutcome {
        match &key.normalized() {
            ResourceKey::ChainStats => self.chain_stats.refresh(&(), force).await,
            ResourceKey::Transactions => self.transactions.refresh(&(), force).await,
            ResourceKey::Epoch => self.epoch.refresh(&(), force).await,
            ResourceKey::Supply => self.supply.refresh(&(), force).await,
            ResourceKey::TransactionDetail(h) => self.transaction_detail.refresh(h, force).await,
            ResourceKey::Account(a) => self.account.refresh(a, force).await,
            ResourceKey::AccountOverlay(a) => self.overlay.refresh(a, force).await,
            ResourceKey::Vouching(a) => self.vouching.refresh(a, force).await,
            ResourceKey::Donations(a) => self.donations.refresh(a, force).await,
        }
    }
}

/// Connection state of the facade, surfaced as data
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub ready: bool,
    pub init_attempts: u32,
    /// Set once every initialization attempt failed
    pub connectivity_error: Option<String>,
    /// Clock reading when the facade became ready
    pub ready_since_ms: Option<u64>,
}

/// Base account merged with its overlay on read
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountView {
    pub account: Account,
    pub overlay: Option<AccountOverlay>,
}

pub struct Explorer {
    sdk: Arc<dyn LedgerSdk>,
    config: Config,
    clock: Arc<dyn Clock>,
    domains: Arc<Domains>,
    poller: Poller,
    session: Mutex<SessionStatus>,
}

impl Explorer {
    pub fn new(sdk: Arc<dyn LedgerSdk>, config: Config) -> Self {
        Self::with_clock(sdk, config, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(sdk: Arc<dyn LedgerSdk>, config: Config, clock: Arc<dyn Clock>) -> Self {
        let domains = Arc::new(Domains::new(sdk.clone(), &config, clock.clone()));
        let poller = Poller::new(domains.clone(), &config);
        Self {
            sdk,
            config,
            clock,
            domains,
            poller,
            session: Mutex::new(SessionStatus::default()),
        }
    }

    fn session_mut(&self) -> MutexGuard<'_, SessionStatus> {
        self.session.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Bring the facade up with bounded retry. On final failure the error is
    /// kept as the session's persistent connectivity error.
    pub async fn connect(&self) -> Result<()> {
        let backoff = Duration::from_millis(self.config.init_backoff_ms);
        let res = initialize_with_retry(self.sdk.as_ref(), self.config.init_attempts, backoff).await;

        let mut session = self.session_mut();
        match res {
            Ok(attempt) => {
                session.init_attempts = attempt;
                session.ready = true;
                session.connectivity_error = None;
                session.ready_since_ms = Some(self.clock.now_ms());
                Ok(())
            }
            Err(e) => {
                session.init_attempts = self.config.init_attempts.max(1);
                session.ready = false;
                session.connectivity_error = Some(format!("{e:#}"));
                Err(e)
            }
        }
    }

    pub fn session(&self) -> SessionStatus {
        let mut status = self.session_mut().clone();
        status.ready = status.ready && self.sdk.is_ready();
        if status.connectivity_error.is_none() && !status.ready {
            status.connectivity_error = self.sdk.last_error();
        }
        status
    }

    /// Ready for longer than the fallback window and still nothing fetched
    fn placeholder_due(&self, last_updated_ms: u64) -> bool {
        if last_updated_ms != 0 {
            return false;
        }
        match self.session_mut().ready_since_ms {
            Some(since) => self.clock.now_ms().saturating_sub(since) > self.config.ready_fallback_ms,
            None => false,
        }
    }

    fn finish<T>(&self, mut view: ReadView<T>) -> ReadView<T> {
        view.is_placeholder = self.placeholder_due(view.last_updated_ms);
        view
    }

    pub fn read(&self, key: &ResourceKey) -> ReadView<Resource> {
        self.finish(self.domains.read(key))
    }

    pub async fn refresh(&self, key: &ResourceKey, force: bool) -> RefreshOutcome {
        self.domains.refresh(key, force).await
    }

    pub fn on_become_visible(&self, key: ResourceKey) {
        self.poller.on_become_visible(key);
    }

    pub fn on_become_hidden(&self, key: &ResourceKey) {
        self.poller.on_become_hidden(key);
    }

    pub async fn on_foreground(&self) -> Vec<(ResourceKey, RefreshOutcome)> {
        self.poller.on_foreground().await
    }

    pub fn active_keys(&self) -> Vec<ResourceKey> {
        self.poller.active_keys()
    }

    /// Poll every address-keyed domain of one account
    pub fn watch_account(&self, address: &str) {
        for key in ResourceKey::account_bundle(address) {
            self.poller.on_become_visible(key);
        }
    }

    pub fn unwatch_account(&self, address: &str) {
        for key in ResourceKey::account_bundle(address) {
            self.poller.on_become_hidden(&key);
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<StoreEvent<ResourceKey>> {
        self.domains.subscribe()
    }

    pub fn is_any_loading(&self) -> bool {
        self.domains.is_any_loading()
    }

    pub fn errors(&self) -> Vec<(ResourceKey, String)> {
        self.domains.errors()
    }

    pub fn chain_stats(&self) -> ReadView<ChainStats> {
        self.finish(self.domains.chain_stats.read(&()))
    }

    pub fn transactions(&self) -> ReadView<Vec<Transaction>> {
        self.finish(self.domains.transactions.read(&()))
    }

    pub fn transaction(&self, hash: &str) -> ReadView<TransactionDetail> {
        let hash = hash.trim().to_lowercase();
        self.finish(self.domains.transaction_detail.read(&hash))
    }

    pub fn epoch(&self) -> ReadView<EpochData> {
        self.finish(self.domains.epoch.read(&()))
    }

    pub fn supply(&self) -> ReadView<SupplyStats> {
        self.finish(self.domains.supply.read(&()))
    }

    pub fn donations(&self, donor: &str) -> ReadView<Donations> {
        self.finish(self.domains.donations.read(&normalize_address(donor)))
    }

    /// Base account with the overlay merged in. Loading, error and staleness
    /// follow the base account; a missing overlay never invalidates it.
    pub fn account_view(&self, address: &str) -> ReadView<AccountView> {
        let address = normalize_address(address);
        let overlay = self.domains.overlay.store().payload(&address);
        self.finish(self.domains.account.read(&address))
            .map(|account| AccountView { account, overlay })
    }

    /// Highest epoch any store has seen; 0 when none has
    pub fn current_epoch(&self) -> u64 {
        let from_epoch = self.domains.epoch.store().payload(&()).map_or(0, |e| e.epoch);
        let from_head = self
            .domains
            .chain_stats
            .store()
            .payload(&())
            .map_or(0, |s| s.ledger.epoch);
        from_epoch.max(from_head)
    }

    /// Classified, display-ordered vouches, evaluated against the freshest
    /// epoch known right now.
    pub fn vouches(&self, address: &str) -> ReadView<VouchSummary> {
        let rules = VouchRules {
            expiry_epochs: self.config.vouch_expiry_epochs,
            warning_epochs: self.config.vouch_warning_epochs,
        };
        let known = self.current_epoch();
        let view = self.domains.vouching.read(&normalize_address(address));
        self.finish(view)
            .map(|graph| summarize(&graph, known.max(graph.current_epoch), rules))
    }
}
