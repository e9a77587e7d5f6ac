//! Scripted in-memory ledger facade shared by the integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use ledgerx::constants::view_fn;
use ledgerx::sdk::LedgerSdk;
use ledgerx::types::{Account, LedgerInfo, Transaction, TransactionDetail, TxStatus};

pub struct MockSdk {
    ready: AtomicBool,
    init_failures: AtomicU32,
    init_calls: AtomicU32,
    delay: Mutex<Option<Duration>>,
    views: Mutex<HashMap<String, Result<Value, String>>>,
    /// Keyed by (function, first argument); wins over `views`
    arg_views: Mutex<HashMap<(String, String), Result<Value, String>>>,
    calls: Mutex<Vec<String>>,
    accounts: Mutex<HashMap<String, Account>>,
    account_error: Mutex<Option<String>>,
    ledger: Mutex<Result<LedgerInfo, String>>,
    transactions: Mutex<Vec<Transaction>>,
    details: Mutex<HashMap<String, TransactionDetail>>,
}

pub fn ledger_info(epoch: u64, version: u64) -> LedgerInfo {
    LedgerInfo {
        chain_id: 1,
        epoch,
        block_height: version / 3,
        ledger_version: version,
        ledger_timestamp: "1700000000000000".into(),
    }
}

pub fn account(address: &str, balance: u64) -> Account {
    Account {
        address: address.to_string(),
        balance,
        unlocked: None,
        sequence_number: 4,
        resources: Vec::new(),
    }
}

pub fn tx(hash: &str, version: u64) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        version: Some(version),
        sender: Some("0xa".into()),
        sequence_number: Some(1),
        timestamp: "1700000000000001".into(),
        status: TxStatus::Success,
        function: None,
        block_height: None,
    }
}

impl MockSdk {
    /// Ready facade with nothing scripted
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
            init_failures: AtomicU32::new(0),
            init_calls: AtomicU32::new(0),
            delay: Mutex::new(None),
            views: Mutex::new(HashMap::new()),
            arg_views: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            accounts: Mutex::new(HashMap::new()),
            account_error: Mutex::new(None),
            ledger: Mutex::new(Ok(ledger_info(120, 9_000))),
            transactions: Mutex::new(Vec::new()),
            details: Mutex::new(HashMap::new()),
        }
    }

    /// Facade that has not been initialized yet
    pub fn not_ready() -> Self {
        let sdk = Self::new();
        sdk.ready.store(false, Ordering::SeqCst);
        sdk
    }

    /// Chain-level views scripted with plausible values
    pub fn with_chain() -> Self {
        let sdk = Self::new();
        sdk.set_view(view_fn::CURRENT_VALIDATORS, json!([["0xv1", "0xv2", "0xv3"]]));
        sdk.set_view(view_fn::CURRENT_EPOCH, json!(["120"]));
        sdk.set_view(view_fn::EPOCH_REWARD, json!(["1000000", "5", "6", "7"]));
        sdk.set_view(view_fn::EPOCH_SECS_REMAINING, json!(["3600"]));
        sdk.set_view(
            view_fn::SUPPLY_STATS,
            json!(["100000000", "20000000", "10000000", "5000000", "65000000"]),
        );
        sdk.set_view(view_fn::TOTAL_SUPPLY, json!(["100000000"]));
        sdk.set_view(view_fn::COMMUNITY_WALLETS, json!([["0xcw1", "0xcw2"]]));
        sdk
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn fail_init_times(&self, n: u32) {
        self.init_failures.store(n, Ordering::SeqCst);
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Every facade call sleeps this long first (tokio time)
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn set_view(&self, function: &str, value: Value) {
        self.views
            .lock()
            .unwrap()
            .insert(function.to_string(), Ok(value));
    }

    pub fn fail_view(&self, function: &str, msg: &str) {
        self.views
            .lock()
            .unwrap()
            .insert(function.to_string(), Err(msg.to_string()));
    }

    /// Script one function for calls whose first argument is `arg`
    pub fn set_view_for(&self, function: &str, arg: &str, value: Value) {
        self.arg_views
            .lock()
            .unwrap()
            .insert((function.to_string(), arg.to_string()), Ok(value));
    }

    pub fn fail_view_for(&self, function: &str, arg: &str, msg: &str) {
        self.arg_views
            .lock()
            .unwrap()
            .insert((function.to_string(), arg.to_string()), Err(msg.to_string()));
    }

    pub fn set_account(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.address.clone(), account);
    }

    pub fn fail_accounts(&self, msg: Option<&str>) {
        *self.account_error.lock().unwrap() = msg.map(str::to_string);
    }

    pub fn set_ledger(&self, info: Result<LedgerInfo, String>) {
        *self.ledger.lock().unwrap() = info;
    }

    pub fn set_transactions(&self, txs: Vec<Transaction>) {
        *self.transactions.lock().unwrap() = txs;
    }

    pub fn set_detail(&self, detail: TransactionDetail) {
        self.details
            .lock()
            .unwrap()
            .insert(detail.transaction.hash.clone(), detail);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose label starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    async fn enter(&self, label: String) {
        self.calls.lock().unwrap().push(label);
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl LedgerSdk for MockSdk {
    async fn initialize(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let left = self.init_failures.load(Ordering::SeqCst);
        if left > 0 {
            self.init_failures.store(left - 1, Ordering::SeqCst);
            return Err(anyhow!("connection refused"));
        }
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn view(&self, function: &str, _type_args: &[String], args: &[Value]) -> Result<Value> {
        let first = args.first().and_then(|a| a.as_str());
        let label = match first {
            Some(arg) => format!("{function}({arg})"),
            None => function.to_string(),
        };
        self.enter(label).await;
        let by_arg = first.and_then(|arg| {
            self.arg_views
                .lock()
                .unwrap()
                .get(&(function.to_string(), arg.to_string()))
                .cloned()
        });
        let scripted = by_arg.or_else(|| self.views.lock().unwrap().get(function).cloned());
        match scripted {
            Some(Ok(v)) => Ok(v),
            Some(Err(msg)) => Err(anyhow!("{msg}")),
            None => Err(anyhow!("view {function} aborted: function not found")),
        }
    }

    async fn get_account(&self, address: &str) -> Result<Option<Account>> {
        self.enter(format!("get_account({address})")).await;
        if let Some(msg) = self.account_error.lock().unwrap().clone() {
            return Err(anyhow!("{msg}"));
        }
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn get_transactions(&self, limit: u64) -> Result<Vec<Transaction>> {
        self.enter("get_transactions".into()).await;
        let txs = self.transactions.lock().unwrap().clone();
        Ok(txs.into_iter().take(limit as usize).collect())
    }

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<Option<TransactionDetail>> {
        self.enter(format!("get_transaction_by_hash({hash})")).await;
        Ok(self.details.lock().unwrap().get(hash).cloned())
    }

    async fn get_ledger_info(&self) -> Result<LedgerInfo> {
        self.enter("get_ledger_info".into()).await;
        self.ledger
            .lock()
            .unwrap()
            .clone()
            .map_err(|msg| anyhow!("{msg}"))
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn last_error(&self) -> Option<String> {
        None
    }
}

/// Let spawned tasks run without moving the clock
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
