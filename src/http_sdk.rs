//! `LedgerSdk` over the node's REST API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::config::Config;
use crate::normalize::normalize_address;
use crate::rpc_utils::{
    coin_balance, parse_ledger_info, parse_resources, parse_transaction,
    parse_transaction_detail, rest_get, rest_post,
};
use crate::sdk::LedgerSdk;
use crate::types::{sort_transactions, Account, LedgerInfo, Transaction, TransactionDetail};

pub struct HttpLedger {
    base_url: String,
    timeout_ms: u64,
    retries: u32,
    ready: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl HttpLedger {
    pub fn new(cfg: &Config) -> Self {
        Self {
            base_url: cfg.rpc_url.clone(),
            timeout_ms: cfg.rpc_timeout_ms,
            retries: cfg.rpc_retries,
            ready: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Remember the latest transport failure for `last_error`
    fn track<T>(&self, res: Result<T>) -> Result<T> {
        if let Ok(mut slot) = self.last_error.lock() {
            match &res {
                Ok(_) => *slot = None,
                Err(e) => *slot = Some(format!("{e:#}")),
            }
        }
        res
    }

    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let res = rest_get(&self.base_url, path, self.timeout_ms, self.retries).await;
        self.track(res)
    }
}

#[async_trait]
impl LedgerSdk for HttpLedger {
    async fn initialize(&self) -> Result<()> {
        let info = self.get_ledger_info().await?;
        log::info!(
            "[http] connected to chain {} at version {} (epoch {})",
            info.chain_id,
            info.ledger_version,
            info.epoch
        );
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn view(&self, function: &str, type_args: &[String], args: &[Value]) -> Result<Value> {
        let body = json!({
            "function": function,
            "type_arguments": type_args,
            "arguments": args,
        });
        let res = rest_post(&self.base_url, "view", &body, self.timeout_ms, self.retries).await;
        self.track(res.map_err(|e| e.context(format!("view {function}"))))
    }

    async fn get_account(&self, address: &str) -> Result<Option<Account>> {
        let address = normalize_address(address);
        let encoded = urlencoding::encode(&address);

        let Some(base) = self.get(&format!("accounts/{encoded}")).await? else {
            return Ok(None);
        };
        let resources = self
            .get(&format!("accounts/{encoded}/resources"))
            .await?
            .map(|v| parse_resources(&v))
            .unwrap_or_default();

        let sequence_number = base
            .get("sequence_number")
            .and_then(|s| s.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        Ok(Some(Account {
            balance: coin_balance(&resources),
            unlocked: None,
            address,
            sequence_number,
            resources,
        }))
    }

    async fn get_transactions(&self, limit: u64) -> Result<Vec<Transaction>> {
        let v = self
            .get(&format!("transactions?limit={limit}"))
            .await?
            .ok_or_else(|| anyhow!("transactions endpoint not found"))?;
        let mut txs: Vec<Transaction> = v
            .as_array()
            .map(|arr| arr.iter().filter_map(parse_transaction).collect())
            .unwrap_or_default();
        sort_transactions(&mut txs);
        Ok(txs)
    }

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<Option<TransactionDetail>> {
        let path = format!("transactions/by_hash/{}", urlencoding::encode(hash));
        Ok(self
            .get(&path)
            .await?
            .as_ref()
            .and_then(parse_transaction_detail))
    }

    async fn get_ledger_info(&self) -> Result<LedgerInfo> {
        let v = self
            .get("")
            .await?
            .ok_or_else(|| anyhow!("ledger info endpoint not found"))?;
        let res = parse_ledger_info(&v);
        self.track(res)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }
}
