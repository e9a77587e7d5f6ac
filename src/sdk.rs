//! Ledger SDK facade contract.
//!
//! The sync layer only ever talks to the ledger through this trait. The
//! production implementation lives in `http_sdk`; tests script their own.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::types::{Account, LedgerInfo, Transaction, TransactionDetail};

#[async_trait]
pub trait LedgerSdk: Send + Sync {
    /// Establish the connection (probe the node). Flips `is_ready` on success.
    async fn initialize(&self) -> Result<()>;

    /// Read-only Move view call
    async fn view(&self, function: &str, type_args: &[String], args: &[Value]) -> Result<Value>;

    async fn get_account(&self, address: &str) -> Result<Option<Account>>;

    async fn get_transactions(&self, limit: u64) -> Result<Vec<Transaction>>;

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<Option<TransactionDetail>>;

    async fn get_ledger_info(&self) -> Result<LedgerInfo>;

    fn is_ready(&self) -> bool;

    fn last_error(&self) -> Option<String>;

    /// View call without type arguments (the common case)
    async fn call_view(&self, function: &str, args: &[Value]) -> Result<Value> {
        self.view(function, &[], args).await
    }
}

/// Try `initialize` up to `attempts` times with a fixed `backoff` between
/// tries. Returns the attempt number that succeeded.
pub async fn initialize_with_retry(
    sdk: &dyn LedgerSdk,
    attempts: u32,
    backoff: Duration,
) -> Result<u32> {
    let attempts = attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match sdk.initialize().await {
            Ok(()) => {
                log::info!("🔌 [sdk] ledger facade ready (attempt {attempt}/{attempts})");
                return Ok(attempt);
            }
            Err(e) => {
                log::warn!("[sdk] initialization attempt {attempt}/{attempts} failed: {e:#}");
                last_err = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    let err = match last_err {
        Some(e) => e.context(format!(
            "ledger unreachable after {attempts} initialization attempts"
        )),
        None => anyhow!("ledger unreachable"),
    };
    log::error!("❌ [sdk] {err:#}");
    Err(err)
}
