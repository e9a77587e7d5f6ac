//! REST primitives for the ledger node and JSON -> model parsers.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

use crate::constants::COIN_STORE_PREFIX;
use crate::net::send_with_backoff;
use crate::normalize::normalize_address;
use crate::types::{
    AccountResource, LedgerInfo, Transaction, TransactionDetail, TxStatus,
};

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

pub fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .expect("reqwest client")
    })
}

pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a non-success response into an error carrying the node's message
async fn http_error(res: reqwest::Response) -> anyhow::Error {
    let status = res.status();
    let body: Value = res.json().await.unwrap_or(Value::Null);
    let msg = body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("request failed");
    match body.get("error_code").and_then(|c| c.as_str()) {
        Some(code) => anyhow!("http {} {code}: {msg}", status.as_u16()),
        None => anyhow!("http {} {msg}", status.as_u16()),
    }
}

/// GET `path`; a 404 is `Ok(None)`
pub async fn rest_get(
    base: &str,
    path: &str,
    timeout_ms: u64,
    retries: u32,
) -> Result<Option<Value>> {
    let url = join_url(base, path);
    log::debug!("[http] GET {url}");
    let rb = http_client()
        .get(&url)
        .timeout(Duration::from_millis(timeout_ms));
    let res = send_with_backoff(rb, &url, retries).await?;
    if res.status().as_u16() == 404 {
        return Ok(None);
    }
    if !res.status().is_success() {
        return Err(http_error(res).await);
    }
    let v: Value = res
        .json()
        .await
        .with_context(|| format!("invalid JSON from {url}"))?;
    Ok(Some(v))
}

pub async fn rest_post(
    base: &str,
    path: &str,
    body: &Value,
    timeout_ms: u64,
    retries: u32,
) -> Result<Value> {
    let url = join_url(base, path);
    log::debug!("[http] POST {url}");
    let rb = http_client()
        .post(&url)
        .json(body)
        .timeout(Duration::from_millis(timeout_ms));
    let res = send_with_backoff(rb, &url, retries).await?;
    if !res.status().is_success() {
        return Err(http_error(res).await);
    }
    res.json()
        .await
        .with_context(|| format!("invalid JSON from {url}"))
}

/// u64 fields arrive as decimal strings (sometimes as plain numbers)
fn field_u64(v: &Value, key: &str) -> Option<u64> {
    match v.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn field_str(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|s| s.as_str()).map(|s| s.to_string())
}

pub fn parse_ledger_info(v: &Value) -> Result<LedgerInfo> {
    Ok(LedgerInfo {
        chain_id: field_u64(v, "chain_id").ok_or_else(|| anyhow!("ledger info missing chain_id"))?,
        epoch: field_u64(v, "epoch").unwrap_or(0),
        block_height: field_u64(v, "block_height").unwrap_or(0),
        ledger_version: field_u64(v, "ledger_version")
            .ok_or_else(|| anyhow!("ledger info missing ledger_version"))?,
        ledger_timestamp: v
            .get("ledger_timestamp")
            .map(|t| match t {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "0".to_string()),
    })
}

/// Parse a transaction from the node's JSON; `None` when it has no hash
pub fn parse_transaction(v: &Value) -> Option<Transaction> {
    let hash = v.get("hash")?.as_str()?.to_string();
    let kind = v.get("type").and_then(|t| t.as_str()).unwrap_or("");

    let status = if kind == "pending_transaction" {
        TxStatus::Pending
    } else {
        match v.get("success").and_then(|s| s.as_bool()) {
            Some(true) => TxStatus::Success,
            Some(false) => TxStatus::Failure,
            None => TxStatus::Pending,
        }
    };

    let version = if status == TxStatus::Pending {
        None
    } else {
        field_u64(v, "version")
    };

    // Timestamp stays a string: microsecond values overflow f64 precision
    let timestamp = match v.get("timestamp") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    };

    Some(Transaction {
        hash,
        version,
        sender: field_str(v, "sender").map(|s| normalize_address(&s)),
        sequence_number: field_u64(v, "sequence_number"),
        timestamp,
        status,
        function: v
            .get("payload")
            .and_then(|p| p.get("function"))
            .and_then(|f| f.as_str())
            .map(|s| s.to_string()),
        block_height: field_u64(v, "block_height"),
    })
}

pub fn parse_transaction_detail(v: &Value) -> Option<TransactionDetail> {
    let transaction = parse_transaction(v)?;
    Some(TransactionDetail {
        transaction,
        vm_status: field_str(v, "vm_status").unwrap_or_default(),
        gas_used: field_u64(v, "gas_used").unwrap_or(0),
        gas_unit_price: field_u64(v, "gas_unit_price").unwrap_or(0),
        payload: v.get("payload").cloned().unwrap_or(Value::Null),
        events: v
            .get("events")
            .and_then(|e| e.as_array())
            .cloned()
            .unwrap_or_default(),
    })
}

pub fn parse_resources(v: &Value) -> Vec<AccountResource> {
    v.as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|r| {
                    Some(AccountResource {
                        type_tag: r.get("type")?.as_str()?.to_string(),
                        data: r.get("data").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Balance from the first coin-store resource; everything else stays opaque
pub fn coin_balance(resources: &[AccountResource]) -> u64 {
    resources
        .iter()
        .find(|r| r.type_tag.starts_with(COIN_STORE_PREFIX))
        .and_then(|r| r.data.get("coin"))
        .and_then(|c| field_u64(c, "value"))
        .unwrap_or(0)
}
