// Headless watcher: keeps the chain-head domains and any watched accounts
// synchronized and prints one line per update.

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;

use ledgerx::{
    cache::ReadView,
    config::load,
    explorer::Explorer,
    http_sdk::HttpLedger,
    sdk::LedgerSdk,
    store::{ChangeKind, StoreEvent},
    types::{Resource, ResourceKey},
    util_text::{format_coin, format_coin_compact, format_ledger_timestamp, format_secs, short_address},
};

fn describe(key: &ResourceKey, view: &ReadView<Resource>) -> String {
    if let Some(err) = &view.error {
        return format!("{key}: error: {err}");
    }
    let Some(payload) = &view.payload else {
        return format!("{key}: no data");
    };
    let body = match payload {
        Resource::ChainStats(s) => format!(
            "chain {} height {} version {} epoch {} validators {} at {}",
            s.ledger.chain_id,
            s.ledger.block_height,
            s.ledger.ledger_version,
            s.ledger.epoch,
            s.validator_count,
            format_ledger_timestamp(&s.ledger.ledger_timestamp)
        ),
        Resource::Transactions(txs) => match txs.first() {
            Some(tx) => format!(
                "{} txs, newest {} ({:?})",
                txs.len(),
                short_address(&tx.hash),
                tx.status
            ),
            None => "0 txs".to_string(),
        },
        Resource::TransactionDetail(d) => format!(
            "{:?} gas {} vm_status {}",
            d.transaction.status, d.gas_used, d.vm_status
        ),
        Resource::Account(a) => format!(
            "balance {} (unlocked {}) seq {}",
            format_coin(a.balance),
            a.unlocked.map(format_coin).unwrap_or_else(|| "?".into()),
            a.sequence_number
        ),
        Resource::AccountOverlay(o) => format!(
            "founder {} score {} validator {} community wallet {}",
            o.is_founder, o.vouch_score, o.validator.is_validator, o.community_wallet.is_community_wallet
        ),
        Resource::Vouching(g) => format!(
            "{} received, {} given",
            g.received.len(),
            g.given.len()
        ),
        Resource::Epoch(e) => format!(
            "epoch {} validators {} reward {} remaining {}",
            e.epoch,
            e.validator_set.len(),
            format_coin(e.consensus_reward),
            e.seconds_remaining.map(format_secs).unwrap_or_else(|| "?".into())
        ),
        Resource::Donations(d) => format!(
            "{} wallets, total {}",
            d.entries.len(),
            format_coin(d.total())
        ),
        Resource::Supply(s) => format!(
            "total {} circulating {} locked {}",
            format_coin_compact(s.total),
            format_coin_compact(s.circulating),
            format_coin_compact(s.slow_locked)
        ),
    };
    format!("{key}: {body}")
}

fn print_event(explorer: &Explorer, ev: &StoreEvent<ResourceKey>, json_output: bool) -> Result<()> {
    let view = explorer.read(&ev.key);
    if json_output {
        let line = json!({
            "key": ev.key.to_string(),
            "kind": format!("{:?}", ev.kind).to_lowercase(),
            "view": view,
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("{}", describe(&ev.key, &view));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = load().context("Failed to load configuration")?;
    cfg.print_summary();

    let sdk: Arc<dyn LedgerSdk> = Arc::new(HttpLedger::new(&cfg));
    let explorer = Explorer::new(sdk, cfg.clone());
    let mut events = explorer.subscribe();

    explorer
        .connect()
        .await
        .context("Ledger facade never became ready")?;

    for key in [
        ResourceKey::ChainStats,
        ResourceKey::Transactions,
        ResourceKey::Epoch,
        ResourceKey::Supply,
    ] {
        explorer.on_become_visible(key);
    }
    for address in &cfg.watch_accounts {
        explorer.watch_account(address);
    }
    log::info!("🚀 Watching {} resources", explorer.active_keys().len());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            ev = events.recv() => {
                let Some(ev) = ev else { break };
                if ev.kind != ChangeKind::Loading {
                    print_event(&explorer, &ev, cfg.json_output)?;
                }
            }
            _ = &mut ctrl_c => {
                log::info!("👋 Shutting down");
                break;
            }
        }
    }

    let errors = explorer.errors();
    if !errors.is_empty() {
        log::warn!("{} resources ended in error", errors.len());
    }
    Ok(())
}
