// Configuration for the ledger sync layer
// Priority: CLI args > Environment variables > Config file > Defaults

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{polling, session, vouch};
use crate::normalize::normalize_address;
use crate::staleness::FreshnessPolicy;
use crate::types::ResourceClass;

/// ledgerx - Ledger explorer sync engine
///
/// Keeps chain metrics, transactions, accounts and governance views cached
/// and refreshed from a ledger node.
#[derive(Parser, Debug, Default)]
#[command(name = "ledgerx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ledger explorer sync engine", long_about = None)]
pub struct CliArgs {
    /// Ledger REST endpoint URL (e.g. https://node:8080/v1)
    #[arg(long, env = "LEDGER_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Request timeout in milliseconds (1000-60000)
    #[arg(long, env = "RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// Retries for transient HTTP failures (0-10)
    #[arg(long, env = "RPC_RETRIES")]
    pub rpc_retries: Option<u32>,

    /// Transactions to keep in the recent-transactions list (1-100)
    #[arg(long, env = "TX_LIST_LIMIT")]
    pub tx_list_limit: Option<u64>,

    /// Freshness window used by classes without their own (ms)
    #[arg(long, env = "DEFAULT_FRESHNESS_MS")]
    pub default_freshness_ms: Option<u64>,

    /// Per-class freshness overrides, e.g. "chain_stats=15000,account=60000"
    #[arg(long, env = "FRESHNESS")]
    pub freshness: Option<String>,

    /// Per-class poll interval overrides, e.g. "transactions=30000"
    #[arg(long, env = "POLL")]
    pub poll: Option<String>,

    /// Facade initialization attempts before giving up (1-10)
    #[arg(long, env = "INIT_ATTEMPTS")]
    pub init_attempts: Option<u32>,

    /// Fixed delay between initialization attempts in milliseconds (100-60000)
    #[arg(long, env = "INIT_BACKOFF_MS")]
    pub init_backoff_ms: Option<u64>,

    /// After readiness, how long to wait for data before showing placeholders (ms)
    #[arg(long, env = "READY_FALLBACK_MS")]
    pub ready_fallback_ms: Option<u64>,

    /// Epochs a vouch stays valid
    #[arg(long, env = "VOUCH_EXPIRY_EPOCHS")]
    pub vouch_expiry_epochs: Option<u64>,

    /// Remaining epochs at which a vouch is flagged as expiring soon
    #[arg(long, env = "VOUCH_WARNING_EPOCHS")]
    pub vouch_warning_epochs: Option<u64>,

    /// Comma-separated account addresses to keep refreshed
    #[arg(long, env = "WATCH_ACCOUNTS")]
    pub watch_accounts: Option<String>,

    /// Emit every update as a JSON line instead of a summary
    #[arg(long, env = "JSON_OUTPUT")]
    pub json: bool,

    /// Optional TOML file with [freshness] and [polling] tables
    #[arg(long, env = "LEDGERX_CONFIG")]
    pub config_file: Option<PathBuf>,
}

/// TOML configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    rpc_url: Option<String>,
    tx_list_limit: Option<u64>,
    /// class name -> window in ms
    freshness: BTreeMap<String, u64>,
    /// class name -> interval in ms
    polling: BTreeMap<String, u64>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_url: String,
    pub rpc_timeout_ms: u64,
    pub rpc_retries: u32,
    pub tx_list_limit: u64,
    pub freshness: FreshnessPolicy,
    pub poll_intervals: BTreeMap<ResourceClass, Duration>,
    pub init_attempts: u32,
    pub init_backoff_ms: u64,
    pub ready_fallback_ms: u64,
    pub vouch_expiry_epochs: u64,
    pub vouch_warning_epochs: u64,
    pub watch_accounts: Vec<String>,
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        let poll_intervals = [
            (ResourceClass::ChainStats, polling::CHAIN_STATS_MS),
            (ResourceClass::Transactions, polling::TRANSACTIONS_MS),
            (ResourceClass::TransactionDetail, polling::TRANSACTION_DETAIL_MS),
            (ResourceClass::Account, polling::ACCOUNT_MS),
            (ResourceClass::AccountOverlay, polling::ACCOUNT_OVERLAY_MS),
            (ResourceClass::Vouching, polling::VOUCHING_MS),
            (ResourceClass::Epoch, polling::EPOCH_MS),
            (ResourceClass::Donations, polling::DONATIONS_MS),
            (ResourceClass::Supply, polling::SUPPLY_MS),
        ]
        .into_iter()
        .map(|(c, ms)| (c, Duration::from_millis(ms)))
        .collect();

        Config {
            rpc_url: session::DEFAULT_RPC_URL.to_string(),
            rpc_timeout_ms: session::RPC_TIMEOUT_MS,
            rpc_retries: session::RPC_RETRIES,
            tx_list_limit: session::TX_LIST_LIMIT,
            freshness: FreshnessPolicy::default(),
            poll_intervals,
            init_attempts: session::INIT_ATTEMPTS,
            init_backoff_ms: session::INIT_BACKOFF_MS,
            ready_fallback_ms: session::READY_FALLBACK_MS,
            vouch_expiry_epochs: vouch::EXPIRY_EPOCHS,
            vouch_warning_epochs: vouch::WARNING_EPOCHS,
            watch_accounts: Vec::new(),
            json_output: false,
        }
    }
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

/// Parse "class=ms,class=ms" overrides
pub fn parse_class_overrides(s: &str, name: &str) -> Result<Vec<(ResourceClass, u64)>> {
    s.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (class, ms) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("{name}: expected class=ms, got '{pair}'"))?;
            let class: ResourceClass = class.parse().with_context(|| name.to_string())?;
            let ms: u64 = ms
                .trim()
                .parse()
                .with_context(|| format!("{name}: invalid milliseconds in '{pair}'"))?;
            Ok((class, validate_in_range(ms, 100, 3_600_000, name)?))
        })
        .collect()
}

fn parse_accounts(s: &str) -> Vec<String> {
    s.split(',')
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(normalize_address)
        .collect()
}

/// Load configuration from CLI args and environment variables
pub fn load() -> Result<Config> {
    Config::from_args(CliArgs::parse())
}

impl Config {
    pub fn from_args(args: CliArgs) -> Result<Config> {
        let mut cfg = Config::default();

        if let Some(ref path) = args.config_file {
            log::info!("📄 Loading configuration from {}", path.display());
            let file = load_file(path)?;
            cfg.merge_file(file)?;
        }

        if let Some(url) = args.rpc_url {
            cfg.rpc_url = url;
        }
        validate_url(&cfg.rpc_url, "LEDGER_RPC_URL")?;

        if let Some(t) = args.rpc_timeout_ms {
            cfg.rpc_timeout_ms = validate_in_range(t, 1000, 60000, "RPC_TIMEOUT_MS")?;
        }
        if let Some(r) = args.rpc_retries {
            cfg.rpc_retries = validate_in_range(r, 0, 10, "RPC_RETRIES")?;
        }
        if let Some(l) = args.tx_list_limit {
            cfg.tx_list_limit = l;
        }
        cfg.tx_list_limit = validate_in_range(cfg.tx_list_limit, 1, 100, "TX_LIST_LIMIT")?;

        if let Some(ms) = args.default_freshness_ms {
            let ms = validate_in_range(ms, 100, 3_600_000, "DEFAULT_FRESHNESS_MS")?;
            let mut policy = FreshnessPolicy::new(Duration::from_millis(ms));
            for class in ResourceClass::ALL {
                policy.set_window(class, cfg.freshness.window(class));
            }
            cfg.freshness = policy;
        }
        if let Some(ref s) = args.freshness {
            for (class, ms) in parse_class_overrides(s, "FRESHNESS")? {
                cfg.freshness.set_window(class, Duration::from_millis(ms));
            }
        }
        if let Some(ref s) = args.poll {
            for (class, ms) in parse_class_overrides(s, "POLL")? {
                cfg.poll_intervals.insert(class, Duration::from_millis(ms));
            }
        }

        if let Some(a) = args.init_attempts {
            cfg.init_attempts = validate_in_range(a, 1, 10, "INIT_ATTEMPTS")?;
        }
        if let Some(b) = args.init_backoff_ms {
            cfg.init_backoff_ms = validate_in_range(b, 100, 60000, "INIT_BACKOFF_MS")?;
        }
        if let Some(f) = args.ready_fallback_ms {
            cfg.ready_fallback_ms = validate_in_range(f, 1000, 120000, "READY_FALLBACK_MS")?;
        }
        if let Some(e) = args.vouch_expiry_epochs {
            cfg.vouch_expiry_epochs = validate_in_range(e, 1, 10_000, "VOUCH_EXPIRY_EPOCHS")?;
        }
        if let Some(w) = args.vouch_warning_epochs {
            cfg.vouch_warning_epochs = w;
        }
        if cfg.vouch_warning_epochs >= cfg.vouch_expiry_epochs {
            return Err(anyhow!(
                "VOUCH_WARNING_EPOCHS ({}) must be below VOUCH_EXPIRY_EPOCHS ({})",
                cfg.vouch_warning_epochs,
                cfg.vouch_expiry_epochs
            ));
        }

        if let Some(ref s) = args.watch_accounts {
            cfg.watch_accounts = parse_accounts(s);
        }
        cfg.json_output = args.json;

        cfg.warn_on_short_polls();
        Ok(cfg)
    }

    fn merge_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(url) = file.rpc_url {
            self.rpc_url = url;
        }
        if let Some(l) = file.tx_list_limit {
            self.tx_list_limit = l;
        }
        for (name, ms) in file.freshness {
            let class: ResourceClass = name.parse().context("[freshness]")?;
            let ms = validate_in_range(ms, 100, 3_600_000, &format!("[freshness] {name}"))?;
            self.freshness.set_window(class, Duration::from_millis(ms));
        }
        for (name, ms) in file.polling {
            let class: ResourceClass = name.parse().context("[polling]")?;
            let ms = validate_in_range(ms, 100, 3_600_000, &format!("[polling] {name}"))?;
            self.poll_intervals.insert(class, Duration::from_millis(ms));
        }
        Ok(())
    }

    /// Interval for a class; falls back to twice the freshness window
    pub fn poll_interval(&self, class: ResourceClass) -> Duration {
        self.poll_intervals
            .get(&class)
            .copied()
            .unwrap_or_else(|| self.freshness.window(class) * 2)
    }

    /// A tick landing inside the freshness window is skipped as fresh
    fn warn_on_short_polls(&self) {
        for class in ResourceClass::ALL {
            let poll = self.poll_interval(class);
            let window = self.freshness.window(class);
            if poll <= window {
                log::warn!(
                    "⚠️ poll interval for {class} ({}ms) does not exceed its freshness window ({}ms); some ticks will be skipped",
                    poll.as_millis(),
                    window.as_millis()
                );
            }
        }
    }

    pub fn print_summary(&self) {
        log::info!("ledgerx configuration:");
        log::info!("  RPC URL: {}", self.rpc_url);
        log::info!("  RPC Timeout: {}ms, retries: {}", self.rpc_timeout_ms, self.rpc_retries);
        log::info!("  Tx list limit: {}", self.tx_list_limit);
        for class in ResourceClass::ALL {
            log::info!(
                "  {:<18} fresh {:>7}ms  poll {:>7}ms",
                class.name(),
                self.freshness.window(class).as_millis(),
                self.poll_interval(class).as_millis()
            );
        }
        log::info!(
            "  Init: {} attempts, {}ms backoff; placeholder after {}ms",
            self.init_attempts,
            self.init_backoff_ms,
            self.ready_fallback_ms
        );
        if !self.watch_accounts.is_empty() {
            log::info!("  Watching: {}", self.watch_accounts.join(", "));
        }
    }
}

fn load_file(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
}
