use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::normalize::normalize_address;

/// Resource classes, one per cached domain. Each class carries its own
/// freshness window and poll interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    ChainStats,
    Transactions,
    TransactionDetail,
    Account,
    AccountOverlay,
    Vouching,
    Epoch,
    Donations,
    Supply,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 9] = [
        ResourceClass::ChainStats,
        ResourceClass::Transactions,
        ResourceClass::TransactionDetail,
        ResourceClass::Account,
        ResourceClass::AccountOverlay,
        ResourceClass::Vouching,
        ResourceClass::Epoch,
        ResourceClass::Donations,
        ResourceClass::Supply,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceClass::ChainStats => "chain_stats",
            ResourceClass::Transactions => "transactions",
            ResourceClass::TransactionDetail => "transaction_detail",
            ResourceClass::Account => "account",
            ResourceClass::AccountOverlay => "account_overlay",
            ResourceClass::Vouching => "vouching",
            ResourceClass::Epoch => "epoch",
            ResourceClass::Donations => "donations",
            ResourceClass::Supply => "supply",
        }
    }
}

impl std::str::FromStr for ResourceClass {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        ResourceClass::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| anyhow!("Unknown resource class '{s}'"))
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one cached resource: a singleton, or a class plus address/hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    ChainStats,
    Transactions,
    Epoch,
    Supply,
    TransactionDetail(String),
    Account(String),
    AccountOverlay(String),
    Vouching(String),
    Donations(String),
}

impl ResourceKey {
    pub fn class(&self) -> ResourceClass {
        match self {
            ResourceKey::ChainStats => ResourceClass::ChainStats,
            ResourceKey::Transactions => ResourceClass::Transactions,
            ResourceKey::Epoch => ResourceClass::Epoch,
            ResourceKey::Supply => ResourceClass::Supply,
            ResourceKey::TransactionDetail(_) => ResourceClass::TransactionDetail,
            ResourceKey::Account(_) => ResourceClass::Account,
            ResourceKey::AccountOverlay(_) => ResourceClass::AccountOverlay,
            ResourceKey::Vouching(_) => ResourceClass::Vouching,
            ResourceKey::Donations(_) => ResourceClass::Donations,
        }
    }

    /// Address-keyed constructors normalize the address so `0xABC` and `abc`
    /// land on the same entry.
    pub fn account(address: &str) -> Self {
        ResourceKey::Account(normalize_address(address))
    }

    pub fn overlay(address: &str) -> Self {
        ResourceKey::AccountOverlay(normalize_address(address))
    }

    pub fn vouching(address: &str) -> Self {
        ResourceKey::Vouching(normalize_address(address))
    }

    pub fn donations(address: &str) -> Self {
        ResourceKey::Donations(normalize_address(address))
    }

    pub fn transaction(hash: &str) -> Self {
        ResourceKey::TransactionDetail(hash.trim().to_lowercase())
    }

    /// Same key with its address or hash in canonical form
    pub fn normalized(&self) -> Self {
        match self {
            ResourceKey::TransactionDetail(h) => ResourceKey::transaction(h),
            ResourceKey::Account(a) => ResourceKey::account(a),
            ResourceKey::AccountOverlay(a) => ResourceKey::overlay(a),
            ResourceKey::Vouching(a) => ResourceKey::vouching(a),
            ResourceKey::Donations(a) => ResourceKey::donations(a),
            singleton => singleton.clone(),
        }
    }

    /// All address-keyed resources for one account
    pub fn account_bundle(address: &str) -> Vec<ResourceKey> {
        vec![
            ResourceKey::account(address),
            ResourceKey::overlay(address),
            ResourceKey::vouching(address),
            ResourceKey::donations(address),
        ]
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::ChainStats
            | ResourceKey::Transactions
            | ResourceKey::Epoch
            | ResourceKey::Supply => write!(f, "{}", self.class()),
            ResourceKey::TransactionDetail(id)
            | ResourceKey::Account(id)
            | ResourceKey::AccountOverlay(id)
            | ResourceKey::Vouching(id)
            | ResourceKey::Donations(id) => write!(f, "{}:{id}", self.class()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub chain_id: u64,
    pub epoch: u64,
    pub block_height: u64,
    pub ledger_version: u64,
    /// Microseconds since the unix epoch, kept verbatim
    pub ledger_timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    pub ledger: LedgerInfo,
    pub validator_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failure,
    Pending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    /// Ledger sequence; absent while the transaction is pending
    pub version: Option<u64>,
    pub sender: Option<String>,
    pub sequence_number: Option<u64>,
    /// High-precision timestamp exactly as the node returned it
    pub timestamp: String,
    pub status: TxStatus,
    pub function: Option<String>,
    pub block_height: Option<u64>,
}

/// Newest first: committed transactions by descending version, pending ones ahead
/// of everything committed, hash as tie-break.
pub fn sort_transactions(txs: &mut [Transaction]) {
    txs.sort_by(|a, b| {
        let va = a.version.unwrap_or(u64::MAX);
        let vb = b.version.unwrap_or(u64::MAX);
        vb.cmp(&va).then_with(|| a.hash.cmp(&b.hash))
    });
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub vm_status: String,
    pub gas_used: u64,
    pub gas_unit_price: u64,
    pub payload: Value,
    pub events: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountResource {
    pub type_tag: String,
    pub data: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    /// Total coin balance
    pub balance: u64,
    /// Spendable part of the balance, when the node reported it
    #[serde(default)]
    pub unlocked: Option<u64>,
    pub sequence_number: u64,
    pub resources: Vec<AccountResource>,
}

impl Account {
    pub fn resource(&self, type_tag: &str) -> Option<&Value> {
        self.resources
            .iter()
            .find(|r| r.type_tag == type_tag)
            .map(|r| &r.data)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorBid {
    pub bid: u64,
    pub expiration_epoch: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorGrade {
    pub compliant: bool,
    pub proposed_blocks: u64,
    pub failed_blocks: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JailReputation {
    pub is_jailed: bool,
    pub lifetime_jailed: u64,
    pub consecutive_jailed: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorStatus {
    pub is_validator: bool,
    pub bid: Option<ValidatorBid>,
    pub grade: Option<ValidatorGrade>,
    pub jail: Option<JailReputation>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VetoTally {
    pub percent: u64,
    pub threshold: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityWalletStatus {
    pub is_community_wallet: bool,
    pub authorized: Option<bool>,
    pub veto_tally: Option<VetoTally>,
    pub reauth_proposed: Option<bool>,
}

/// Derived reputation/governance attributes, fetched apart from the base account
/// and only merged on read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOverlay {
    pub address: String,
    pub is_founder: bool,
    pub vouch_score: u64,
    pub validator: ValidatorStatus,
    pub community_wallet: CommunityWalletStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VouchEntry {
    pub voucher: String,
    pub target: String,
    pub epoch_given: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VouchingGraph {
    pub address: String,
    /// Vouches this address gave (address is the voucher)
    pub given: Vec<VouchEntry>,
    /// Vouches this address received (address is the target)
    pub received: Vec<VouchEntry>,
    /// Epoch observed together with the graph; 0 when unknown
    pub current_epoch: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochData {
    pub epoch: u64,
    pub validator_set: Vec<String>,
    pub consensus_reward: u64,
    pub seconds_remaining: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub community_wallet: String,
    pub timestamp: u64,
    pub last_amount: u64,
    pub cumulative: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donations {
    pub donor: String,
    pub entries: Vec<Donation>,
}

impl Donations {
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|d| d.cumulative).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyStats {
    pub total: u64,
    pub slow_locked: u64,
    pub community_wallets: u64,
    pub infra_escrow: u64,
    pub circulating: u64,
}

/// Any cached payload, for the untyped `read` surface.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Resource {
    ChainStats(ChainStats),
    Transactions(Vec<Transaction>),
    TransactionDetail(TransactionDetail),
    Account(Account),
    AccountOverlay(AccountOverlay),
    Vouching(VouchingGraph),
    Epoch(EpochData),
    Donations(Donations),
    Supply(SupplyStats),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(hash: &str, version: Option<u64>) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            version,
            sender: None,
            sequence_number: None,
            timestamp: "0".into(),
            status: if version.is_some() {
                TxStatus::Success
            } else {
                TxStatus::Pending
            },
            function: None,
            block_height: None,
        }
    }

    #[test]
    fn test_key_normalized() {
        assert_eq!(
            ResourceKey::Account("0xABC".into()).normalized(),
            ResourceKey::account("abc")
        );
        assert_eq!(
            ResourceKey::TransactionDetail(" 0xFF ".into()).normalized(),
            ResourceKey::transaction("0xff")
        );
        assert_eq!(ResourceKey::Supply.normalized(), ResourceKey::Supply);
    }

    #[test]
    fn test_resource_class_parse() {
        assert_eq!(
            "chain_stats".parse::<ResourceClass>().unwrap(),
            ResourceClass::ChainStats
        );
        assert_eq!(
            "Transaction-Detail".parse::<ResourceClass>().unwrap(),
            ResourceClass::TransactionDetail
        );
        assert!("blocks".parse::<ResourceClass>().is_err());
    }

    #[test]
    fn test_keys_normalize_addresses() {
        assert_eq!(ResourceKey::account("0xABC"), ResourceKey::account("abc"));
        assert_eq!(ResourceKey::vouching("0XAbC").to_string(), "vouching:0xabc");
        assert_eq!(ResourceKey::Supply.to_string(), "supply");
    }

    #[test]
    fn test_sort_transactions_newest_first() {
        let mut txs = vec![tx("b", Some(5)), tx("p", None), tx("a", Some(9))];
        sort_transactions(&mut txs);
        let order: Vec<_> = txs.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(order, vec!["p", "a", "b"]);
    }
}
