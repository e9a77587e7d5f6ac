//! Application constants
//!
//! Centralized view-function identifiers, timing defaults and other magic numbers
//! used throughout the sync layer.

/// Move view functions queried through `POST /view`
pub mod view_fn {
    pub const CURRENT_VALIDATORS: &str = "0x1::stake::get_current_validators";
    pub const CURRENT_EPOCH: &str = "0x1::epoch_helper::get_current_epoch";
    pub const EPOCH_REWARD: &str = "0x1::proof_of_fee::get_consensus_reward";
    pub const EPOCH_SECS_REMAINING: &str = "0x1::reconfiguration::get_remaining_epoch_secs";

    pub const SUPPLY_STATS: &str = "0x1::supply::get_stats";
    pub const TOTAL_SUPPLY: &str = "0x1::libra_coin::supply";

    pub const ACCOUNT_BALANCE: &str = "0x1::ol_account::balance";
    pub const IS_FOUNDER: &str = "0x1::founder::is_founder";
    pub const VOUCH_SCORE: &str = "0x1::page_rank_lazy::get_cached_score";
    pub const GIVEN_VOUCHES: &str = "0x1::vouch::get_given_vouches";
    pub const RECEIVED_VOUCHES: &str = "0x1::vouch::get_received_vouches";

    pub const VALIDATOR_BID: &str = "0x1::proof_of_fee::current_bid";
    pub const VALIDATOR_GRADE: &str = "0x1::grade::get_validator_grade";
    pub const JAIL_REPUTATION: &str = "0x1::jail::get_jail_reputation";

    pub const COMMUNITY_WALLETS: &str = "0x1::donor_voice::get_root_registry";
    pub const CW_IS_AUTHORIZED: &str = "0x1::donor_voice_governance::is_authorized";
    pub const CW_VETO_TALLY: &str = "0x1::donor_voice_governance::get_veto_tally";
    pub const CW_REAUTH_PROPOSED: &str = "0x1::donor_voice_governance::is_reauth_proposed";
    pub const DONATION_RECEIPT: &str = "0x1::receipts::read_receipt";
}

/// Freshness windows per resource class (milliseconds)
pub mod freshness {
    pub const CHAIN_STATS_MS: u64 = 15_000;
    pub const TRANSACTIONS_MS: u64 = 20_000;
    pub const ACCOUNT_MS: u64 = 60_000;
    pub const ACCOUNT_OVERLAY_MS: u64 = 60_000;
    pub const VOUCHING_MS: u64 = 30_000;
    pub const EPOCH_MS: u64 = 30_000;
    pub const DONATIONS_MS: u64 = 30_000;
    pub const SUPPLY_MS: u64 = 30_000;

    /// Committed transactions never change, so detail can be held much longer
    /// than mutable chain-head state.
    pub const TRANSACTION_DETAIL_MS: u64 = 300_000;

    /// Applied to any class without an explicit window
    pub const DEFAULT_MS: u64 = 30_000;
}

/// Poll intervals per resource class (milliseconds)
///
/// Each interval exceeds the matching freshness window so that a tick always
/// finds the previous result stale.
pub mod polling {
    pub const CHAIN_STATS_MS: u64 = 20_000;
    pub const TRANSACTIONS_MS: u64 = 30_000;
    pub const ACCOUNT_MS: u64 = 90_000;
    pub const ACCOUNT_OVERLAY_MS: u64 = 90_000;
    pub const VOUCHING_MS: u64 = 45_000;
    pub const EPOCH_MS: u64 = 45_000;
    pub const DONATIONS_MS: u64 = 45_000;
    pub const SUPPLY_MS: u64 = 60_000;
    pub const TRANSACTION_DETAIL_MS: u64 = 600_000;

    /// How often a freshly activated poller re-checks facade readiness
    pub const READY_CHECK_MS: u64 = 250;
}

/// Session / connectivity behavior
pub mod session {
    pub const DEFAULT_RPC_URL: &str = "https://rpc.openlibra.space:8080/v1";
    pub const RPC_TIMEOUT_MS: u64 = 10_000;
    pub const RPC_RETRIES: u32 = 2;
    pub const TX_LIST_LIMIT: u64 = 25;
    pub const INIT_ATTEMPTS: u32 = 3;
    pub const INIT_BACKOFF_MS: u64 = 2_000;
    pub const READY_FALLBACK_MS: u64 = 10_000;
}

/// Vouching rules
pub mod vouch {
    /// Epochs a vouch stays valid after it was given
    pub const EXPIRY_EPOCHS: u64 = 45;

    /// Remaining epochs at or below which a live vouch is flagged as expiring
    pub const WARNING_EPOCHS: u64 = 10;
}

/// Coin type tag used to spot the balance resource in an account's resource list
pub const COIN_STORE_PREFIX: &str = "0x1::coin::CoinStore<";
