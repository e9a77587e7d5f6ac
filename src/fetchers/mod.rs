//! One fetcher per resource domain.
//!
//! Each fetcher fans out its sub-queries through the facade, normalizes the
//! results and assembles one payload. The first sub-query listed in each
//! fetcher is its primary: when it fails the whole refresh fails. The others
//! default silently.

mod account;
mod chain_stats;
mod community_wallet;
mod donations;
mod epoch;
mod overlay;
mod supply;
mod transactions;
mod tx_detail;
mod validator;
mod vouching;

pub use account::AccountFetcher;
pub use chain_stats::ChainStatsFetcher;
pub use community_wallet::{community_wallet_status, is_registered};
pub use donations::DonationsFetcher;
pub use epoch::EpochFetcher;
pub use overlay::OverlayFetcher;
pub use supply::SupplyFetcher;
pub use transactions::TransactionsFetcher;
pub use tx_detail::TransactionDetailFetcher;
pub use validator::{is_member, validator_status};
pub use vouching::VouchingFetcher;

use serde_json::{json, Value};

/// Single-address argument list for view calls
pub(crate) fn address_args(address: &str) -> [Value; 1] {
    [json!(address)]
}
