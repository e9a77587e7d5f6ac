//! ledgerx - data synchronization and caching layer for a ledger explorer
//!
//! Keeps an in-memory, per-domain cache of ledger state (chain head,
//! transactions, accounts, vouching, epoch, donations, supply) in sync with a
//! remote node through a narrow SDK facade.
//!
//! ## Architecture
//!
//! - **Stores** (`store`, `cache`): keyed cache entries with a single
//!   in-flight slot per key and subscriber notification after every write.
//! - **Synchronizers** (`synchronizer`, `fetchers`): staleness-gated,
//!   deduplicated refresh with fan-out over independent sub-queries.
//! - **Polling** (`poller`): lifecycle-aware per-key refresh loops.
//! - **Normalization** (`normalize`): coerces the many shapes view calls
//!   come back in into canonical values, never failing.
//! - **Facade** (`sdk`, `http_sdk`): the ledger contract and its REST
//!   implementation.
//!
//! `explorer::Explorer` wires all of it into one injected context.

pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod explorer;
pub mod fanout;
pub mod fetchers;
pub mod normalize;
pub mod poller;
pub mod sdk;
pub mod staleness;
pub mod store;
pub mod synchronizer;
pub mod types;
pub mod util_text;
pub mod vouch;

// HTTP facade
pub mod http_sdk;
pub mod rpc_utils;

// Network utilities (429 backoff)
pub mod net;

// Re-export commonly used types
pub use cache::ReadView;
pub use config::Config;
pub use explorer::Explorer;
pub use sdk::LedgerSdk;
pub use synchronizer::RefreshOutcome;
pub use types::{Resource, ResourceClass, ResourceKey};
