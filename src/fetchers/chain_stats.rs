use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::as_address_list_field;
use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{ChainStats, ResourceClass};

/// Ledger head (primary) plus the size of the active validator set.
pub struct ChainStatsFetcher;

#[async_trait]
impl ResourceFetcher for ChainStatsFetcher {
    type Key = ();
    type Output = ChainStats;

    fn class(&self) -> ResourceClass {
        ResourceClass::ChainStats
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, _key: &()) -> Result<ChainStats> {
        let (ledger, validators) = tokio::join!(
            sdk.get_ledger_info(),
            sdk.call_view(view_fn::CURRENT_VALIDATORS, &[]),
        );
        let ledger = ledger.context("ledger info")?;

        let mut fan = FanIn::new("chain_stats");
        let validator_count = fan.secondary(
            "validator set",
            validators.map(|v| as_address_list_field(&v, Some("validators")).len()),
        );
        fan.finish();

        Ok(ChainStats {
            ledger,
            validator_count,
        })
    }
}
