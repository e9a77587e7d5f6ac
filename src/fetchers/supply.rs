use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::{as_u64, as_u64_tuple};
use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{ResourceClass, SupplyStats};

/// Supply breakdown `(total, slow_locked, community_wallets, infra_escrow,
/// circulating)`; the standalone total-supply view fills in a zero total.
pub struct SupplyFetcher;

#[async_trait]
impl ResourceFetcher for SupplyFetcher {
    type Key = ();
    type Output = SupplyStats;

    fn class(&self) -> ResourceClass {
        ResourceClass::Supply
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, _key: &()) -> Result<SupplyStats> {
        let (stats, total) = tokio::join!(
            sdk.call_view(view_fn::SUPPLY_STATS, &[]),
            sdk.call_view(view_fn::TOTAL_SUPPLY, &[]),
        );
        let t = as_u64_tuple(&stats.context("supply stats")?, 5);

        let mut fan = FanIn::new("supply");
        let total = fan.secondary("total supply", total.map(|v| as_u64(&v)));
        fan.finish();

        Ok(SupplyStats {
            total: if t[0] > 0 { t[0] } else { total },
            slow_locked: t[1],
            community_wallets: t[2],
            infra_escrow: t[3],
            circulating: t[4],
        })
    }
}
