use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::{as_address_list_field, as_option_u64, as_u64, as_u64_list};
use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{EpochData, ResourceClass};

pub struct EpochFetcher;

#[async_trait]
impl ResourceFetcher for EpochFetcher {
    type Key = ();
    type Output = EpochData;

    fn class(&self) -> ResourceClass {
        ResourceClass::Epoch
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, _key: &()) -> Result<EpochData> {
        let (epoch, validators, reward, remaining) = tokio::join!(
            sdk.call_view(view_fn::CURRENT_EPOCH, &[]),
            sdk.call_view(view_fn::CURRENT_VALIDATORS, &[]),
            sdk.call_view(view_fn::EPOCH_REWARD, &[]),
            sdk.call_view(view_fn::EPOCH_SECS_REMAINING, &[]),
        );
        let epoch = as_u64(&epoch.context("current epoch")?);

        let mut fan = FanIn::new("epoch");
        let validator_set = fan.secondary(
            "validator set",
            validators.map(|v| as_address_list_field(&v, Some("validators"))),
        );
        // The reward view returns several figures; the consensus reward leads
        let consensus_reward = fan.secondary(
            "consensus reward",
            reward.map(|v| as_u64_list(&v).first().copied().unwrap_or(0)),
        );
        let seconds_remaining = fan
            .secondary_opt("seconds remaining", remaining)
            .and_then(|v| as_option_u64(&v));
        fan.finish();

        Ok(EpochData {
            epoch,
            validator_set,
            consensus_reward,
            seconds_remaining,
        })
    }
}
