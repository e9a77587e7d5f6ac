use anyhow::{bail, Result};
use async_trait::async_trait;

use super::address_args;
use super::community_wallet::community_wallet_status;
use super::validator::validator_status;
use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::{as_address_list, as_address_list_field, as_bool, as_u64};
use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{AccountOverlay, ResourceClass};

/// Reputation and governance attributes for one address.
///
/// Tier one (founder flag, vouch score, validator set, wallet registry) runs
/// in parallel; any subset may fail. Tier two only runs for the memberships
/// tier one confirmed. The refresh fails only when all of tier one failed.
pub struct OverlayFetcher;

#[async_trait]
impl ResourceFetcher for OverlayFetcher {
    type Key = String;
    type Output = AccountOverlay;

    fn class(&self) -> ResourceClass {
        ResourceClass::AccountOverlay
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, address: &String) -> Result<AccountOverlay> {
        let args = address_args(address);
        let (founder, score, validators, registry) = tokio::join!(
            sdk.call_view(view_fn::IS_FOUNDER, &args),
            sdk.call_view(view_fn::VOUCH_SCORE, &args),
            sdk.call_view(view_fn::CURRENT_VALIDATORS, &[]),
            sdk.call_view(view_fn::COMMUNITY_WALLETS, &[]),
        );
        if let (Err(e), Err(_), Err(_), Err(_)) = (&founder, &score, &validators, &registry) {
            bail!("account overlay unavailable: {e:#}");
        }

        let mut fan = FanIn::new(format!("overlay {address}"));
        let is_founder = fan.secondary("founder flag", founder.map(|v| as_bool(&v)));
        let vouch_score = fan.secondary("vouch score", score.map(|v| as_u64(&v)));
        let validator_set = fan.secondary_opt(
            "validator set",
            validators.map(|v| as_address_list_field(&v, Some("validators"))),
        );
        let registry = fan.secondary_opt("wallet registry", registry.map(|v| as_address_list(&v)));
        fan.finish();

        let (validator, community_wallet) = tokio::join!(
            validator_status(sdk, address, validator_set.as_deref()),
            community_wallet_status(sdk, address, registry.as_deref()),
        );

        Ok(AccountOverlay {
            address: address.clone(),
            is_founder,
            vouch_score,
            validator,
            community_wallet,
        })
    }
}
