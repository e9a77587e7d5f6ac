//! Community-wallet tier of the account overlay: governance queries only
//! run for addresses found in the donor-voice registry.

use serde_json::Value;

use super::address_args;
use super::validator::is_member;
use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::{as_bool, as_tuple, as_u64};
use crate::sdk::LedgerSdk;
use crate::types::{CommunityWalletStatus, VetoTally};

pub fn is_registered(registry: &[String], address: &str) -> bool {
    is_member(registry, address)
}

fn parse_veto(v: &Value) -> VetoTally {
    let t = as_tuple(v, 2);
    VetoTally {
        percent: as_u64(&t[0]),
        threshold: as_u64(&t[1]),
    }
}

pub async fn community_wallet_status(
    sdk: &dyn LedgerSdk,
    address: &str,
    registry: Option<&[String]>,
) -> CommunityWalletStatus {
    if !registry.is_some_and(|r| is_registered(r, address)) {
        return CommunityWalletStatus::default();
    }

    let args = address_args(address);
    let (authorized, veto, reauth) = tokio::join!(
        sdk.call_view(view_fn::CW_IS_AUTHORIZED, &args),
        sdk.call_view(view_fn::CW_VETO_TALLY, &args),
        sdk.call_view(view_fn::CW_REAUTH_PROPOSED, &args),
    );

    let mut fan = FanIn::new(format!("community wallet {address}"));
    let status = CommunityWalletStatus {
        is_community_wallet: true,
        authorized: fan.secondary_opt("authorization", authorized).map(|v| as_bool(&v)),
        veto_tally: fan.secondary_opt("veto tally", veto).map(|v| parse_veto(&v)),
        reauth_proposed: fan
            .secondary_opt("reauthorization", reauth)
            .map(|v| as_bool(&v)),
    };
    fan.finish();
    status
}
