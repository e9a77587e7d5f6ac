//! Two-tier overlay fetch: governance queries only for confirmed members.

mod common;

use common::{account, MockSdk};
use serde_json::json;
use std::sync::Arc;

use ledgerx::constants::view_fn;
use ledgerx::types::{ResourceKey, ValidatorBid, VetoTally};
use ledgerx::{Config, Explorer, RefreshOutcome};

fn script_tier_one(sdk: &MockSdk) {
    sdk.set_view(view_fn::IS_FOUNDER, json!([true]));
    sdk.set_view(view_fn::VOUCH_SCORE, json!(["42"]));
    sdk.set_view(view_fn::CURRENT_VALIDATORS, json!([["0xval", "0xother"]]));
    sdk.set_view(view_fn::COMMUNITY_WALLETS, json!([["0xcw"]]));
}

fn script_tier_two(sdk: &MockSdk) {
    sdk.set_view(view_fn::VALIDATOR_BID, json!(["1200", "301"]));
    sdk.set_view(view_fn::VALIDATOR_GRADE, json!([true, "50", "2"]));
    sdk.set_view(view_fn::JAIL_REPUTATION, json!([false, "1", "0"]));
    sdk.set_view(view_fn::CW_IS_AUTHORIZED, json!([true]));
    sdk.set_view(view_fn::CW_VETO_TALLY, json!(["1250", "5000"]));
    sdk.set_view(view_fn::CW_REAUTH_PROPOSED, json!([false]));
}

const TIER_TWO: [&str; 6] = [
    view_fn::VALIDATOR_BID,
    view_fn::VALIDATOR_GRADE,
    view_fn::JAIL_REPUTATION,
    view_fn::CW_IS_AUTHORIZED,
    view_fn::CW_VETO_TALLY,
    view_fn::CW_REAUTH_PROPOSED,
];

#[tokio::test]
async fn ordinary_account_skips_governance_queries() {
    let sdk = Arc::new(MockSdk::new());
    script_tier_one(&sdk);
    script_tier_two(&sdk);
    let ex = Explorer::new(sdk.clone(), Config::default());

    let outcome = ex.refresh(&ResourceKey::overlay("0xplain"), false).await;
    assert_eq!(outcome, RefreshOutcome::Updated);

    for f in TIER_TWO {
        assert_eq!(sdk.count(f), 0, "{f} should not be queried");
    }
    let overlay = ex.domains().overlay.store().payload(&"0xplain".to_string()).unwrap();
    assert!(overlay.is_founder);
    assert_eq!(overlay.vouch_score, 42);
    assert!(!overlay.validator.is_validator);
    assert_eq!(overlay.validator.bid, None);
    assert!(!overlay.community_wallet.is_community_wallet);
}

#[tokio::test]
async fn validator_gets_second_tier() {
    let sdk = Arc::new(MockSdk::new());
    script_tier_one(&sdk);
    script_tier_two(&sdk);
    let ex = Explorer::new(sdk.clone(), Config::default());

    ex.refresh(&ResourceKey::overlay("0xVAL"), false).await;

    assert_eq!(sdk.count(view_fn::VALIDATOR_BID), 1);
    assert_eq!(sdk.count(view_fn::CW_IS_AUTHORIZED), 0);
    let v = ex
        .domains()
        .overlay
        .store()
        .payload(&"0xval".to_string())
        .unwrap()
        .validator;
    assert!(v.is_validator);
    assert_eq!(
        v.bid,
        Some(ValidatorBid {
            bid: 1200,
            expiration_epoch: 301
        })
    );
    assert_eq!(v.grade.unwrap().proposed_blocks, 50);
    assert_eq!(v.jail.unwrap().lifetime_jailed, 1);
}

#[tokio::test]
async fn community_wallet_gets_governance_tier() {
    let sdk = Arc::new(MockSdk::new());
    script_tier_one(&sdk);
    script_tier_two(&sdk);
    sdk.fail_view(view_fn::CW_REAUTH_PROPOSED, "vm error");
    let ex = Explorer::new(sdk.clone(), Config::default());

    ex.refresh(&ResourceKey::overlay("0xcw"), false).await;

    assert_eq!(sdk.count(view_fn::VALIDATOR_BID), 0);
    let cw = ex
        .domains()
        .overlay
        .store()
        .payload(&"0xcw".to_string())
        .unwrap()
        .community_wallet;
    assert!(cw.is_community_wallet);
    assert_eq!(cw.authorized, Some(true));
    assert_eq!(
        cw.veto_tally,
        Some(VetoTally {
            percent: 1250,
            threshold: 5000
        })
    );
    assert_eq!(cw.reauth_proposed, None);
}

#[tokio::test]
async fn unresolved_membership_means_no_second_tier() {
    let sdk = Arc::new(MockSdk::new());
    script_tier_one(&sdk);
    script_tier_two(&sdk);
    sdk.fail_view(view_fn::CURRENT_VALIDATORS, "timeout");
    let ex = Explorer::new(sdk.clone(), Config::default());

    let outcome = ex.refresh(&ResourceKey::overlay("0xval"), false).await;
    assert_eq!(outcome, RefreshOutcome::Updated);
    assert_eq!(sdk.count(view_fn::VALIDATOR_BID), 0);
}

#[tokio::test]
async fn all_tier_one_failures_fail_the_refresh() {
    let sdk = Arc::new(MockSdk::new());
    let ex = Explorer::new(sdk.clone(), Config::default());

    let outcome = ex.refresh(&ResourceKey::overlay("0xa"), false).await;
    assert!(matches!(outcome, RefreshOutcome::Failed(ref m) if m.contains("overlay unavailable")));
    for f in TIER_TWO {
        assert_eq!(sdk.count(f), 0);
    }
}

#[tokio::test]
async fn account_view_merges_overlay_only_when_present() {
    let sdk = Arc::new(MockSdk::new());
    sdk.set_account(account("0xa", 100));
    script_tier_one(&sdk);
    let ex = Explorer::new(sdk.clone(), Config::default());

    ex.refresh(&ResourceKey::account("0xa"), false).await;
    let view = ex.account_view("0xA").payload.unwrap();
    assert_eq!(view.account.balance, 100);
    assert_eq!(view.overlay, None);

    ex.refresh(&ResourceKey::overlay("0xa"), false).await;
    let view = ex.account_view("0xa").payload.unwrap();
    assert!(view.overlay.unwrap().is_founder);
}
