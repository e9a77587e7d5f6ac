//! Vouching graph refresh and read-time expiry classification.

mod common;

use common::MockSdk;
use serde_json::json;
use std::sync::Arc;

use ledgerx::clock::ManualClock;
use ledgerx::constants::view_fn;
use ledgerx::types::{Resource, ResourceKey};
use ledgerx::vouch::VouchState;
use ledgerx::{Config, Explorer, RefreshOutcome};

fn explorer(sdk: &Arc<MockSdk>) -> Explorer {
    Explorer::with_clock(sdk.clone(), Config::default(), Arc::new(ManualClock::new(1_000)))
}

/// 0xa received from 0xb@100, 0xc@130, 0xd@70 and gave to 0xe@140
fn scripted_graph() -> Arc<MockSdk> {
    let sdk = Arc::new(MockSdk::new());
    sdk.set_view(
        view_fn::RECEIVED_VOUCHES,
        json!([["0xB", "0xC", "0xD"], ["100", "130", "70"]]),
    );
    sdk.set_view(view_fn::GIVEN_VOUCHES, json!([["0xE"], ["140"]]));
    sdk.set_view(view_fn::CURRENT_EPOCH, json!(["140"]));
    sdk
}

fn states(v: &[ledgerx::vouch::ClassifiedVouch]) -> Vec<(&str, VouchState)> {
    v.iter().map(|c| (c.address.as_str(), c.state)).collect()
}

#[tokio::test]
async fn graph_keeps_direction_per_side() {
    let sdk = scripted_graph();
    let ex = explorer(&sdk);

    let outcome = ex.refresh(&ResourceKey::vouching("0xA"), false).await;
    assert_eq!(outcome, RefreshOutcome::Updated);
    assert_eq!(sdk.count(&format!("{}(0xa)", view_fn::RECEIVED_VOUCHES)), 1);

    let graph = match ex.read(&ResourceKey::vouching("0xa")).payload {
        Some(Resource::Vouching(g)) => g,
        other => panic!("unexpected payload {other:?}"),
    };
    assert_eq!(graph.current_epoch, 140);
    assert!(graph.received.iter().all(|e| e.target == "0xa"));
    assert_eq!(graph.received[0].voucher, "0xb");
    assert_eq!(graph.given.len(), 1);
    assert_eq!(graph.given[0].voucher, "0xa");
    assert_eq!(graph.given[0].target, "0xe");
}

#[tokio::test]
async fn vouches_reclassify_when_the_epoch_moves() {
    let sdk = scripted_graph();
    let ex = explorer(&sdk);
    ex.refresh(&ResourceKey::vouching("0xa"), false).await;

    // expiry 45, warning 10
    let summary = ex.vouches("0xA").payload.unwrap();
    assert_eq!(summary.current_epoch, 140);
    assert_eq!(
        states(&summary.received),
        vec![
            ("0xb", VouchState::ExpiringSoon),
            ("0xc", VouchState::Active),
            ("0xd", VouchState::Expired),
        ]
    );
    assert_eq!(states(&summary.given), vec![("0xe", VouchState::Active)]);
    assert_eq!(summary.active_received(), 2);

    sdk.set_view(view_fn::CURRENT_EPOCH, json!(["146"]));
    assert_eq!(ex.refresh(&ResourceKey::Epoch, false).await, RefreshOutcome::Updated);

    let summary = ex.vouches("0xa").payload.unwrap();
    assert_eq!(summary.current_epoch, 146);
    assert_eq!(
        states(&summary.received),
        vec![
            ("0xc", VouchState::Active),
            ("0xb", VouchState::Expired),
            ("0xd", VouchState::Expired),
        ]
    );
    assert_eq!(summary.received[1].remaining_epochs, -1);
    assert_eq!(sdk.count(view_fn::RECEIVED_VOUCHES), 1);
}

#[tokio::test]
async fn given_vouches_failure_defaults_to_empty() {
    let sdk = scripted_graph();
    sdk.fail_view(view_fn::GIVEN_VOUCHES, "vm error");
    let ex = explorer(&sdk);

    let outcome = ex.refresh(&ResourceKey::vouching("0xa"), false).await;
    assert_eq!(outcome, RefreshOutcome::Updated);
    let view = ex.vouches("0xa");
    assert_eq!(view.error, None);
    let summary = view.payload.unwrap();
    assert!(summary.given.is_empty());
    assert_eq!(summary.received.len(), 3);
}

#[tokio::test]
async fn received_vouches_failure_fails_the_refresh() {
    let sdk = scripted_graph();
    let ex = explorer(&sdk);
    ex.refresh(&ResourceKey::vouching("0xa"), false).await;

    sdk.fail_view(view_fn::RECEIVED_VOUCHES, "upstream timeout");
    let outcome = ex.refresh(&ResourceKey::vouching("0xa"), true).await;
    assert!(matches!(outcome, RefreshOutcome::Failed(_)));

    let view = ex.vouches("0xa");
    assert!(view.error.is_some());
    assert_eq!(view.payload.unwrap().received.len(), 3);
}

#[tokio::test]
async fn unknown_epoch_leaves_vouches_pending() {
    let sdk = scripted_graph();
    sdk.fail_view(view_fn::CURRENT_EPOCH, "timeout");
    sdk.set_ledger(Err("unavailable".into()));
    let ex = explorer(&sdk);

    ex.refresh(&ResourceKey::vouching("0xa"), false).await;
    let summary = ex.vouches("0xa").payload.unwrap();
    assert_eq!(summary.current_epoch, 0);
    assert!(summary.received.iter().all(|v| v.state == VouchState::Pending));
}
