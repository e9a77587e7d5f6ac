//! Vouch expiry classification and display ordering.
//!
//! Expiry is never stored: it is derived from `(epoch_given, current_epoch)`
//! every time a vouch list is read, so it moves with the epoch counter.

use serde::Serialize;
use std::cmp::Ordering;

use crate::constants::vouch;
use crate::types::{VouchEntry, VouchingGraph};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VouchState {
    Active,
    ExpiringSoon,
    Expired,
    /// Current epoch not known yet
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VouchRules {
    pub expiry_epochs: u64,
    pub warning_epochs: u64,
}

impl Default for VouchRules {
    fn default() -> Self {
        Self {
            expiry_epochs: vouch::EXPIRY_EPOCHS,
            warning_epochs: vouch::WARNING_EPOCHS,
        }
    }
}

/// Epochs left before a vouch lapses; zero or negative means expired
pub fn remaining_epochs(epoch_given: u64, current_epoch: u64, expiry_epochs: u64) -> i64 {
    (epoch_given as i64)
        .saturating_add(expiry_epochs as i64)
        .saturating_sub(current_epoch as i64)
}

pub fn classify(
    epoch_given: u64,
    current_epoch: u64,
    expiry_epochs: u64,
    warning_epochs: u64,
) -> VouchState {
    if current_epoch == 0 {
        return VouchState::Pending;
    }
    let remaining = remaining_epochs(epoch_given, current_epoch, expiry_epochs);
    if remaining <= 0 {
        VouchState::Expired
    } else if remaining <= warning_epochs as i64 {
        VouchState::ExpiringSoon
    } else {
        VouchState::Active
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassifiedVouch {
    /// The other side of the vouch (voucher for received, target for given)
    pub address: String,
    pub epoch_given: u64,
    pub state: VouchState,
    pub remaining_epochs: i64,
}

/// Live vouches first, oldest first (closest to lapsing); then expired ones,
/// most recently expired first. Address breaks ties.
pub fn display_order(a: &ClassifiedVouch, b: &ClassifiedVouch) -> Ordering {
    let a_expired = a.state == VouchState::Expired;
    let b_expired = b.state == VouchState::Expired;
    match (a_expired, b_expired) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, false) => a.epoch_given.cmp(&b.epoch_given),
        (true, true) => b.epoch_given.cmp(&a.epoch_given),
    }
    .then_with(|| a.address.cmp(&b.address))
}

fn classify_with(
    entries: &[VouchEntry],
    counterparty: impl Fn(&VouchEntry) -> &str,
    current_epoch: u64,
    rules: VouchRules,
) -> Vec<ClassifiedVouch> {
    let mut out: Vec<ClassifiedVouch> = entries
        .iter()
        .map(|e| ClassifiedVouch {
            address: counterparty(e).to_string(),
            epoch_given: e.epoch_given,
            state: classify(
                e.epoch_given,
                current_epoch,
                rules.expiry_epochs,
                rules.warning_epochs,
            ),
            remaining_epochs: remaining_epochs(e.epoch_given, current_epoch, rules.expiry_epochs),
        })
        .collect();
    out.sort_by(display_order);
    out
}

/// Classified, display-ordered view of a vouching graph
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VouchSummary {
    pub address: String,
    pub current_epoch: u64,
    pub received: Vec<ClassifiedVouch>,
    pub given: Vec<ClassifiedVouch>,
}

impl VouchSummary {
    pub fn active_received(&self) -> usize {
        self.received
            .iter()
            .filter(|v| matches!(v.state, VouchState::Active | VouchState::ExpiringSoon))
            .count()
    }
}

pub fn summarize(graph: &VouchingGraph, current_epoch: u64, rules: VouchRules) -> VouchSummary {
    VouchSummary {
        address: graph.address.clone(),
        current_epoch,
        received: classify_with(&graph.received, |e| &e.voucher, current_epoch, rules),
        given: classify_with(&graph.given, |e| &e.target, current_epoch, rules),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(100, 145, 45, 10), VouchState::Expired);
        assert_eq!(classify(100, 136, 45, 10), VouchState::ExpiringSoon);
        assert_eq!(classify(100, 135, 45, 10), VouchState::ExpiringSoon);
        assert_eq!(classify(100, 134, 45, 10), VouchState::Active);
        assert_eq!(classify(100, 100, 45, 10), VouchState::Active);
        assert_eq!(classify(100, 400, 45, 10), VouchState::Expired);
        assert_eq!(classify(100, 0, 45, 10), VouchState::Pending);
    }

    #[test]
    fn test_remaining_epochs() {
        assert_eq!(remaining_epochs(100, 136, 45), 9);
        assert_eq!(remaining_epochs(100, 145, 45), 0);
        assert_eq!(remaining_epochs(100, 150, 45), -5);
    }

    fn entry(voucher: &str, epoch: u64) -> VouchEntry {
        VouchEntry {
            voucher: voucher.to_string(),
            target: "0xme".to_string(),
            epoch_given: epoch,
        }
    }

    #[test]
    fn test_display_order() {
        let graph = VouchingGraph {
            address: "0xme".into(),
            received: vec![
                entry("0xd", 10),  // expired
                entry("0xa", 120), // active
                entry("0xe", 40),  // expired
                entry("0xb", 100), // expiring soon
                entry("0xc", 100), // expiring soon, tie on epoch
            ],
            given: vec![],
            current_epoch: 0,
        };
        let summary = summarize(&graph, 136, VouchRules::default());
        let order: Vec<(&str, VouchState)> = summary
            .received
            .iter()
            .map(|v| (v.address.as_str(), v.state))
            .collect();
        assert_eq!(
            order,
            vec![
                ("0xb", VouchState::ExpiringSoon),
                ("0xc", VouchState::ExpiringSoon),
                ("0xa", VouchState::Active),
                ("0xe", VouchState::Expired),
                ("0xd", VouchState::Expired),
            ]
        );
        assert_eq!(summary.active_received(), 3);
    }

    #[test]
    fn test_given_uses_target_as_counterparty() {
        let graph = VouchingGraph {
            address: "0xme".into(),
            received: vec![],
            given: vec![VouchEntry {
                voucher: "0xme".into(),
                target: "0xfriend".into(),
                epoch_given: 5,
            }],
            current_epoch: 6,
        };
        let summary = summarize(&graph, 6, VouchRules::default());
        assert_eq!(summary.given[0].address, "0xfriend");
        assert_eq!(summary.given[0].state, VouchState::Active);
    }
}
