//! Validator tier of the account overlay.
//!
//! Membership in the current validator set decides whether the bid, grade
//! and jail queries are issued at all. Those views fail or return junk for
//! ordinary accounts.

use serde_json::Value;

use super::address_args;
use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::{as_bool, as_tuple, as_u64, normalize_address};
use crate::sdk::LedgerSdk;
use crate::types::{JailReputation, ValidatorBid, ValidatorGrade, ValidatorStatus};

pub fn is_member(validator_set: &[String], address: &str) -> bool {
    let address = normalize_address(address);
    validator_set
        .iter()
        .any(|v| normalize_address(v) == address)
}

fn parse_bid(v: &Value) -> ValidatorBid {
    let t = as_tuple(v, 2);
    ValidatorBid {
        bid: as_u64(&t[0]),
        expiration_epoch: as_u64(&t[1]),
    }
}

fn parse_grade(v: &Value) -> ValidatorGrade {
    let t = as_tuple(v, 3);
    ValidatorGrade {
        compliant: as_bool(&t[0]),
        proposed_blocks: as_u64(&t[1]),
        failed_blocks: as_u64(&t[2]),
    }
}

fn parse_jail(v: &Value) -> JailReputation {
    let t = as_tuple(v, 3);
    JailReputation {
        is_jailed: as_bool(&t[0]),
        lifetime_jailed: as_u64(&t[1]),
        consecutive_jailed: as_u64(&t[2]),
    }
}

/// Second tier. `validator_set` is `None` when membership could not be
/// resolved, which is treated as "not a validator".
pub async fn validator_status(
    sdk: &dyn LedgerSdk,
    address: &str,
    validator_set: Option<&[String]>,
) -> ValidatorStatus {
    let member = validator_set.is_some_and(|set| is_member(set, address));
    if !member {
        return ValidatorStatus::default();
    }

    let args = address_args(address);
    let (bid, grade, jail) = tokio::join!(
        sdk.call_view(view_fn::VALIDATOR_BID, &args),
        sdk.call_view(view_fn::VALIDATOR_GRADE, &args),
        sdk.call_view(view_fn::JAIL_REPUTATION, &args),
    );

    let mut fan = FanIn::new(format!("validator {address}"));
    let status = ValidatorStatus {
        is_validator: true,
        bid: fan.secondary_opt("bid", bid).map(|v| parse_bid(&v)),
        grade: fan.secondary_opt("grade", grade).map(|v| parse_grade(&v)),
        jail: fan.secondary_opt("jail", jail).map(|v| parse_jail(&v)),
    };
    fan.finish();
    status
}
