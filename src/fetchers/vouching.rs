use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::address_args;
use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::{as_list_pair, as_u64, normalize_address};
use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{ResourceClass, VouchEntry, VouchingGraph};

/// Received vouches (primary), given vouches and the epoch they were read at.
pub struct VouchingFetcher;

/// Zip the `(addresses, epochs)` pair; a missing epoch reads as 0.
fn entries(raw: &Value, to_entry: impl Fn(String, u64) -> VouchEntry) -> Vec<VouchEntry> {
    let (addresses, epochs) = as_list_pair(raw);
    addresses
        .into_iter()
        .enumerate()
        .map(|(i, a)| to_entry(normalize_address(&a), epochs.get(i).copied().unwrap_or(0)))
        .collect()
}

#[async_trait]
impl ResourceFetcher for VouchingFetcher {
    type Key = String;
    type Output = VouchingGraph;

    fn class(&self) -> ResourceClass {
        ResourceClass::Vouching
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, address: &String) -> Result<VouchingGraph> {
        let args = address_args(address);
        let (received, given, epoch) = tokio::join!(
            sdk.call_view(view_fn::RECEIVED_VOUCHES, &args),
            sdk.call_view(view_fn::GIVEN_VOUCHES, &args),
            sdk.call_view(view_fn::CURRENT_EPOCH, &[]),
        );
        let received = received.with_context(|| format!("received vouches of {address}"))?;

        let mut fan = FanIn::new(format!("vouching {address}"));
        let given = fan.secondary_opt("given vouches", given);
        let current_epoch = fan.secondary("epoch", epoch.map(|v| as_u64(&v)));
        fan.finish();

        Ok(VouchingGraph {
            address: address.clone(),
            received: entries(&received, |voucher, epoch_given| VouchEntry {
                voucher,
                target: address.clone(),
                epoch_given,
            }),
            given: given
                .map(|g| {
                    entries(&g, |target, epoch_given| VouchEntry {
                        voucher: address.clone(),
                        target,
                        epoch_given,
                    })
                })
                .unwrap_or_default(),
            current_epoch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_zip_addresses_and_epochs() {
        let raw = json!([["0xA", "0xB"], ["100", "120"]]);
        let got = entries(&raw, |voucher, epoch_given| VouchEntry {
            voucher,
            target: "0xme".into(),
            epoch_given,
        });
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].voucher, "0xa");
        assert_eq!(got[1].epoch_given, 120);
    }

    #[test]
    fn test_entries_tolerate_short_epoch_list() {
        let raw = json!([["0xA", "0xB"], ["7"]]);
        let got = entries(&raw, |target, epoch_given| VouchEntry {
            voucher: "0xme".into(),
            target,
            epoch_given,
        });
        assert_eq!(got[1].target, "0xb");
        assert_eq!(got[1].epoch_given, 0);
    }
}
