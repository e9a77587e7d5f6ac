use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::constants::view_fn;
use crate::fanout::{first_error, settle_all};
use crate::normalize::{as_address_list, as_u64_tuple, normalize_address};
use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{Donation, Donations, ResourceClass};

/// Donation receipts of one donor across every registered community wallet.
///
/// The registry read is primary. Receipts fan out one query per wallet;
/// failed reads and wallets the donor never gave to are left out.
pub struct DonationsFetcher;

#[async_trait]
impl ResourceFetcher for DonationsFetcher {
    type Key = String;
    type Output = Donations;

    fn class(&self) -> ResourceClass {
        ResourceClass::Donations
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, donor: &String) -> Result<Donations> {
        let registry = sdk
            .call_view(view_fn::COMMUNITY_WALLETS, &[])
            .await
            .context("community wallet registry")?;
        let wallets: Vec<String> = as_address_list(&registry)
            .iter()
            .map(|w| normalize_address(w))
            .collect();

        let receipts = settle_all(wallets.iter().map(|wallet| async move {
            let args = [json!(wallet), json!(donor)];
            sdk.call_view(view_fn::DONATION_RECEIPT, &args).await
        }))
        .await;

        if let Some(err) = first_error(&receipts) {
            let failed = receipts.iter().filter(|r| r.is_err()).count();
            log::debug!("[fanout] donations {donor}: {failed} receipt reads failed, first: {err}");
        }

        let mut entries: Vec<Donation> = Vec::new();
        for (wallet, receipt) in wallets.into_iter().zip(receipts) {
            let Ok(raw) = receipt else {
                continue;
            };
            let t = as_u64_tuple(&raw, 3);
            if t[2] == 0 {
                continue;
            }
            entries.push(Donation {
                community_wallet: wallet,
                timestamp: t[0],
                last_amount: t[1],
                cumulative: t[2],
            });
        }
        entries.sort_by(|a, b| {
            b.cumulative
                .cmp(&a.cumulative)
                .then_with(|| a.community_wallet.cmp(&b.community_wallet))
        });

        Ok(Donations {
            donor: donor.clone(),
            entries,
        })
    }
}
