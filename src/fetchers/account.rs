use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use super::address_args;
use crate::constants::view_fn;
use crate::fanout::FanIn;
use crate::normalize::as_u64_tuple;
use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{Account, ResourceClass};

/// Base account (primary) merged with the `(unlocked, total)` balance view.
/// Both land in the cache in the same write.
pub struct AccountFetcher;

#[async_trait]
impl ResourceFetcher for AccountFetcher {
    type Key = String;
    type Output = Account;

    fn class(&self) -> ResourceClass {
        ResourceClass::Account
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, address: &String) -> Result<Account> {
        let args = address_args(address);
        let (account, balance) = tokio::join!(
            sdk.get_account(address),
            sdk.call_view(view_fn::ACCOUNT_BALANCE, &args),
        );
        let mut account = account
            .with_context(|| format!("account {address}"))?
            .ok_or_else(|| anyhow!("account {address} not found on chain"))?;

        let mut fan = FanIn::new(format!("account {address}"));
        if let Some(v) = fan.secondary_opt("balance view", balance) {
            let parts = as_u64_tuple(&v, 2);
            account.unlocked = Some(parts[0]);
            if parts[1] > 0 {
                account.balance = parts[1];
            }
        }
        fan.finish();

        Ok(account)
    }
}
