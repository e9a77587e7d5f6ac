use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{ResourceClass, TransactionDetail};

pub struct TransactionDetailFetcher;

#[async_trait]
impl ResourceFetcher for TransactionDetailFetcher {
    type Key = String;
    type Output = TransactionDetail;

    fn class(&self) -> ResourceClass {
        ResourceClass::TransactionDetail
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, hash: &String) -> Result<TransactionDetail> {
        sdk.get_transaction_by_hash(hash)
            .await
            .with_context(|| format!("transaction {hash}"))?
            .ok_or_else(|| anyhow!("transaction {hash} not found"))
    }
}
