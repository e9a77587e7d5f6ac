use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::sdk::LedgerSdk;
use crate::synchronizer::ResourceFetcher;
use crate::types::{sort_transactions, ResourceClass, Transaction};

/// Latest transactions, newest first. The list is replaced wholesale on
/// every refresh.
pub struct TransactionsFetcher {
    limit: u64,
}

impl TransactionsFetcher {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

#[async_trait]
impl ResourceFetcher for TransactionsFetcher {
    type Key = ();
    type Output = Vec<Transaction>;

    fn class(&self) -> ResourceClass {
        ResourceClass::Transactions
    }

    async fn fetch(&self, sdk: &dyn LedgerSdk, _key: &()) -> Result<Vec<Transaction>> {
        let mut txs = sdk
            .get_transactions(self.limit)
            .await
            .context("transaction list")?;
        sort_transactions(&mut txs);
        txs.truncate(self.limit as usize);
        Ok(txs)
    }
}
