//! Domain collectors: anything that can answer "which destination domains
//! need a step, given an execution block range". The Router `Deposit`
//! collector is the only one today, but the Step Handler is written
//! against the trait so other event sources can be added later.

use std::collections::HashSet;

use async_trait::async_trait;
use spectre_client::RouterLogFetcher;

use crate::error::RelayError;

#[async_trait]
pub trait DomainCollector: Send + Sync {
    /// Destination domain ids observed as needing a step, for deposits
    /// seen in `[from_block, to_block]` inclusive.
    async fn collect(&self, from_block: u64, to_block: u64) -> Result<HashSet<u8>, RelayError>;
}

pub struct RouterDepositCollector {
    fetcher: RouterLogFetcher,
}

impl RouterDepositCollector {
    pub fn new(fetcher: RouterLogFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl DomainCollector for RouterDepositCollector {
    async fn collect(&self, from_block: u64, to_block: u64) -> Result<HashSet<u8>, RelayError> {
        let deposits = self
            .fetcher
            .fetch(from_block, to_block)
            .await
            .map_err(|e| RelayError::Transient(e.to_string()))?;
        Ok(deposits.into_iter().map(|d| d.destination_domain_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCollector(HashSet<u8>);

    #[async_trait]
    impl DomainCollector for FakeCollector {
        async fn collect(&self, _from_block: u64, _to_block: u64) -> Result<HashSet<u8>, RelayError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn union_of_collectors_merges_domain_sets() {
        let collectors: Vec<Box<dyn DomainCollector>> = vec![
            Box::new(FakeCollector([2].into_iter().collect())),
            Box::new(FakeCollector([3, 2].into_iter().collect())),
        ];
        let mut union = HashSet::new();
        for c in &collectors {
            union.extend(c.collect(0, 10).await.unwrap());
        }
        assert_eq!(union, [2, 3].into_iter().collect());
    }
}
