//! Durable per-domain sync-committee period store.
//!
//! Keyed `chain:{domainId}:period` → big-endian `u64` bytes, backed by
//! `sled` (an embedded, crash-safe, native-Rust key-value store — the
//! idiomatic replacement for the original's `goleveldb`).

use async_trait::async_trait;

use crate::error::RelayError;

#[async_trait]
pub trait PeriodStore: Send + Sync {
    /// Last committed period for `domain_id`, or 0 if no key is stored.
    async fn period(&self, domain_id: u8) -> Result<u64, RelayError>;

    /// Persist `period` for `domain_id`. Must be durable before returning.
    async fn store_period(&self, domain_id: u8, period: u64) -> Result<(), RelayError>;
}

fn key(domain_id: u8) -> Vec<u8> {
    format!("chain:{domain_id}:period").into_bytes()
}

/// `sled`-backed `PeriodStore`. `sled::Tree` operations are blocking but
/// cheap (an in-memory index over a durable log), so they're run directly
/// rather than offloaded to `spawn_blocking`.
pub struct SledPeriodStore {
    db: sled::Db,
}

impl SledPeriodStore {
    pub fn open(path: &str) -> Result<Self, RelayError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

#[async_trait]
impl PeriodStore for SledPeriodStore {
    async fn period(&self, domain_id: u8) -> Result<u64, RelayError> {
        match self.db.get(key(domain_id))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    RelayError::Durability(format!("corrupt period value for domain {domain_id}"))
                })?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    async fn store_period(&self, domain_id: u8, period: u64) -> Result<(), RelayError> {
        self.db.insert(key(domain_id), &period.to_be_bytes())?;
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledPeriodStore::open(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(store.period(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stored_period_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledPeriodStore::open(dir.path().to_str().unwrap()).unwrap();
        store.store_period(3, 42).await.unwrap();
        assert_eq!(store.period(3).await.unwrap(), 42);
        // A different domain's key is untouched.
        assert_eq!(store.period(4).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn period_never_regresses_under_normal_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledPeriodStore::open(dir.path().to_str().unwrap()).unwrap();
        store.store_period(1, 5).await.unwrap();
        store.store_period(1, 6).await.unwrap();
        assert_eq!(store.period(1).await.unwrap(), 6);
    }
}
