use crate::core::currency::{CurrencyCode, ExchangeRate, RateStore};
use crate::core::error::Result;
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "exchange_rates";

fn row_key(base: &CurrencyCode, target: &CurrencyCode) -> String {
    format!("{base}:{target}")
}

/// Rate store persisted in a fjall keyspace, one JSON row per `BASE:TARGET`.
pub struct DiskRateStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened rate store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl RateStore for DiskRateStore {
    async fn upsert(&self, rate: &ExchangeRate) -> Result<()> {
        let key = row_key(&rate.base, &rate.target);
        self.partition.insert(key.as_bytes(), serde_json::to_vec(rate)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store PUT for key: {}", key);
        Ok(())
    }

    async fn upsert_all(&self, rates: &[ExchangeRate]) -> Result<()> {
        let mut batch = self.keyspace.batch();
        for rate in rates {
            batch.insert(
                &self.partition,
                row_key(&rate.base, &rate.target).into_bytes(),
                serde_json::to_vec(rate)?,
            );
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store PUT for {} rows", rates.len());
        Ok(())
    }

    async fn lookup(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<Option<ExchangeRate>> {
        let key = row_key(base, target);
        match self.partition.get(key.as_str())? {
            Some(value) => {
                debug!("Store HIT for key: {}", key);
                Ok(Some(serde_json::from_slice(&value)?))
            }
            None => {
                debug!("Store MISS for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn list(&self, base: &CurrencyCode) -> Result<Vec<ExchangeRate>> {
        let prefix = format!("{base}:");
        let mut rates = Vec::new();
        for entry in self.partition.prefix(prefix.as_str()) {
            let (_, value) = entry?;
            rates.push(serde_json::from_slice::<ExchangeRate>(&value)?);
        }
        rates.sort_by(|a, b| a.target.cmp(&b.target));
        Ok(rates)
    }
}
