use crate::core::currency::{CurrencyCode, ExchangeRate, RateStore};
use crate::core::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory rate store, used when no data directory is available and in tests.
#[derive(Default)]
pub struct MemoryRateStore {
    inner: Mutex<HashMap<(CurrencyCode, CurrencyCode), ExchangeRate>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn upsert(&self, rate: &ExchangeRate) -> Result<()> {
        let mut rows = self.inner.lock().await;
        debug!("Store PUT for {}/{}", rate.base, rate.target);
        rows.insert((rate.base.clone(), rate.target.clone()), rate.clone());
        Ok(())
    }

    async fn lookup(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<Option<ExchangeRate>> {
        let rows = self.inner.lock().await;
        let row = rows.get(&(base.clone(), target.clone())).cloned();
        if row.is_some() {
            debug!("Store HIT for {}/{}", base, target);
        } else {
            debug!("Store MISS for {}/{}", base, target);
        }
        Ok(row)
    }

    async fn list(&self, base: &CurrencyCode) -> Result<Vec<ExchangeRate>> {
        let rows = self.inner.lock().await;
        let mut rates: Vec<ExchangeRate> = rows
            .values()
            .filter(|r| r.base == *base)
            .cloned()
            .collect();
        rates.sort_by(|a, b| a.target.cmp(&b.target));
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = MemoryRateStore::new();
        let first = Utc::now();
        store
            .upsert(&ExchangeRate::new(code("CAD"), code("USD"), dec!(0.74), first).unwrap())
            .await
            .unwrap();
        store
            .upsert(
                &ExchangeRate::new(code("CAD"), code("USD"), dec!(0.75), first + Duration::hours(1))
                    .unwrap(),
            )
            .await
            .unwrap();

        let row = store.lookup(&code("CAD"), &code("USD")).await.unwrap().unwrap();
        assert_eq!(row.rate, dec!(0.75));
        assert_eq!(row.last_updated, first + Duration::hours(1));
        assert_eq!(store.list(&code("CAD")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_keyed_by_pair() {
        let store = MemoryRateStore::new();
        store
            .upsert(&ExchangeRate::new(code("CAD"), code("USD"), dec!(0.74), Utc::now()).unwrap())
            .await
            .unwrap();

        assert!(store.lookup(&code("USD"), &code("CAD")).await.unwrap().is_none());
        assert!(store.list(&code("USD")).await.unwrap().is_empty());
    }
}
