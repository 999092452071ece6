use super::currency::CurrencyCode;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_FRESHNESS_HOURS: i64 = 24;

#[derive(Debug, Clone, Default)]
struct CacheState {
    rates: HashMap<CurrencyCode, Decimal>,
    last_updated: Option<DateTime<Utc>>,
}

impl CacheState {
    fn is_fresh_at(&self, now: DateTime<Utc>, freshness: Duration) -> bool {
        self.last_updated
            .is_some_and(|updated| now - updated <= freshness)
    }

    fn rate(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<Decimal> {
        if target == base {
            return Some(Decimal::ONE);
        }
        let rate = self.rates.get(target).copied();
        if rate.is_some() {
            debug!("Rate cache HIT for {}", target);
        } else {
            debug!("Rate cache MISS for {}", target);
        }
        rate
    }
}

/// Mapping and timestamp read under the same lock.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub rates: HashMap<CurrencyCode, Decimal>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// The most recently fetched rate table for one base currency.
///
/// The table is only ever replaced as a whole, so a reader never sees rates
/// from two different fetches.
pub struct RateCache {
    base: CurrencyCode,
    freshness: Duration,
    state: Mutex<CacheState>,
}

impl RateCache {
    pub fn new(base: CurrencyCode) -> Self {
        Self::with_freshness(base, Duration::hours(DEFAULT_FRESHNESS_HOURS))
    }

    pub fn with_freshness(base: CurrencyCode, freshness: Duration) -> Self {
        Self {
            base,
            freshness,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub async fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now()).await
    }

    /// Fresh when refreshed no more than the freshness window before `now`.
    pub async fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.state.lock().await.is_fresh_at(now, self.freshness)
    }

    /// Reads the rate only if the table is fresh at `now`, under a single lock.
    pub async fn get_if_fresh(&self, target: &CurrencyCode, now: DateTime<Utc>) -> Option<Decimal> {
        let state = self.state.lock().await;
        if !state.is_fresh_at(now, self.freshness) {
            debug!("Rate cache STALE for {}", target);
            return None;
        }
        state.rate(&self.base, target)
    }

    pub async fn get(&self, target: &CurrencyCode) -> Option<Decimal> {
        self.state.lock().await.rate(&self.base, target)
    }

    pub async fn replace_all(&self, rates: HashMap<CurrencyCode, Decimal>, timestamp: DateTime<Utc>) {
        let rates: HashMap<_, _> = rates
            .into_iter()
            .filter(|(_, rate)| *rate > Decimal::ZERO)
            .collect();
        let mut state = self.state.lock().await;
        debug!("Rate cache REPLACE with {} rates", rates.len());
        *state = CacheState {
            rates,
            last_updated: Some(timestamp),
        };
    }

    pub async fn snapshot(&self) -> CacheSnapshot {
        let state = self.state.lock().await;
        CacheSnapshot {
            rates: state.rates.clone(),
            last_updated: state.last_updated,
        }
    }
}
