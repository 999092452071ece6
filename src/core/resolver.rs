//! Exchange rate resolution across cache, remote feed, rate store and default
//!
//! Each tier implements [`ResolutionStrategy`]. The resolver tries the tiers in
//! order and stops at the first one that produces a rate, so adding or
//! reordering tiers only changes the list handed to [`ExchangeResolver::with_strategies`].

use super::cache::RateCache;
use super::currency::{CurrencyCode, ExchangeRate, RateStore, RemoteRateSource};
use super::error::{FxError, Result};
use super::notify::{Notification, Notifier};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which tier produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Identity,
    Cache,
    Remote,
    Persisted,
    Default,
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateSource::Identity => "identity",
                RateSource::Cache => "cache",
                RateSource::Remote => "remote",
                RateSource::Persisted => "stored",
                RateSource::Default => "default",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub rate: Decimal,
    pub source: RateSource,
}

impl Resolution {
    /// True when no real rate was found and the default was substituted.
    pub fn is_degraded(&self) -> bool {
        self.source == RateSource::Default
    }
}

#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn source(&self) -> RateSource;

    async fn attempt(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<Decimal>;
}

/// Serves rates from the in-memory table while it is fresh.
pub struct CachedRates {
    cache: Arc<RateCache>,
}

impl CachedRates {
    pub fn new(cache: Arc<RateCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ResolutionStrategy for CachedRates {
    fn source(&self) -> RateSource {
        RateSource::Cache
    }

    async fn attempt(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<Decimal> {
        if base != self.cache.base() {
            return None;
        }
        self.cache.get_if_fresh(target, Utc::now()).await
    }
}

/// Fetches the full table from the remote feed, refreshes the cache and
/// writes every fetched rate through to the store.
pub struct RemoteRates {
    source: Arc<dyn RemoteRateSource>,
    cache: Arc<RateCache>,
    store: Arc<dyn RateStore>,
    notifier: Arc<dyn Notifier>,
}

impl RemoteRates {
    pub fn new(
        source: Arc<dyn RemoteRateSource>,
        cache: Arc<RateCache>,
        store: Arc<dyn RateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            cache,
            store,
            notifier,
        }
    }

    pub async fn refresh(&self, base: &CurrencyCode) -> Result<HashMap<CurrencyCode, Decimal>> {
        let fetched = self.source.fetch(base).await?;
        let timestamp = Utc::now();
        let rates: HashMap<CurrencyCode, Decimal> = fetched
            .into_iter()
            .filter(|(_, rate)| *rate > Decimal::ZERO)
            .collect();

        if base == self.cache.base() {
            self.cache.replace_all(rates.clone(), timestamp).await;
        }

        let rows: Vec<ExchangeRate> = rates
            .iter()
            .filter(|(target, _)| *target != base)
            .filter_map(|(target, rate)| {
                ExchangeRate::new(base.clone(), target.clone(), *rate, timestamp).ok()
            })
            .collect();
        if let Err(e) = self.store.upsert_all(&rows).await {
            warn!(error = %e, "Failed to persist {} rates for {}", rows.len(), base);
        }
        info!("Refreshed {} rates for base {}", rates.len(), base);
        Ok(rates)
    }
}

#[async_trait]
impl ResolutionStrategy for RemoteRates {
    fn source(&self) -> RateSource {
        RateSource::Remote
    }

    async fn attempt(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<Decimal> {
        match self.refresh(base).await {
            Ok(rates) => {
                let rate = rates.get(target).copied();
                if rate.is_none() {
                    debug!("Remote table for {} has no rate for {}", base, target);
                }
                rate
            }
            Err(e) => {
                warn!(error = %e, "Remote rate fetch failed for {}", base);
                self.notifier.notify(Notification::RateNotFound(base.clone()));
                None
            }
        }
    }
}

/// Reads the last persisted rate for the pair.
pub struct PersistedRates {
    store: Arc<dyn RateStore>,
}

impl PersistedRates {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResolutionStrategy for PersistedRates {
    fn source(&self) -> RateSource {
        RateSource::Persisted
    }

    async fn attempt(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<Decimal> {
        match self.store.lookup(base, target).await {
            Ok(row) => row.map(|r| r.rate),
            Err(e) => {
                warn!(error = %e, "Rate store lookup failed for {}/{}", base, target);
                None
            }
        }
    }
}

/// Last resort: a rate of one, so an interactive flow can continue.
pub struct DefaultRate {
    notifier: Arc<dyn Notifier>,
}

impl DefaultRate {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ResolutionStrategy for DefaultRate {
    fn source(&self) -> RateSource {
        RateSource::Default
    }

    async fn attempt(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<Decimal> {
        warn!("No rate for {}/{}, falling back to 1.0", base, target);
        self.notifier.notify(Notification::DegradedFallback {
            base: base.clone(),
            target: target.clone(),
        });
        Some(Decimal::ONE)
    }
}

pub struct ExchangeResolver {
    cache: Arc<RateCache>,
    remote: Option<Arc<RemoteRates>>,
    strategies: Vec<Arc<dyn ResolutionStrategy>>,
}

impl ExchangeResolver {
    /// Builds the standard chain: cache, remote, store, default.
    pub fn new(
        cache: Arc<RateCache>,
        source: Arc<dyn RemoteRateSource>,
        store: Arc<dyn RateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let remote = Arc::new(RemoteRates::new(
            source,
            Arc::clone(&cache),
            Arc::clone(&store),
            Arc::clone(&notifier),
        ));
        let strategies: Vec<Arc<dyn ResolutionStrategy>> = vec![
            Arc::new(CachedRates::new(Arc::clone(&cache))),
            Arc::clone(&remote) as Arc<dyn ResolutionStrategy>,
            Arc::new(PersistedRates::new(store)),
            Arc::new(DefaultRate::new(notifier)),
        ];
        Self::with_strategies(cache, Some(remote), strategies)
    }

    /// Uses a custom tier list. `remote` is only needed for [`refresh`](Self::refresh).
    pub fn with_strategies(
        cache: Arc<RateCache>,
        remote: Option<Arc<RemoteRates>>,
        strategies: Vec<Arc<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            cache,
            remote,
            strategies,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        self.cache.base()
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    /// Resolves a rate, substituting the default when every real tier misses.
    pub async fn resolve(&self, base: &CurrencyCode, target: &CurrencyCode) -> Result<Resolution> {
        self.resolve_with(base, target, true)
            .await
            .ok_or_else(|| FxError::RateUnavailable {
                base: base.to_string(),
                target: target.to_string(),
            })
    }

    /// Like [`resolve`](Self::resolve) but never substitutes the default.
    pub async fn resolve_strict(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Option<Resolution> {
        self.resolve_with(base, target, false).await
    }

    async fn resolve_with(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        allow_default: bool,
    ) -> Option<Resolution> {
        if base == target {
            return Some(Resolution {
                rate: Decimal::ONE,
                source: RateSource::Identity,
            });
        }

        for strategy in &self.strategies {
            if !allow_default && strategy.source() == RateSource::Default {
                continue;
            }
            if let Some(rate) = strategy.attempt(base, target).await {
                debug!("Resolved {}/{} = {} from {}", base, target, rate, strategy.source());
                return Some(Resolution {
                    rate,
                    source: strategy.source(),
                });
            }
        }
        None
    }

    /// Forces a remote refresh of the base currency table.
    pub async fn refresh(&self) -> Result<HashMap<CurrencyCode, Decimal>> {
        match &self.remote {
            Some(remote) => remote.refresh(self.cache.base()).await,
            None => Err(FxError::Fetch("no remote rate source configured".into())),
        }
    }

    /// Codes present in the cached table, refreshing it first when stale.
    pub async fn supported_currencies(&self) -> Vec<CurrencyCode> {
        if !self.cache.is_fresh().await {
            if let Err(e) = self.refresh().await {
                warn!(error = %e, "Could not refresh supported currencies");
            }
        }
        let snapshot = self.cache.snapshot().await;
        let mut codes: Vec<CurrencyCode> = snapshot.rates.into_keys().collect();
        if !codes.contains(self.cache.base()) {
            codes.push(self.cache.base().clone());
        }
        codes.sort();
        codes
    }
}
