use crate::core::config::ExchangeRateProviderConfig;
use crate::core::currency::{CurrencyCode, RemoteRateSource};
use crate::core::error::{FxError, Result};
use async_trait::async_trait;
use futures::TryFutureExt;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::util::with_retry;

const RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, serde_json::Number>,
}

/// JSON numbers are converted through their text so `0.74` stays `0.74`.
fn number_to_decimal(number: &serde_json::Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Rates from an exchangerate-api.com compatible `/v4/latest/{base}` endpoint.
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: Option<String>,
    retries: usize,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(config: &ExchangeRateProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fintrack/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retries: config.retries,
            client,
        })
    }
}

#[async_trait]
impl RemoteRateSource for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self), fields(base = %base))]
    async fn fetch(&self, base: &CurrencyCode) -> Result<HashMap<CurrencyCode, Decimal>> {
        let endpoint = format!("{}/v4/latest/{}", self.base_url, base);
        debug!("Requesting exchange rates from {}", endpoint);
        let url = match &self.api_key {
            Some(key) => format!("{endpoint}?api_key={key}"),
            None => endpoint,
        };

        let response = with_retry(
            // The URL may carry the api key, keep it out of error text
            || self.client.get(&url).send().map_err(reqwest::Error::without_url),
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| FxError::Fetch(format!("Request error: {e} for base currency: {base}")))?;

        if !response.status().is_success() {
            return Err(FxError::Fetch(format!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            )));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text).map_err(|e| {
            FxError::Fetch(format!("Failed to parse JSON response for {base}: {e}"))
        })?;

        let mut rates = HashMap::with_capacity(data.rates.len());
        for (code, number) in &data.rates {
            let parsed = code.parse::<CurrencyCode>().ok().zip(number_to_decimal(number));
            match parsed {
                Some((code, rate)) if rate > Decimal::ZERO => {
                    rates.insert(code, rate);
                }
                _ => warn!("Skipping unusable rate {}={} for base {}", code, number, base),
            }
        }
        rates.insert(base.clone(), Decimal::ONE);

        debug!("Received {} rates for {}", rates.len(), base);
        Ok(rates)
    }
}
