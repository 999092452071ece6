//! Currency types and the rate source abstractions

use super::error::{FxError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Fractional digits shown for exchange rates.
pub const RATE_DISPLAY_DP: u32 = 4;
/// Fractional digits shown for monetary amounts.
pub const MONEY_DISPLAY_DP: u32 = 2;

/// A three letter alphabetic currency code, always stored uppercase.
///
/// Parsing only checks the shape of the code. Whether the code is usable is
/// decided by the resolver: any code the remote source or the rate store knows
/// about is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(code))
        } else {
            Err(FxError::InvalidCurrencyCode(s.trim().to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positive rate quoted as `1 base = rate target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub rate: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(
        base: CurrencyCode,
        target: CurrencyCode,
        rate: Decimal,
        last_updated: DateTime<Utc>,
    ) -> Result<Self> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(rate.to_string()));
        }
        Ok(Self {
            base,
            target,
            rate,
            last_updated,
        })
    }
}

/// Rounds half to even and pads to `dp` fractional digits.
pub fn format_decimal(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven);
    format!("{rounded:.prec$}", prec = dp as usize)
}

pub fn format_rate(rate: Decimal) -> String {
    format_decimal(rate, RATE_DISPLAY_DP)
}

pub fn format_money(amount: Decimal) -> String {
    format_decimal(amount, MONEY_DISPLAY_DP)
}

/// Parses a human-entered amount: digits with at most one decimal point.
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let trimmed = input.trim().trim_start_matches('$');
    let digits_only = trimmed.replacen('.', "", 1);
    if digits_only.is_empty() || !digits_only.chars().all(|c| c.is_ascii_digit()) {
        return Err(FxError::InvalidAmount(input.trim().to_string()));
    }
    Decimal::from_str(trimmed).map_err(|_| FxError::InvalidAmount(input.trim().to_string()))
}

/// A feed returning every rate relative to one base currency.
#[async_trait]
pub trait RemoteRateSource: Send + Sync {
    async fn fetch(&self, base: &CurrencyCode) -> Result<HashMap<CurrencyCode, Decimal>>;
}

/// Durable copy of fetched rates keyed by `(base, target)`.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Inserts or replaces the row for `(rate.base, rate.target)`.
    async fn upsert(&self, rate: &ExchangeRate) -> Result<()>;
    async fn lookup(&self, base: &CurrencyCode, target: &CurrencyCode)
    -> Result<Option<ExchangeRate>>;
    async fn list(&self, base: &CurrencyCode) -> Result<Vec<ExchangeRate>>;

    async fn upsert_all(&self, rates: &[ExchangeRate]) -> Result<()> {
        for result in join_all(rates.iter().map(|rate| self.upsert(rate))).await {
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_code_parsing() {
        assert_eq!("usd".parse::<CurrencyCode>().unwrap().as_str(), "USD");
        assert_eq!(" eur ".parse::<CurrencyCode>().unwrap().as_str(), "EUR");
        assert!(matches!(
            "U5D".parse::<CurrencyCode>(),
            Err(FxError::InvalidCurrencyCode(code)) if code == "U5D"
        ));
        assert!("".parse::<CurrencyCode>().is_err());
        assert!("US".parse::<CurrencyCode>().is_err());
        assert!("US D".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_exchange_rate_rejects_non_positive() {
        let cad: CurrencyCode = "CAD".parse().unwrap();
        let usd: CurrencyCode = "USD".parse().unwrap();
        let now = Utc::now();
        assert!(ExchangeRate::new(cad.clone(), usd.clone(), dec!(0.74), now).is_ok());
        assert!(matches!(
            ExchangeRate::new(cad.clone(), usd.clone(), Decimal::ZERO, now),
            Err(FxError::InvalidRate(_))
        ));
        assert!(ExchangeRate::new(cad, usd, dec!(-1.2), now).is_err());
    }

    #[test]
    fn test_display_precision() {
        assert_eq!(format_money(dec!(135)), "135.00");
        assert_eq!(format_money(dec!(52.857142)), "52.86");
        assert_eq!(format_money(dec!(0.125)), "0.12");
        assert_eq!(format_rate(dec!(0.74)), "0.7400");
        assert_eq!(format_rate(dec!(1.057142857)), "1.0571");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100").unwrap(), dec!(100));
        assert_eq!(parse_amount("$50.25").unwrap(), dec!(50.25));
        assert!(matches!(parse_amount("1.2.3"), Err(FxError::InvalidAmount(_))));
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount(".").is_err());
    }
}
