//! Decimal currency conversion and custom-rate adjustment

use super::currency::{CurrencyCode, format_money, format_rate};
use super::error::{FxError, Result};
use super::resolver::{ExchangeResolver, RateSource};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Multiplies `amount` by `rate`. A missing rate fails instead of producing a
/// zero or partial amount.
pub fn convert(amount: Decimal, rate: Option<Decimal>) -> Result<Decimal> {
    let rate = rate.ok_or_else(|| FxError::ConversionFailed(amount.to_string()))?;
    if rate <= Decimal::ZERO {
        return Err(FxError::InvalidRate(rate.to_string()));
    }
    amount
        .checked_mul(rate)
        .ok_or_else(|| FxError::ConversionFailed(format!("{amount} * {rate} overflows")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: Decimal,
    pub rate: Decimal,
    pub converted: Decimal,
    pub source: RateSource,
}

impl Conversion {
    /// `1 CAD = 0.7400 USD`
    pub fn rate_line(&self) -> String {
        format!("1 {} = {} {}", self.base, format_rate(self.rate), self.target)
    }

    pub fn is_degraded(&self) -> bool {
        self.source == RateSource::Default
    }

    pub fn converted_display(&self) -> String {
        format!("${} {}", format_money(self.converted), self.target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomConversion {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: Decimal,
    pub market_rate: Decimal,
    pub user_rate: Decimal,
    pub adjusted_rate: Decimal,
    pub converted: Decimal,
}

pub struct ConversionEngine {
    resolver: Arc<ExchangeResolver>,
}

impl ConversionEngine {
    pub fn new(resolver: Arc<ExchangeResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ExchangeResolver {
        &self.resolver
    }

    /// Converts an amount in the base currency into `target`.
    ///
    /// Falls back to the degraded default rate rather than failing; check
    /// [`Conversion::source`] to tell the two apart.
    pub async fn convert_to(&self, amount: Decimal, target: &CurrencyCode) -> Result<Conversion> {
        let base = self.resolver.base().clone();
        let resolution = self.resolver.resolve(&base, target).await?;
        let converted = convert(amount, Some(resolution.rate))?;
        debug!(%amount, %converted, source = %resolution.source, "Converted {} to {}", base, target);
        Ok(Conversion {
            base,
            target: target.clone(),
            amount,
            rate: resolution.rate,
            converted,
            source: resolution.source,
        })
    }

    /// Converts using a user quoted rate scaled against the market rate:
    /// `amount * (market_rate / user_rate)`.
    pub async fn custom_rate(
        &self,
        amount: Decimal,
        target: &CurrencyCode,
        user_rate: Decimal,
    ) -> Result<CustomConversion> {
        if user_rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(user_rate.to_string()));
        }

        let base = self.resolver.base().clone();
        let market_rate = self
            .resolver
            .resolve_strict(&base, target)
            .await
            .map(|r| r.rate)
            .ok_or_else(|| FxError::CurrencyUnresolved(target.to_string()))?;

        let adjusted_rate = market_rate
            .checked_div(user_rate)
            .ok_or_else(|| FxError::InvalidRate(user_rate.to_string()))?;
        let converted = convert(amount, Some(adjusted_rate))?;

        Ok(CustomConversion {
            base,
            target: target.clone(),
            amount,
            market_rate,
            user_rate,
            adjusted_rate,
            converted,
        })
    }
}
