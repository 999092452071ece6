use super::ui::{self, StyleType};
use crate::Services;
use crate::core::currency::{CurrencyCode, format_money, format_rate, parse_amount};
use crate::core::error::FxError;
use crate::core::notify::Notification;
use crate::core::{Conversion, CustomConversion};
use anyhow::Result;
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;

const WIDTH: usize = 35;

/// Parses a user quoted rate. Positivity is checked by the engine.
pub fn parse_rate(input: &str) -> Result<Decimal, FxError> {
    Decimal::from_str(input.trim()).map_err(|_| FxError::InvalidRate(input.trim().to_string()))
}

/// Translates a core failure into the notification a user should see.
pub(crate) fn notify_failure(services: &Services, error: &FxError) {
    let notification = match error {
        FxError::InvalidAmount(_) => Notification::InvalidAmount,
        FxError::InvalidRate(_) => Notification::InvalidRate,
        FxError::InvalidCurrencyCode(_) => Notification::InvalidCurrency,
        FxError::CurrencyUnresolved(code) => match code.parse::<CurrencyCode>() {
            Ok(code) => Notification::RateNotFound(code),
            Err(_) => Notification::InvalidCurrency,
        },
        _ => Notification::ConversionFailed,
    };
    services.notifier.notify(notification);
}

pub fn display_conversion(conversion: &Conversion) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", ui::separator(WIDTH)));
    output.push_str(&format!(
        "   {}\n",
        ui::style_text(
            &format!("Conversion Summary in {}", conversion.target),
            StyleType::Title
        )
    ));
    output.push_str(&format!("{}\n", ui::separator(WIDTH)));
    output.push_str(&format!(
        "Original Amount:      ${} {}\n",
        format_money(conversion.amount),
        conversion.base
    ));
    output.push_str(&format!(
        "Converted Amount:     {}\n",
        ui::style_text(&conversion.converted_display(), StyleType::TotalValue)
    ));
    output.push_str(&format!("Exchange Rate:        {}\n", conversion.rate_line()));
    output.push_str(&format!(
        "Rate Source:          {}\n",
        ui::style_text(&conversion.source.to_string(), StyleType::Subtle)
    ));
    if conversion.is_degraded() {
        output.push_str(&format!(
            "{}\n",
            ui::style_text(
                &format!(
                    "Amount remains unchanged in {}: ${} {}",
                    conversion.base,
                    format_money(conversion.amount),
                    conversion.base
                ),
                StyleType::Warning
            )
        ));
    }
    output.push_str(&ui::separator(WIDTH));
    output
}

pub fn display_custom_conversion(conversion: &CustomConversion) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", ui::separator(WIDTH)));
    output.push_str(&format!(
        "   {}\n",
        ui::style_text(
            &format!("Custom Rate Conversion to {}", conversion.target),
            StyleType::Title
        )
    ));
    output.push_str(&format!("{}\n", ui::separator(WIDTH)));
    output.push_str(&format!(
        "Original Amount:      ${} {}\n",
        format_money(conversion.amount),
        conversion.base
    ));
    output.push_str(&format!(
        "Market Rate:          1 {} = {} {}\n",
        conversion.base,
        format_rate(conversion.market_rate),
        conversion.target
    ));
    output.push_str(&format!(
        "Your Rate:            1 {} = {} {}\n",
        conversion.base,
        format_rate(conversion.user_rate),
        conversion.target
    ));
    output.push_str(&format!(
        "Custom exchange rate ({} to {}): {}\n",
        conversion.base,
        conversion.target,
        format_rate(conversion.adjusted_rate)
    ));
    output.push_str(&format!(
        "Converted Amount:     {}\n",
        ui::style_text(
            &format!(
                "${} {}",
                format_money(conversion.converted),
                conversion.target
            ),
            StyleType::TotalValue
        )
    ));
    output.push_str(&ui::separator(WIDTH));
    output
}

async fn convert_inner(
    services: &Services,
    amount: &str,
    currency: &str,
) -> Result<Conversion, FxError> {
    let amount = parse_amount(amount)?;
    let target = services.validator.validate(currency).await?;
    services.engine.convert_to(amount, &target).await
}

async fn custom_inner(
    services: &Services,
    amount: &str,
    currency: &str,
    rate: &str,
) -> Result<CustomConversion, FxError> {
    let amount = parse_amount(amount)?;
    let user_rate = parse_rate(rate)?;
    let target = services.validator.validate(currency).await?;
    services.engine.custom_rate(amount, &target, user_rate).await
}

/// Converts an amount in the base currency at the resolved market rate.
pub async fn run_convert<W: Write>(
    services: &Services,
    amount: &str,
    currency: &str,
    writer: &mut W,
) -> Result<()> {
    match convert_inner(services, amount, currency).await {
        Ok(conversion) => {
            writeln!(writer, "{}", display_conversion(&conversion))?;
            Ok(())
        }
        Err(e) => {
            notify_failure(services, &e);
            Err(e.into())
        }
    }
}

/// Converts an amount using a rate quoted by the user.
pub async fn run_custom<W: Write>(
    services: &Services,
    amount: &str,
    currency: &str,
    rate: &str,
    writer: &mut W,
) -> Result<()> {
    match custom_inner(services, amount, currency, rate).await {
        Ok(conversion) => {
            writeln!(writer, "{}", display_custom_conversion(&conversion))?;
            Ok(())
        }
        Err(e) => {
            notify_failure(services, &e);
            Err(e.into())
        }
    }
}
