use super::convert::{display_conversion, display_custom_conversion, notify_failure, parse_rate};
use super::ui::{self, StyleType};
use crate::Services;
use crate::core::currency::{CurrencyCode, parse_amount};
use crate::core::notify::Notification;
use anyhow::Result;
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use tracing::debug;

const WIDTH: usize = 35;

/// Outcome of a menu action.
enum Flow {
    Continue,
    InputClosed,
}

fn read_input<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(writer, "{prompt}")?;
    writer.flush()?;
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_header<W: Write>(writer: &mut W) -> Result<()> {
    let rule = "=".repeat(WIDTH);
    writeln!(writer, "\n{rule}")?;
    writeln!(
        writer,
        "{}",
        ui::centered("CURRENCY CONVERSION", WIDTH, StyleType::Title)
    )?;
    writeln!(writer, "{rule}\n")?;
    writeln!(writer, "1. API Exchange Rate")?;
    writeln!(writer, "2. Custom Exchange Rate")?;
    writeln!(writer, "3. Back to Main Menu\n")?;
    writeln!(writer, "{}", ui::separator(WIDTH))?;
    Ok(())
}

fn read_amount<R: BufRead, W: Write>(
    services: &Services,
    reader: &mut R,
    writer: &mut W,
) -> Result<Option<Decimal>> {
    let prompt = format!("\nEnter the amount in {}: $", services.resolver.base());
    loop {
        let Some(input) = read_input(reader, writer, &prompt)? else {
            return Ok(None);
        };
        match parse_amount(&input) {
            Ok(amount) => return Ok(Some(amount)),
            Err(e) => {
                debug!(error = %e, "Rejected amount");
                services.notifier.notify(Notification::InvalidAmount);
            }
        }
    }
}

fn read_custom_rate<R: BufRead, W: Write>(
    services: &Services,
    target: &CurrencyCode,
    reader: &mut R,
    writer: &mut W,
) -> Result<Option<Decimal>> {
    let prompt = format!(
        "Enter your custom exchange rate for {} to {target}: ",
        services.resolver.base()
    );
    loop {
        let Some(input) = read_input(reader, writer, &prompt)? else {
            return Ok(None);
        };
        match parse_rate(&input) {
            Ok(rate) if rate > Decimal::ZERO => return Ok(Some(rate)),
            _ => services.notifier.notify(Notification::InvalidRate),
        }
    }
}

async fn api_rate<R: BufRead, W: Write>(
    services: &Services,
    reader: &mut R,
    writer: &mut W,
) -> Result<Flow> {
    let Some(amount) = read_amount(services, reader, writer)? else {
        return Ok(Flow::InputClosed);
    };
    let Some(target) = services.validator.prompt(reader, writer).await? else {
        return Ok(Flow::Continue);
    };
    match services.engine.convert_to(amount, &target).await {
        Ok(conversion) => writeln!(writer, "{}", display_conversion(&conversion))?,
        Err(e) => notify_failure(services, &e),
    }
    Ok(Flow::Continue)
}

async fn custom_rate<R: BufRead, W: Write>(
    services: &Services,
    reader: &mut R,
    writer: &mut W,
) -> Result<Flow> {
    let Some(amount) = read_amount(services, reader, writer)? else {
        return Ok(Flow::InputClosed);
    };
    let Some(target) = services.validator.prompt(reader, writer).await? else {
        return Ok(Flow::Continue);
    };
    let Some(user_rate) = read_custom_rate(services, &target, reader, writer)? else {
        return Ok(Flow::InputClosed);
    };
    match services.engine.custom_rate(amount, &target, user_rate).await {
        Ok(conversion) => writeln!(writer, "{}", display_custom_conversion(&conversion))?,
        Err(e) => notify_failure(services, &e),
    }
    Ok(Flow::Continue)
}

/// Interactive currency menu. Runs until the user picks "back" or input ends.
pub async fn run_menu<R: BufRead, W: Write>(
    services: &Services,
    reader: &mut R,
    writer: &mut W,
) -> Result<()> {
    loop {
        print_header(writer)?;
        let Some(choice) = read_input(reader, writer, "Enter your choice: ")? else {
            return Ok(());
        };
        writeln!(writer, "{}", ui::separator(WIDTH))?;

        let flow = match choice.as_str() {
            "1" => api_rate(services, reader, writer).await?,
            "2" => custom_rate(services, reader, writer).await?,
            "3" => {
                services.notifier.notify(Notification::ReturningToMenu);
                return Ok(());
            }
            other => {
                debug!("Unknown menu choice {:?}", other);
                services.notifier.notify(Notification::InvalidChoice);
                Flow::Continue
            }
        };
        if let Flow::InputClosed = flow {
            return Ok(());
        }
    }
}
