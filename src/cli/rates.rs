use super::ui::{self, StyleType};
use crate::Services;
use crate::core::currency::{CurrencyCode, format_rate};
use crate::core::notify::Notification;
use crate::core::resolver::RateSource;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub target: CurrencyCode,
    pub rate: Decimal,
    pub source: RateSource,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Stored rows overlaid with whatever the cache currently holds.
pub async fn collect_rates(services: &Services) -> Result<Vec<RateRow>> {
    let base = services.resolver.base();
    let mut rows: BTreeMap<CurrencyCode, RateRow> = BTreeMap::new();

    let stored = services
        .store
        .list(base)
        .await
        .with_context(|| format!("Failed to list stored rates for {base}"))?;
    for rate in stored {
        rows.insert(
            rate.target.clone(),
            RateRow {
                target: rate.target,
                rate: rate.rate,
                source: RateSource::Persisted,
                last_updated: Some(rate.last_updated),
            },
        );
    }

    let snapshot = services.cache.snapshot().await;
    for (target, rate) in snapshot.rates {
        if &target == base {
            continue;
        }
        rows.insert(
            target.clone(),
            RateRow {
                target,
                rate,
                source: RateSource::Cache,
                last_updated: snapshot.last_updated,
            },
        );
    }

    debug!("Collected {} rates for {}", rows.len(), base);
    Ok(rows.into_values().collect())
}

pub fn display_rates(base: &CurrencyCode, rows: &[RateRow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (1 {base})")),
        ui::header_cell("Source"),
        ui::header_cell("Last Updated"),
    ]);

    for row in rows {
        let updated = match row.last_updated {
            Some(ts) => Cell::new(ts.format("%Y-%m-%d %H:%M UTC").to_string()),
            None => ui::na_cell(),
        };
        table.add_row(vec![
            Cell::new(row.target.as_str()),
            ui::number_cell(format_rate(row.rate)),
            Cell::new(row.source.to_string()),
            updated,
        ]);
    }

    format!(
        "Exchange Rates: {}\n\n{table}",
        ui::style_text(base.as_str(), StyleType::Title)
    )
}

/// Prints the known rates for the base currency, fetching them first when asked.
pub async fn run_rates<W: Write>(services: &Services, refresh: bool, writer: &mut W) -> Result<()> {
    let base = services.resolver.base().clone();

    if refresh {
        let pb = ui::new_spinner(&format!("Fetching exchange rates for {base}..."));
        let result = services.resolver.refresh().await;
        pb.finish_and_clear();
        if let Err(e) = result {
            tracing::warn!(error = %e, "Refresh failed, showing stored rates");
            services.notifier.notify(Notification::RateNotFound(base.clone()));
        }
    }

    let rows = collect_rates(services).await?;
    if rows.is_empty() {
        writeln!(
            writer,
            "{}",
            ui::style_text(
                &format!(
                    "No exchange rates stored for {base}. Run `fintrack rates --refresh` to fetch them."
                ),
                StyleType::Warning
            )
        )?;
        return Ok(());
    }

    writeln!(writer, "{}", display_rates(&base, &rows))?;

    if services.cache.is_fresh().await {
        let codes: Vec<String> = services
            .resolver
            .supported_currencies()
            .await
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(
            writer,
            "\n{} {}",
            ui::style_text("Supported currencies:", StyleType::TotalLabel),
            codes.join(", ")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::convert::testing::services;
    use crate::core::currency::ExchangeRate;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_empty_rates_hint() {
        console::set_colors_enabled(false);
        let (services, _) = services();
        let mut buf = Vec::new();

        run_rates(&services, false, &mut buf).await.unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("No exchange rates stored for CAD"));
    }

    #[tokio::test]
    async fn test_refresh_lists_cached_rates() {
        console::set_colors_enabled(false);
        let (services, notifier) = services();
        let mut buf = Vec::new();

        run_rates(&services, true, &mut buf).await.unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("0.7400"));
        assert!(text.contains("0.6800"));
        assert!(text.contains("Supported currencies: CAD, EUR, USD"));
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn test_stored_rows_are_overlaid_by_cache() {
        let (services, _) = services();
        let stale = ExchangeRate::new(code("CAD"), code("GBP"), dec!(0.55), Utc::now()).unwrap();
        services.store.upsert(&stale).await.unwrap();

        let rows = collect_rates(&services).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, RateSource::Persisted);

        services.resolver.refresh().await.unwrap();
        let rows = collect_rates(&services).await.unwrap();
        let targets: Vec<&str> = rows.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["EUR", "GBP", "USD"]);
        let usd = rows.iter().find(|r| r.target.as_str() == "USD").unwrap();
        assert_eq!(usd.source, RateSource::Cache);
        assert_eq!(usd.rate, dec!(0.74));
    }

    #[test]
    fn test_missing_timestamp_shows_na() {
        console::set_colors_enabled(false);
        let rows = vec![RateRow {
            target: code("USD"),
            rate: dec!(0.74),
            source: RateSource::Cache,
            last_updated: None,
        }];

        let text = display_rates(&code("CAD"), &rows);
        assert!(text.contains("N/A"));
        assert!(text.contains("0.7400"));
    }
}
