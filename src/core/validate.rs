use super::currency::CurrencyCode;
use super::error::{FxError, Result};
use super::notify::{Notification, Notifier};
use super::resolver::ExchangeResolver;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

const ABORT_WORDS: [&str; 3] = ["q", "quit", "back"];

/// Gatekeeper for currency codes typed by a human.
pub struct CurrencyValidator {
    resolver: Arc<ExchangeResolver>,
    notifier: Arc<dyn Notifier>,
}

impl CurrencyValidator {
    pub fn new(resolver: Arc<ExchangeResolver>, notifier: Arc<dyn Notifier>) -> Self {
        Self { resolver, notifier }
    }

    /// Accepts a code only if it is alphabetic and resolves to a real rate.
    ///
    /// The shape check runs first, so malformed input never reaches the resolver.
    pub async fn validate(&self, input: &str) -> Result<CurrencyCode> {
        let code: CurrencyCode = input.parse()?;
        let base = self.resolver.base();
        match self.resolver.resolve_strict(base, &code).await {
            Some(resolution) => {
                debug!("Validated {} via {}", code, resolution.source);
                Ok(code)
            }
            None => Err(FxError::CurrencyUnresolved(code.to_string())),
        }
    }

    /// Prompts until a valid code is entered. Returns `None` when input ends
    /// or the user types an abort word.
    pub async fn prompt<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<Option<CurrencyCode>>
    where
        R: BufRead,
        W: Write,
    {
        loop {
            write!(writer, "Enter currency (e.g., CAD, USD, EUR): ")?;
            writer.flush()?;

            let mut line = String::new();
            let read = reader.read_line(&mut line)?;
            let input = line.trim();
            if read == 0 || ABORT_WORDS.contains(&input.to_lowercase().as_str()) {
                return Ok(None);
            }

            match self.validate(input).await {
                Ok(code) => return Ok(Some(code)),
                Err(FxError::InvalidCurrencyCode(_)) => {
                    self.notifier.notify(Notification::InvalidCurrency);
                }
                Err(FxError::CurrencyUnresolved(_)) => {
                    if let Ok(code) = input.parse() {
                        self.notifier.notify(Notification::RateNotFound(code));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
