//! Human-facing notifications raised by the currency core

use super::currency::CurrencyCode;
use std::fmt::Display;

/// Who a notification is addressed to when it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationContext {
    General,
    Currency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    RateNotFound(CurrencyCode),
    DegradedFallback {
        base: CurrencyCode,
        target: CurrencyCode,
    },
    ConversionFailed,
    InvalidCurrency,
    InvalidRate,
    InvalidAmount,
    InvalidChoice,
    ReturningToMenu,
}

impl Notification {
    pub fn context(&self) -> NotificationContext {
        match self {
            Notification::RateNotFound(_)
            | Notification::DegradedFallback { .. }
            | Notification::ConversionFailed => NotificationContext::Currency,
            Notification::InvalidCurrency
            | Notification::InvalidRate
            | Notification::InvalidAmount
            | Notification::InvalidChoice
            | Notification::ReturningToMenu => NotificationContext::General,
        }
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::RateNotFound(code) => {
                write!(f, "ERROR: Exchange rate not found for {code}.")
            }
            Notification::DegradedFallback { base, target } => write!(
                f,
                "WARNING: No exchange rate available for {base} to {target}. Using a default rate of 1.0."
            ),
            Notification::ConversionFailed => {
                write!(f, "ERROR: Currency conversion failed. Please try again.")
            }
            Notification::InvalidCurrency => {
                write!(f, "ERROR: Invalid currency code or no exchange rate found.")
            }
            Notification::InvalidRate => {
                write!(f, "ERROR: Exchange rate must be a number greater than 0.")
            }
            Notification::InvalidAmount => write!(
                f,
                "ERROR: Invalid amount entered. Please enter a valid numeric value."
            ),
            Notification::InvalidChoice => write!(
                f,
                "ERROR: Invalid selection. Please enter a number from 1 to 3."
            ),
            Notification::ReturningToMenu => write!(f, "Returning to the main menu..."),
        }
    }
}

/// One-way sink for notifications. Callers never wait on a response.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Discards every notification.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notification: Notification) {}
}
