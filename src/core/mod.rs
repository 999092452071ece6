//! Core currency logic and abstractions

pub mod cache;
pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod log;
pub mod notify;
pub mod resolver;
pub mod validate;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use convert::{Conversion, ConversionEngine, CustomConversion};
pub use currency::{CurrencyCode, ExchangeRate, RateStore, RemoteRateSource};
pub use error::FxError;
pub use notify::{Notification, NotificationContext, Notifier};
pub use resolver::{ExchangeResolver, RateSource, Resolution};
pub use validate::CurrencyValidator;
