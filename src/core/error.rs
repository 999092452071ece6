//! Error taxonomy for rate resolution and conversion

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FxError {
    /// Remote fetch failed and nothing was persisted for the pair.
    #[error("No exchange rate available for {base} to {target}")]
    RateUnavailable { base: String, target: String },

    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),

    #[error("Exchange rate must be greater than zero, got {0}")]
    InvalidRate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Currency conversion failed: no rate for {0}")]
    ConversionFailed(String),

    #[error("Exchange rate could not be resolved for {0}")]
    CurrencyUnresolved(String),

    #[error("Failed to fetch exchange rates: {0}")]
    Fetch(String),

    #[error("Rate store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = FxError> = std::result::Result<T, E>;

impl From<fjall::Error> for FxError {
    fn from(err: fjall::Error) -> Self {
        FxError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        FxError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for FxError {
    fn from(err: reqwest::Error) -> Self {
        FxError::Fetch(err.without_url().to_string())
    }
}
