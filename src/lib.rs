pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::cache::DEFAULT_FRESHNESS_HOURS;
use crate::core::config::AppConfig;
use crate::core::{
    ConversionEngine, CurrencyValidator, ExchangeResolver, Notifier, RateCache, RateStore,
    RemoteRateSource,
};
use anyhow::Result;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Top level commands, independent of the argument parser.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Convert { amount: String, currency: String },
    Custom {
        amount: String,
        currency: String,
        rate: String,
    },
    Rates { refresh: bool },
    Menu,
}

/// Everything a command needs, wired once at startup.
pub struct Services {
    pub config: AppConfig,
    pub cache: Arc<RateCache>,
    pub store: Arc<dyn RateStore>,
    pub resolver: Arc<ExchangeResolver>,
    pub engine: ConversionEngine,
    pub validator: CurrencyValidator,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    pub fn build(config: AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let source = providers::ExchangeRateApiProvider::new(&config.providers.exchangerate)?;
        let store = store::open_rate_store(&config);
        Ok(Self::with_parts(config, Arc::new(source), store, notifier))
    }

    pub fn with_parts(
        config: AppConfig,
        source: Arc<dyn RemoteRateSource>,
        store: Arc<dyn RateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let freshness = config.cache.freshness().unwrap_or_else(|| {
            warn!(
                "Ignoring unusable cache.ttl_hours {}, using {} hours",
                config.cache.ttl_hours, DEFAULT_FRESHNESS_HOURS
            );
            Duration::hours(DEFAULT_FRESHNESS_HOURS)
        });
        let cache = Arc::new(RateCache::with_freshness(
            config.base_currency.clone(),
            freshness,
        ));
        let resolver = Arc::new(ExchangeResolver::new(
            Arc::clone(&cache),
            source,
            Arc::clone(&store),
            Arc::clone(&notifier),
        ));
        Self {
            engine: ConversionEngine::new(Arc::clone(&resolver)),
            validator: CurrencyValidator::new(Arc::clone(&resolver), Arc::clone(&notifier)),
            config,
            cache,
            store,
            resolver,
            notifier,
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("FinTrack starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let services = Services::build(config, Arc::new(cli::notifier::ConsoleNotifier))?;
    let mut stdout = std::io::stdout();

    match command {
        AppCommand::Convert { amount, currency } => {
            cli::convert::run_convert(&services, &amount, &currency, &mut stdout).await
        }
        AppCommand::Custom {
            amount,
            currency,
            rate,
        } => cli::convert::run_custom(&services, &amount, &currency, &rate, &mut stdout).await,
        AppCommand::Rates { refresh } => {
            cli::rates::run_rates(&services, refresh, &mut stdout).await
        }
        AppCommand::Menu => {
            let mut stdin = std::io::stdin().lock();
            cli::menu::run_menu(&services, &mut stdin, &mut stdout).await
        }
    }
}
