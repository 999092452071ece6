use super::currency::CurrencyCode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.exchangerate-api.com";

fn default_base_currency() -> CurrencyCode {
    CurrencyCode::try_from("CAD".to_string()).expect("CAD is a valid currency code")
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retries() -> usize {
    2
}

fn default_ttl_hours() -> i64 {
    24
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for ExchangeRateProviderConfig {
    fn default() -> Self {
        ExchangeRateProviderConfig {
            base_url: default_api_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub exchangerate: ExchangeRateProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// How long a fetched rate table counts as fresh.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

impl CacheConfig {
    /// The freshness window, or `None` when `ttl_hours` is not a usable duration.
    pub fn freshness(&self) -> Option<chrono::Duration> {
        if self.ttl_hours <= 0 {
            return None;
        }
        chrono::Duration::try_hours(self.ttl_hours)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_hours: default_ttl_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_base_currency")]
    pub base_currency: CurrencyCode,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_currency: default_base_currency(),
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or defaults when none has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fintrack", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "fintrack", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        anyhow::ensure!(
            config.cache.freshness().is_some(),
            "cache.ttl_hours must be a positive number of hours within range, got {}",
            config.cache.ttl_hours
        );
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
base_currency: "usd"
providers:
  exchangerate:
    base_url: "http://example.com/rates"
    api_key: "secret"
    retries: 0
cache:
  ttl_hours: 12
data_path: "/tmp/fintrack"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.base_currency.as_str(), "USD");
        assert_eq!(
            config.providers.exchangerate.base_url,
            "http://example.com/rates"
        );
        assert_eq!(
            config.providers.exchangerate.api_key.as_deref(),
            Some("secret")
        );
        assert_eq!(config.providers.exchangerate.retries, 0);
        assert_eq!(config.providers.exchangerate.timeout_secs, 10);
        assert_eq!(config.cache.ttl_hours, 12);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/fintrack")
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.base_currency.as_str(), "CAD");
        assert_eq!(config.providers.exchangerate.base_url, DEFAULT_API_URL);
        assert!(config.providers.exchangerate.api_key.is_none());
        assert_eq!(config.cache.ttl_hours, 24);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_invalid_base_currency_is_rejected() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("base_currency: \"C4D\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_path_rejects_non_positive_ttl() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "cache:\n  ttl_hours: 0\n").unwrap();
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("ttl_hours"));
    }

    #[test]
    fn test_load_from_path_rejects_out_of_range_ttl() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "cache:\n  ttl_hours: 3000000000000\n").unwrap();
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("ttl_hours"));

        let config = CacheConfig {
            ttl_hours: 3_000_000_000_000,
        };
        assert!(config.freshness().is_none());
        assert_eq!(
            CacheConfig::default().freshness(),
            Some(chrono::Duration::hours(24))
        );
    }
}
