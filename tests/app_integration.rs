use fintrack::core::config::AppConfig;
use fintrack::core::notify::SilentNotifier;
use fintrack::core::{CurrencyCode, RateSource};
use rust_decimal_macros::dec;
use std::fs;
use std::sync::Arc;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const CAD_RATES: &str = r#"{
        "base": "CAD",
        "date": "2024-11-20",
        "rates": { "CAD": 1, "USD": 0.74, "EUR": 0.68 }
    }"#;

    pub async fn create_mock_server(base: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/v4/latest/{base}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let config_content = format!(
            r#"
        base_currency: "CAD"
        providers:
          exchangerate:
            base_url: {}
            retries: 0
        data_path: {}
    "#,
            base_url,
            dir.join("data").display()
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

fn code(s: &str) -> CurrencyCode {
    s.parse().unwrap()
}

#[test_log::test(tokio::test)]
async fn test_convert_command_with_mock() {
    let mock_server = test_utils::create_mock_server("CAD", 200, test_utils::CAD_RATES).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());

    let result = fintrack::run_command(
        fintrack::AppCommand::Convert {
            amount: "100".to_string(),
            currency: "usd".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );
    assert!(temp_dir.path().join("data").join("rates").exists());
}

#[test_log::test(tokio::test)]
async fn test_rates_refresh_command_with_mock() {
    let mock_server = test_utils::create_mock_server("CAD", 200, test_utils::CAD_RATES).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());

    let result = fintrack::run_command(
        fintrack::AppCommand::Rates { refresh: true },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Rates command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_convert_command_rejects_unknown_currency_when_offline() {
    let mock_server = test_utils::create_mock_server("CAD", 500, "").await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());

    let result = fintrack::run_command(
        fintrack::AppCommand::Convert {
            amount: "100".to_string(),
            currency: "USD".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    let err = result.expect_err("Conversion should fail without any rate");
    info!(%err, "Conversion failed as expected");
    assert!(err.to_string().contains("USD"));
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_is_an_error() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("absent.yaml");

    let result =
        fintrack::run_command(fintrack::AppCommand::Menu, Some(missing.to_str().unwrap())).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_services_cache_and_store_flow() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/latest/CAD"))
        .respond_with(ResponseTemplate::new(200).set_body_string(test_utils::CAD_RATES))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());
    let config = AppConfig::load_from_path(&config_path).expect("Failed to load config");
    let services = fintrack::Services::build(config, Arc::new(SilentNotifier))
        .expect("Failed to build services");

    let first = services
        .engine
        .convert_to(dec!(100), &code("USD"))
        .await
        .unwrap();
    assert_eq!(first.source, RateSource::Remote);
    assert_eq!(first.converted, dec!(74.00));
    assert_eq!(first.rate_line(), "1 CAD = 0.7400 USD");

    // Served from the fresh cache without another request
    let second = services
        .engine
        .convert_to(dec!(10), &code("EUR"))
        .await
        .unwrap();
    assert_eq!(second.source, RateSource::Cache);
    assert_eq!(second.converted, dec!(6.80));

    let stored = services.store.list(&code("CAD")).await.unwrap();
    let targets: Vec<&str> = stored.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["EUR", "USD"]);

    let custom = services
        .engine
        .custom_rate(dec!(50), &code("USD"), dec!(0.70))
        .await
        .unwrap();
    assert_eq!(fintrack::core::currency::format_money(custom.converted), "52.86");

    assert_eq!(
        services.resolver.supported_currencies().await,
        vec![code("CAD"), code("EUR"), code("USD")]
    );
}

#[test_log::test(tokio::test)]
async fn test_services_degrade_when_nothing_is_known() {
    let mock_server = test_utils::create_mock_server("CAD", 503, "").await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri());
    let config = AppConfig::load_from_path(&config_path).expect("Failed to load config");
    let services = fintrack::Services::build(config, Arc::new(SilentNotifier))
        .expect("Failed to build services");

    let conversion = services
        .engine
        .convert_to(dec!(100), &code("USD"))
        .await
        .unwrap();
    assert!(conversion.is_degraded());
    assert_eq!(conversion.rate, dec!(1));
    assert_eq!(conversion.converted, dec!(100));

    let strict = services
        .engine
        .custom_rate(dec!(50), &code("USD"), dec!(0.70))
        .await;
    assert!(strict.is_err());
}

#[test]
fn test_example_config_round_trip_through_setup() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("fintrack").join("config.yaml");

    fintrack::cli::setup::setup_at_path(&config_path).expect("Setup failed");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.starts_with("# Example configuration file for fintrack"));
    assert!(fintrack::cli::setup::setup_at_path(&config_path).is_err());
}
