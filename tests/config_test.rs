use mimir_client::config::Config;
use mimir_client::error::Error;
use secrecy::ExposeSecret;
use std::collections::HashMap;

fn from_pairs(pairs: &[(&str, &str)]) -> mimir_client::Result<Config> {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    Config::from_lookup(|name| map.get(name).map(|v| v.to_string()))
}

#[test]
fn config_from_env_reads_process_environment() {
    // Only this test touches the process environment in this binary.
    unsafe {
        std::env::set_var("MIMIR_API_BASE_URL", "http://api.internal:9000/");
        std::env::set_var("MIMIR_USE_MOCKS", "true");
        std::env::set_var("MIMIR_API_TOKEN", "sk-test");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.api_base_url, "http://api.internal:9000");
    assert!(config.use_mocks);
    assert_eq!(
        config.api_token.as_ref().map(|t| t.expose_secret().to_string()),
        Some("sk-test".to_string())
    );

    unsafe {
        std::env::remove_var("MIMIR_API_BASE_URL");
        std::env::remove_var("MIMIR_USE_MOCKS");
        std::env::remove_var("MIMIR_API_TOKEN");
    }
}

#[test]
fn empty_environment_gives_defaults() {
    let config = from_pairs(&[]).unwrap();
    assert_eq!(config.api_base_url, "http://localhost:8000");
    assert!(!config.use_mocks);
    assert!(!config.log_api);
    assert_eq!(config.default_retry, 1);
    assert!(config.api_token.is_none());
    assert!(config.otel_endpoint.is_none());
    assert_eq!(config.log_level, "info");
}

#[test]
fn legacy_url_variable_is_a_fallback() {
    let config = from_pairs(&[("MIMIR_API_URL", "http://legacy:1")]).unwrap();
    assert_eq!(config.api_base_url, "http://legacy:1");

    let config = from_pairs(&[
        ("MIMIR_API_URL", "http://legacy:1"),
        ("MIMIR_API_BASE_URL", "http://primary:2"),
    ])
    .unwrap();
    assert_eq!(config.api_base_url, "http://primary:2");
}

#[test]
fn malformed_values_fail_fast() {
    let err = from_pairs(&[("MIMIR_API_RETRY", "-1")]).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = from_pairs(&[("MIMIR_LOG_API", "maybe")]).unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("MIMIR_LOG_API")));
}

#[test]
fn token_does_not_leak_through_debug() {
    let config = from_pairs(&[("MIMIR_API_TOKEN", "sk-very-secret")]).unwrap();
    assert!(!format!("{config:?}").contains("sk-very-secret"));
}
