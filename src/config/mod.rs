//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast on malformed values. The API token is
//! wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use secrecy::SecretString;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_RETRY: u32 = 1;

#[derive(Debug)]
pub struct Config {
    pub api_base_url: String,
    /// Explicit mock mode: never contact the backend.
    pub use_mocks: bool,
    /// Log every request attempt at info level.
    pub log_api: bool,
    /// Retry budget for calls that don't override it.
    pub default_retry: u32,
    pub api_token: Option<SecretString>,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            use_mocks: false,
            log_api: false,
            default_retry: DEFAULT_RETRY,
            api_token: None,
            otel_endpoint: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_base_url = var("MIMIR_API_BASE_URL")
            .or_else(|| var("MIMIR_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let default_retry = match var("MIMIR_API_RETRY") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!("MIMIR_API_RETRY must be a non-negative integer, got '{raw}'"))
            })?,
            None => DEFAULT_RETRY,
        };

        Ok(Self {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            use_mocks: flag(&var, "MIMIR_USE_MOCKS")?,
            log_api: flag(&var, "MIMIR_LOG_API")?,
            default_retry,
            api_token: var("MIMIR_API_TOKEN").map(SecretString::from),
            otel_endpoint: var("OTEL_ENDPOINT"),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn flag<F>(var: &F, name: &str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(false),
        Some(raw) => parse_bool(&raw)
            .ok_or_else(|| Error::Config(format!("{name} must be a boolean, got '{raw}'"))),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert!(!config.use_mocks);
        assert!(!config.log_api);
        assert_eq!(config.default_retry, 1);
        assert!(config.api_token.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn legacy_url_variable_is_a_fallback() {
        let config =
            Config::from_lookup(lookup(&[("MIMIR_API_URL", "http://api.internal:9000/")])).unwrap();
        assert_eq!(config.api_base_url, "http://api.internal:9000");

        let config = Config::from_lookup(lookup(&[
            ("MIMIR_API_BASE_URL", "https://mimir.example.com"),
            ("MIMIR_API_URL", "http://ignored"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://mimir.example.com");
    }

    #[test]
    fn boolean_flags_accept_common_spellings() {
        for raw in ["1", "true", "TRUE", "yes", "on"] {
            let config = Config::from_lookup(lookup(&[("MIMIR_USE_MOCKS", raw)])).unwrap();
            assert!(config.use_mocks, "{raw} should enable mocks");
        }
        let config = Config::from_lookup(lookup(&[("MIMIR_LOG_API", "off")])).unwrap();
        assert!(!config.log_api);
    }

    #[test]
    fn malformed_values_fail_fast() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("MIMIR_USE_MOCKS", "maybe")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("MIMIR_API_RETRY", "-1")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn token_is_kept_secret() {
        let config = Config::from_lookup(lookup(&[("MIMIR_API_TOKEN", "tok-123")])).unwrap();
        let token = config.api_token.as_ref().unwrap();
        assert_eq!(token.expose_secret(), "tok-123");
        assert!(!format!("{config:?}").contains("tok-123"));
    }
}
