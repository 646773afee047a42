//! Request engine: one logical request, bounded retry, linear backoff.

use super::transport::{HttpRequest, RawResponse, Transport};
use crate::config::Config;
use crate::config::secrets::{ExposeSecret, SecretString, bearer};
use crate::error::{Error, Result};
use crate::telemetry::api::{record_attempt, start_request_span};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, info};

/// Backoff unit. The wait before retry `n` (1-based) is `n` units.
pub const BACKOFF_STEP: Duration = Duration::from_millis(150);

/// Delay before the `retry`-th retry (1-based): 150ms, 300ms, 450ms, ...
pub fn backoff_delay(retry: u32) -> Duration {
    BACKOFF_STEP * retry
}

/// Per-call options. Anything left unset falls back to the engine defaults.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    /// Additional attempts after the first. `None` uses the engine default.
    pub retry: Option<u32>,
    /// Don't attach the bearer token.
    pub skip_auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
            retry: None,
            skip_auth: false,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

/// Issues requests against the API base URL through a [`Transport`].
#[derive(Clone)]
pub struct RequestEngine {
    base_url: String,
    transport: Arc<dyn Transport>,
    default_retry: u32,
    log_api: bool,
    api_token: Option<Arc<SecretString>>,
}

impl std::fmt::Debug for RequestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEngine")
            .field("base_url", &self.base_url)
            .field("default_retry", &self.default_retry)
            .field("log_api", &self.log_api)
            .finish_non_exhaustive()
    }
}

impl RequestEngine {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            transport,
            default_retry: config.default_retry,
            log_api: config.log_api,
            api_token: config
                .api_token
                .as_ref()
                .map(|t| Arc::new(SecretString::from(t.expose_secret().to_owned()))),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a request and deserialize its JSON payload into `T`.
    ///
    /// Transport failures and non-2xx responses are retried up to the retry
    /// budget, sleeping [`backoff_delay`] between attempts. An empty or
    /// non-JSON body is treated as no payload and decoded from `null`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let span = start_request_span(options.method.as_str(), endpoint);
        let method_label = KeyValue::new("method", options.method.to_string());
        let start = Instant::now();

        let result = self.request_with_retry(endpoint, options).instrument(span.clone()).await;

        metrics::request_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            std::slice::from_ref(&method_label),
        );
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::api_requests().add(1, &[method_label, KeyValue::new("outcome", outcome)]);

        let payload = result?;
        Ok(serde_json::from_value(
            payload.unwrap_or(serde_json::Value::Null),
        )?)
    }

    async fn request_with_retry(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<serde_json::Value>> {
        let retry = options.retry.unwrap_or(self.default_retry);
        let request = self.build_request(endpoint, options);
        let span = tracing::Span::current();

        let mut attempt = 0;
        loop {
            let outcome = self.attempt(&request).await;
            record_attempt(&span, attempt, outcome.as_ref().err().and_then(Error::status));

            match outcome {
                Ok(payload) => {
                    self.log(&request, attempt, "ok");
                    return Ok(payload);
                }
                Err(e) if e.is_retryable() && attempt < retry => {
                    self.log(&request, attempt, &e.to_string());
                    attempt += 1;
                    metrics::api_retries()
                        .add(1, &[KeyValue::new("method", request.method.to_string())]);
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(e) => {
                    self.log(&request, attempt, &e.to_string());
                    return Err(e);
                }
            }
        }
    }

    fn build_request(&self, endpoint: &str, options: RequestOptions) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if !options.skip_auth {
            if let Some(ref token) = self.api_token {
                headers.push(("Authorization".to_string(), bearer(token)));
            }
        }
        // Caller headers win over the defaults above.
        for (name, value) in options.headers {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        HttpRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, endpoint),
            headers,
            body: options.body,
        }
    }

    /// One exchange. `Ok` carries the parsed payload of a 2xx response.
    async fn attempt(&self, request: &HttpRequest) -> Result<Option<serde_json::Value>> {
        let resp: RawResponse = self.transport.send(request).await?;
        let payload = parse_payload(&resp.body);
        if resp.is_success() {
            Ok(payload)
        } else {
            Err(Error::Api {
                status: resp.status,
                body: payload,
            })
        }
    }

    fn log(&self, request: &HttpRequest, attempt: u32, outcome: &str) {
        if self.log_api {
            info!(method = %request.method, url = %request.url, attempt, outcome, "api request");
        } else {
            debug!(method = %request.method, url = %request.url, attempt, outcome, "api request");
        }
    }
}

/// Parse a response body as JSON. Empty or malformed bodies carry no payload.
pub fn parse_payload(body: &str) -> Option<serde_json::Value> {
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(body).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backoff_is_linear_in_retry_number() {
        assert_eq!(backoff_delay(1), Duration::from_millis(150));
        assert_eq!(backoff_delay(2), Duration::from_millis(300));
        assert_eq!(backoff_delay(4), Duration::from_millis(600));
    }

    #[test]
    fn empty_and_malformed_bodies_have_no_payload() {
        assert_eq!(parse_payload(""), None);
        assert_eq!(parse_payload("  \n"), None);
        assert_eq!(parse_payload("<html>502</html>"), None);
        assert_eq!(parse_payload(r#"{"ok":true}"#), Some(json!({"ok": true})));
    }

    #[test]
    fn options_builder_sets_fields() {
        let opts = RequestOptions::post()
            .body(json!({"a": 1}))
            .header("X-Trace", "abc")
            .retry(0)
            .skip_auth();
        assert_eq!(opts.method, Method::POST);
        assert_eq!(opts.retry, Some(0));
        assert!(opts.skip_auth);
        assert_eq!(opts.headers, vec![("X-Trace".to_string(), "abc".to_string())]);
    }
}
