//! API request span helpers.
//!
//! Provides span creation and attempt/fallback recording for requests
//! flowing through the request engine and the facade.

use tracing::Span;

/// Start a span for one logical API request.
///
/// The `http.attempts` and `http.response.status_code` fields are declared
/// empty and filled via [`record_attempt`].
pub fn start_request_span(method: &str, endpoint: &str) -> Span {
    tracing::info_span!(
        "api.request",
        "http.request.method" = method,
        "url.path" = endpoint,
        "http.attempts" = tracing::field::Empty,
        "http.response.status_code" = tracing::field::Empty,
    )
}

/// Record the outcome of a single attempt on the request span.
pub fn record_attempt(span: &Span, attempt: u32, status: Option<u16>) {
    span.record("http.attempts", attempt + 1);
    if let Some(status) = status {
        span.record("http.response.status_code", status);
    }
}

/// Record a fallback latch transition as an event on the given span.
///
/// `to` is "mock" when entering fallback and "live" when leaving it.
pub fn record_fallback_transition(span: &Span, operation: &str, to: &str) {
    span.in_scope(|| {
        tracing::info!(operation, to, "fallback_transition");
    });
}
