//! Metric instrument factories for mimir-client.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"mimir-client"` meter. Without
//! an OTLP endpoint the global provider is a no-op.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for mimir-client instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("mimir-client")
}

/// Counter: logical API requests, after retries.
/// Labels: `method`, `outcome` ("ok" | "error").
pub fn api_requests() -> Counter<u64> {
    meter()
        .u64_counter("mimir.api.requests")
        .with_description("Number of logical API requests")
        .build()
}

/// Counter: retry attempts beyond the first.
/// Labels: `method`.
pub fn api_retries() -> Counter<u64> {
    meter()
        .u64_counter("mimir.api.retries")
        .with_description("Number of request retries")
        .build()
}

/// Counter: transitions of the automatic fallback latch.
/// Labels: `to` ("mock" | "live").
pub fn fallback_transitions() -> Counter<u64> {
    meter()
        .u64_counter("mimir.api.fallback_transitions")
        .with_description("Transitions into and out of automatic mock fallback")
        .build()
}

/// Counter: health checks run by the poller.
/// Labels: `status`.
pub fn health_checks() -> Counter<u64> {
    meter()
        .u64_counter("mimir.health.checks")
        .with_description("Number of backend health checks")
        .build()
}

/// Histogram: logical request duration in milliseconds, retries included.
/// Labels: `method`.
pub fn request_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("mimir.api.request.duration_ms")
        .with_description("API request duration in milliseconds")
        .with_unit("ms")
        .build()
}
