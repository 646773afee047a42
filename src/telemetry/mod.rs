//! Logging and OTLP export for the client and the `mimir` CLI.
//!
//! Log lines always go to stderr so command output on stdout stays clean.
//! With `OTEL_ENDPOINT` set, request spans, API metrics and log events are
//! also shipped over OTLP.

pub mod api;
pub mod metrics;

use crate::error::{Error, Result};

pub struct TelemetryConfig {
    /// OTLP collector, e.g. "http://localhost:4317". `None` keeps everything local.
    pub endpoint: Option<String>,
    pub service_name: String,
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl TelemetryConfig {
    /// Endpoint and log level come from the client [`Config`](crate::config::Config).
    pub fn from_config(config: &crate::config::Config, service_name: &str) -> Self {
        Self {
            endpoint: config.otel_endpoint.clone(),
            service_name: service_name.to_string(),
            default_filter: config.log_level.clone(),
        }
    }
}

/// Keeps the OTLP providers alive; dropping it flushes pending spans,
/// metrics and logs. Hold it until the CLI command has finished.
#[derive(Default)]
pub struct TelemetryGuard {
    exporters: Option<OtlpProviders>,
}

impl TelemetryGuard {
    /// Whether signals are being shipped to an OTLP collector.
    pub fn is_exporting(&self) -> bool {
        self.exporters.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(p) = self.exporters.take() {
            let _ = p.logs.shutdown();
            let _ = p.metrics.shutdown();
            let _ = p.traces.shutdown();
        }
    }
}

struct OtlpProviders {
    traces: opentelemetry_sdk::trace::SdkTracerProvider,
    metrics: opentelemetry_sdk::metrics::SdkMeterProvider,
    logs: opentelemetry_sdk::logs::SdkLoggerProvider,
}

fn exporter_error(signal: &'static str) -> impl Fn(opentelemetry_otlp::ExporterBuildError) -> Error {
    move |e| Error::Telemetry(format!("failed to build OTLP {signal} exporter: {e}"))
}

/// Build the three OTLP pipelines against `endpoint`. The meter provider is
/// registered globally so `telemetry::metrics` instruments export.
fn otlp_providers(endpoint: &str, service_name: String) -> Result<OtlpProviders> {
    use opentelemetry_otlp::WithExportConfig as _;

    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name)
        .build();

    let spans = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(exporter_error("span"))?;
    let traces = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(spans)
        .with_resource(resource.clone())
        .build();

    let instruments = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(exporter_error("metric"))?;
    let metrics = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
        .with_periodic_exporter(instruments)
        .with_resource(resource.clone())
        .build();
    opentelemetry::global::set_meter_provider(metrics.clone());

    let records = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(exporter_error("log"))?;
    let logs = opentelemetry_sdk::logs::SdkLoggerProvider::builder()
        .with_batch_exporter(records)
        .with_resource(resource)
        .build();

    Ok(OtlpProviders {
        traces,
        metrics,
        logs,
    })
}

/// Install the global subscriber for the client.
///
/// `RUST_LOG` wins over `default_filter`. Fails with [`Error::Telemetry`]
/// when an exporter cannot be built or a subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard> {
    use opentelemetry::trace::TracerProvider as _;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let stderr = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(stderr);
    let subscriber_error =
        |e: tracing_subscriber::util::TryInitError| Error::Telemetry(format!("subscriber already set: {e}"));

    let Some(endpoint) = config.endpoint else {
        registry.try_init().map_err(subscriber_error)?;
        return Ok(TelemetryGuard::default());
    };

    let providers = otlp_providers(&endpoint, config.service_name)?;
    let spans = tracing_opentelemetry::layer().with_tracer(providers.traces.tracer("mimir-client"));
    let records =
        opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(&providers.logs);

    registry
        .with(spans)
        .with(records)
        .try_init()
        .map_err(subscriber_error)?;

    Ok(TelemetryGuard {
        exporters: Some(providers),
    })
}
