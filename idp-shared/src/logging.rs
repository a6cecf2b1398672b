//! # Logging and trace-export bootstrap
//!
//! Structured logging via `tracing-subscriber` with environment-aware output:
//! human-readable in development, JSON in production. When
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set and non-empty, spans are additionally
//! exported over OTLP; an empty endpoint disables export entirely.

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::env_or;

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Initializes the global tracing subscriber for a service. Idempotent; safe
/// to call from tests and binaries alike.
pub fn init_tracing(service_name: &str) {
    let service_name = service_name.to_string();
    TRACING_INITIALIZED.get_or_init(|| {
        let environment = env_or("ENVIRONMENT", "development");
        let log_level = env_or("LOG_LEVEL", default_log_level(&environment));

        let fmt_layer = if environment == "production" {
            fmt::layer()
                .json()
                .with_target(true)
                .with_filter(EnvFilter::new(log_level.clone()))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_filter(EnvFilter::new(log_level.clone()))
                .boxed()
        };

        let registry = tracing_subscriber::registry().with(fmt_layer);

        let otlp_endpoint = env_or("OTEL_EXPORTER_OTLP_ENDPOINT", "");
        if otlp_endpoint.is_empty() {
            if registry.try_init().is_err() {
                tracing::debug!("global tracing subscriber already initialized");
            }
            return;
        }

        match init_otlp_tracer(&service_name, &environment, &otlp_endpoint) {
            Ok(provider) => {
                let tracer = provider.tracer("idp-platform");
                let _ = TRACER_PROVIDER.set(provider);
                if registry
                    .with(OpenTelemetryLayer::new(tracer))
                    .try_init()
                    .is_err()
                {
                    tracing::debug!("global tracing subscriber already initialized");
                }
            }
            Err(err) => {
                if registry.try_init().is_err() {
                    tracing::debug!("global tracing subscriber already initialized");
                }
                tracing::warn!(error = %err, "failed to initialize OTLP exporter; traces disabled");
            }
        }

        tracing::info!(
            service = %service_name,
            environment = %environment,
            log_level = %log_level,
            otlp_enabled = !otlp_endpoint.is_empty(),
            "tracing initialized"
        );
    });
}

/// Flushes and shuts down the OTLP exporter, if one was configured.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        let _ = provider.shutdown();
    }
}

fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

fn init_otlp_tracer(
    service_name: &str,
    environment: &str,
    endpoint: &str,
) -> Result<SdkTracerProvider, Box<dyn std::error::Error>> {
    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attributes([KeyValue::new(
            "deployment.environment",
            environment.to_string(),
        )])
        .build();

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.to_string())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .with_sampler(Sampler::AlwaysOn)
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_by_environment() {
        assert_eq!(default_log_level("production"), "info");
        assert_eq!(default_log_level("development"), "debug");
        assert_eq!(default_log_level("test"), "debug");
    }

    #[test]
    fn init_is_idempotent() {
        init_tracing("idp-shared-test");
        init_tracing("idp-shared-test");
    }
}
