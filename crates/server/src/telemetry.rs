//! Telemetry bootstrap: structured console logging, plus an OTLP span
//! exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//!
//! Console logging is always on so the process is observable even with no
//! collector configured; OTLP is additive.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::errors::ServerError;

/// Installs the global `tracing` subscriber. Returns the OTLP tracer
/// provider, if one was configured, so the caller can shut it down cleanly
/// on exit.
pub fn init() -> Result<Option<SdkTracerProvider>, ServerError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let provider = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let exporter = SpanExporter::builder()
            .with_http()
            .build()
            .map_err(|e| ServerError::Telemetry(format!("failed to build OTLP exporter: {e}")))?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .build();

        let tracer = provider.tracer("review_warden_server");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()
            .map_err(|e| ServerError::Telemetry(format!("failed to install subscriber: {e}")))?;

        Some(provider)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ServerError::Telemetry(format!("failed to install subscriber: {e}")))?;

        None
    };

    tracing::info!("telemetry initialized");
    Ok(provider)
}

/// Flushes and shuts down the OTLP provider, if one is running.
pub fn shutdown(provider: Option<SdkTracerProvider>) {
    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "failed to shut down tracer provider cleanly");
        }
    }
}
